//! Settings persistence tests
//!
//! These tests exercise the partial read/write semantics of the settings store
//! against real files.

use aleth_config::*;
use aleth_core::{Address, VmSelection};
use tempfile::TempDir;

fn sample_blob() -> SettingsBlob {
    SettingsBlob {
        network_config: vec![0xde, 0xad, 0xbe, 0xef],
        server_list: vec!["10.0.0.7:30303".to_string(), "peer.example:30303".to_string()],
        private_chain_name: "lab".to_string(),
        beneficiary: Some(Address::new([0x42; 20])),
        vm: VmSelection::Smart,
        peer_count_target: 25,
        window_geometry: vec![1, 2, 3, 4],
    }
}

fn store_in(dir: &TempDir) -> SettingsStore {
    SettingsStore::new(dir.path().join(DEFAULT_SETTINGS_FILE))
}

#[test]
fn test_full_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let blob = sample_blob();

    store.write(&blob, SettingsFlags::EVERYTHING).unwrap();
    assert_eq!(store.read(SettingsFlags::EVERYTHING).unwrap(), blob);
}

#[test]
fn test_missing_file_reads_defaults() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let blob = store.read(SettingsFlags::EVERYTHING).unwrap();
    assert_eq!(blob, SettingsBlob::default());
    assert_eq!(blob.peer_count_target, DEFAULT_PEER_COUNT_TARGET);
    assert!(!blob.is_private_chain());
}

#[test]
fn test_skip_geometry_preserves_prior_geometry() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let mut first = sample_blob();
    first.window_geometry = vec![9, 9, 9];
    store.write(&first, SettingsFlags::EVERYTHING).unwrap();

    let mut second = sample_blob();
    second.private_chain_name = "other-chain".to_string();
    second.vm = VmSelection::Jit;
    second.window_geometry = vec![0];
    store.write(&second, SettingsFlags::SKIP_GEOMETRY).unwrap();

    let read = store.read(SettingsFlags::SKIP_GEOMETRY).unwrap();
    assert_eq!(read.private_chain_name, "other-chain");
    assert_eq!(read.vm, VmSelection::Jit);
    assert_eq!(read.server_list, second.server_list);
    assert_eq!(read.network_config, second.network_config);
    assert_eq!(read.beneficiary, second.beneficiary);
    assert_eq!(read.peer_count_target, second.peer_count_target);
    // Out of scope for the read, so left at its default.
    assert!(read.window_geometry.is_empty());

    let full = store.read(SettingsFlags::EVERYTHING).unwrap();
    assert_eq!(full.window_geometry, vec![9, 9, 9]);
}

#[test]
fn test_only_geometry_leaves_chain_settings() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.write(&sample_blob(), SettingsFlags::EVERYTHING).unwrap();

    let moved = SettingsBlob {
        window_geometry: vec![7, 7],
        ..SettingsBlob::default()
    };
    store.write(&moved, SettingsFlags::ONLY_GEOMETRY).unwrap();

    let full = store.read(SettingsFlags::EVERYTHING).unwrap();
    assert_eq!(full.window_geometry, vec![7, 7]);
    assert_eq!(full.private_chain_name, "lab");
    assert_eq!(full.vm, VmSelection::Smart);
}

#[test]
fn test_read_into_keeps_out_of_scope_values() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.write(&sample_blob(), SettingsFlags::EVERYTHING).unwrap();

    let mut current = SettingsBlob {
        window_geometry: vec![5, 5, 5],
        ..SettingsBlob::default()
    };
    store
        .read_into(&mut current, SettingsFlags::SKIP_GEOMETRY)
        .unwrap();
    assert_eq!(current.private_chain_name, "lab");
    assert_eq!(current.window_geometry, vec![5, 5, 5]);
}

#[test]
fn test_conflicting_flags_are_rejected() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let both = SettingsFlags {
        skip_geometry: true,
        only_geometry: true,
    };

    let err = store.write(&sample_blob(), both).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidConfiguration(_)));
    assert!(!store.path().exists());

    assert!(matches!(
        store.read(both),
        Err(ConfigError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_vm_selection_survives_restart() {
    let dir = TempDir::new().unwrap();
    {
        let store = store_in(&dir);
        let blob = SettingsBlob {
            vm: VmSelection::Jit,
            ..SettingsBlob::default()
        };
        store.write(&blob, SettingsFlags::EVERYTHING).unwrap();
    }

    let reloaded = store_in(&dir);
    assert_eq!(
        reloaded.read(SettingsFlags::EVERYTHING).unwrap().vm,
        VmSelection::Jit
    );
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    std::fs::write(store.path(), "vm-selection = \"smart\"\n").unwrap();

    let blob = store.read(SettingsFlags::EVERYTHING).unwrap();
    assert_eq!(blob.vm, VmSelection::Smart);
    assert_eq!(blob.peer_count_target, DEFAULT_PEER_COUNT_TARGET);
    assert!(blob.server_list.is_empty());
    assert!(blob.beneficiary.is_none());
}

#[test]
fn test_malformed_value_keeps_other_keys() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    std::fs::write(
        store.path(),
        "vm-selection = \"wasm\"\npeer-count-target = 9\nprivate-chain-name = \"lab\"\n",
    )
    .unwrap();

    let blob = store.read(SettingsFlags::EVERYTHING).unwrap();
    assert_eq!(blob.vm, VmSelection::default());
    assert_eq!(blob.peer_count_target, 9);
    assert_eq!(blob.private_chain_name, "lab");
}

#[test]
fn test_invalid_toml_reads_defaults_and_is_overwritten() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    std::fs::write(store.path(), "vm-selection = [unterminated").unwrap();

    assert_eq!(
        store.read(SettingsFlags::EVERYTHING).unwrap(),
        SettingsBlob::default()
    );

    let blob = sample_blob();
    store.write(&blob, SettingsFlags::EVERYTHING).unwrap();
    assert_eq!(store.read(SettingsFlags::EVERYTHING).unwrap(), blob);
}

#[test]
fn test_shell_config_load_and_save() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("aleth-zero.toml");

    let defaults = ShellConfig::load(&path).unwrap();
    assert_eq!(defaults, ShellConfig::default());

    let mut config = ShellConfig::default();
    config.data_dir = dir.path().to_path_buf();
    config.refresh_interval_ms = 500;
    config.plugins = vec!["status".to_string()];
    config.save(&path).unwrap();

    let loaded = ShellConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.settings_path(), dir.path().join(DEFAULT_SETTINGS_FILE));
}
