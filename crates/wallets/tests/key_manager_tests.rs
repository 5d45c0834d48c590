//! Key store persistence tests

use aleth_core::Secret;
use aleth_wallets::*;
use tempfile::TempDir;

fn info(name: &str, hint: &str) -> KeyInfo {
    KeyInfo {
        name: name.to_string(),
        hint: hint.to_string(),
    }
}

#[test]
fn test_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keys.json");

    let (first, second) = {
        let mut keys = KeyManager::open(&path, ScryptParameters::test()).unwrap();
        let first = keys.create(info("main", "blue"), "one").unwrap();
        let second = keys.create(info("savings", ""), "two").unwrap();
        keys.unlock(&first, "one").unwrap();
        keys.save().unwrap();
        (first, second)
    };

    let keys = KeyManager::open(&path, ScryptParameters::test()).unwrap();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys.info(&first).unwrap().name, "main");
    assert_eq!(keys.hint(&first).as_deref(), Some("blue"));
    // Unlocked state is never persisted.
    assert!(keys.is_locked(&first).unwrap());
    assert_eq!(keys.decrypt(&second, "two").unwrap().address(), second);
}

#[test]
fn test_missing_file_is_empty_until_saved() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("keys.json");

    let keys = KeyManager::open(&path, ScryptParameters::test()).unwrap();
    assert!(keys.is_empty());
    assert!(!path.exists());

    keys.save().unwrap();
    assert!(path.exists());
}

#[test]
fn test_unsupported_version_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keys.json");
    std::fs::write(&path, r#"{"version": 99, "keys": []}"#).unwrap();

    assert!(matches!(
        KeyManager::open(&path, ScryptParameters::test()),
        Err(WalletError::InvalidFormat(_))
    ));
}

#[test]
fn test_reencrypt_requires_old_credential() {
    let mut keys = KeyManager::in_memory(ScryptParameters::test());
    let address = keys.create(info("main", ""), "old").unwrap();

    assert!(matches!(
        keys.reencrypt(&address, "bad", "new"),
        Err(WalletError::WrongCredential)
    ));
    assert!(keys.decrypt(&address, "old").is_ok());

    keys.reencrypt(&address, "old", "new").unwrap();
    assert!(keys.decrypt(&address, "old").is_err());
    assert!(keys.decrypt(&address, "new").is_ok());
}

#[test]
fn test_export_returns_hex_secret() {
    let mut keys = KeyManager::in_memory(ScryptParameters::test());
    let secret = Secret::random();
    let expected = hex::encode(secret.expose());
    let address = keys.import(secret, info("imported", ""), "pw").unwrap();

    let exported = keys.export(&address, "pw").unwrap();
    assert_eq!(exported.as_str(), expected);
    assert!(matches!(
        keys.export(&address, "other"),
        Err(WalletError::WrongCredential)
    ));
}

#[test]
fn test_kill_removes_from_disk_after_save() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keys.json");

    let mut keys = KeyManager::open(&path, ScryptParameters::test()).unwrap();
    let address = keys.create(info("doomed", ""), "pw").unwrap();
    keys.save().unwrap();
    keys.kill(&address).unwrap();
    keys.save().unwrap();

    let reopened = KeyManager::open(&path, ScryptParameters::test()).unwrap();
    assert!(!reopened.contains(&address));
}

#[test]
fn test_closure_prompt() {
    let prompt = |request: &CredentialRequest| {
        request
            .hint
            .clone()
            .map(zeroize::Zeroizing::new)
    };
    let request = CredentialRequest::unlock(aleth_core::Address::new([1; 20]), Some("pw".into()));
    assert_eq!(prompt.request(&request).unwrap().as_str(), "pw");
    assert!(DenyAll.request(&request).is_none());
}
