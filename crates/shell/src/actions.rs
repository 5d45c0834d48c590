//! User-facing actions.
//!
//! Node-dependent actions return [`Outcome::NodeUnavailable`] when no node is
//! attached. Settings they change are still recorded and written.

use crate::bridge::BridgeResult;
use crate::confirmation::Confirmation;
use crate::error::{ShellError, ShellResult};
use crate::scheduler::TickOutcome;
use crate::shell::Shell;
use aleth_config::SettingsFlags;
use aleth_core::{Address, ChainClient, NetworkPreferences, NodeHandle, VmSelection};
use std::sync::Arc;
use tracing::info;
use zeroize::Zeroizing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    NodeUnavailable,
}

impl Outcome {
    pub fn is_done(self) -> bool {
        self == Outcome::Done
    }
}

impl Shell {
    fn web3(&self) -> Option<Arc<dyn NodeHandle>> {
        self.core.node.read().as_ref().map(|handles| handles.web3.clone())
    }

    fn chain(&self) -> Option<Arc<dyn ChainClient>> {
        self.core.node.read().as_ref().map(|handles| handles.chain.clone())
    }

    /// Preferences built from the current settings.
    pub fn network_preferences(&self) -> NetworkPreferences {
        let settings = self.settings();
        NetworkPreferences {
            network_config: settings.network_config.clone(),
            ideal_peers: settings.peer_count_target,
            bootstrap_peers: settings.server_list.clone(),
            private_chain: settings
                .is_private_chain()
                .then(|| settings.private_chain_name.clone()),
        }
    }

    // Networking

    /// Starts networking with the preferences held in the settings.
    pub fn start_networking(&mut self) -> ShellResult<Outcome> {
        let Some(web3) = self.web3() else {
            return Ok(Outcome::NodeUnavailable);
        };
        web3.start_network(&self.network_preferences())?;
        self.note("Networking started");
        self.tick();
        Ok(Outcome::Done)
    }

    /// Stops networking, keeping the node's peer configuration in `network-config`.
    pub fn stop_networking(&mut self) -> ShellResult<Outcome> {
        let Some(web3) = self.web3() else {
            return Ok(Outcome::NodeUnavailable);
        };
        self.core.settings.lock().network_config = web3.save_network();
        web3.stop_network();
        self.persist(SettingsFlags::SKIP_GEOMETRY)?;
        self.note("Networking stopped");
        self.tick();
        Ok(Outcome::Done)
    }

    /// Connects to `peer` and moves it to the front of `server-list`.
    pub fn connect_peer(&mut self, peer: &str) -> ShellResult<Outcome> {
        let peer = peer.trim();
        if peer.is_empty() {
            return Err(ShellError::InvalidInput("peer address is empty".into()));
        }
        let Some(web3) = self.web3() else {
            return Ok(Outcome::NodeUnavailable);
        };
        web3.connect(peer)?;
        {
            let mut settings = self.core.settings.lock();
            settings.server_list.retain(|known| known != peer);
            settings.server_list.insert(0, peer.to_string());
        }
        self.persist(SettingsFlags::SKIP_GEOMETRY)?;
        self.note(format!("Connecting to {peer}"));
        Ok(Outcome::Done)
    }

    /// Saves the ideal peer count and applies it to the node.
    pub fn set_peer_target(&mut self, peers: u32) -> ShellResult<Outcome> {
        self.core.settings.lock().peer_count_target = peers;
        self.persist(SettingsFlags::SKIP_GEOMETRY)?;
        let Some(web3) = self.web3() else {
            return Ok(Outcome::NodeUnavailable);
        };
        web3.set_ideal_peer_count(peers);
        Ok(Outcome::Done)
    }

    // Mining

    /// Starts mining and refreshes the view.
    pub fn start_mining(&mut self) -> ShellResult<Outcome> {
        let Some(chain) = self.chain() else {
            return Ok(Outcome::NodeUnavailable);
        };
        chain.start_mining()?;
        self.tick();
        Ok(Outcome::Done)
    }

    pub fn stop_mining(&mut self) -> Outcome {
        let Some(chain) = self.chain() else {
            return Outcome::NodeUnavailable;
        };
        chain.stop_mining();
        self.tick();
        Outcome::Done
    }

    pub fn prepare_next_epoch(&mut self) -> ShellResult<Outcome> {
        let Some(chain) = self.chain() else {
            return Ok(Outcome::NodeUnavailable);
        };
        chain.prepare_next_epoch()?;
        self.note("Next mining epoch prepared");
        Ok(Outcome::Done)
    }

    pub fn toggle_force_mining(&mut self) -> Outcome {
        self.toggles.force_mining = !self.toggles.force_mining;
        let Some(chain) = self.chain() else {
            return Outcome::NodeUnavailable;
        };
        chain.set_force_mining(self.toggles.force_mining);
        Outcome::Done
    }

    pub fn toggle_turbo_mining(&mut self) -> Outcome {
        self.toggles.turbo_mining = !self.toggles.turbo_mining;
        let Some(chain) = self.chain() else {
            return Outcome::NodeUnavailable;
        };
        chain.set_turbo_mining(self.toggles.turbo_mining);
        Outcome::Done
    }

    /// Saves the mining beneficiary and applies it to the node.
    pub fn set_beneficiary(&mut self, address: Address) -> ShellResult<Outcome> {
        self.core.settings.lock().beneficiary = Some(address);
        self.persist(SettingsFlags::SKIP_GEOMETRY)?;
        let Some(chain) = self.chain() else {
            return Ok(Outcome::NodeUnavailable);
        };
        chain.set_beneficiary(address);
        Ok(Outcome::Done)
    }

    // View

    pub fn refresh(&mut self) -> TickOutcome {
        self.tick()
    }

    /// Switches balances to the pending state or back, then refreshes.
    pub fn set_preview(&mut self, enabled: bool) -> TickOutcome {
        self.core.scheduler.set_preview(enabled);
        self.tick()
    }

    pub fn toggle_preview(&mut self) -> bool {
        let enabled = !self.core.scheduler.is_preview();
        self.set_preview(enabled);
        enabled
    }

    // Accounts

    /// Permanently deletes the key for `address`.
    pub fn kill_account(&self, address: &Address, confirmed: Confirmation) -> BridgeResult<()> {
        self.bridge().kill_account(address, confirmed)
    }

    pub fn reencrypt_account(&self, address: &Address, old: &str, new: &str) -> BridgeResult<()> {
        self.bridge().reencrypt(address, old, new)
    }

    pub fn reencrypt_all(&self, old: &str, new: &str) -> BridgeResult<Vec<Address>> {
        self.bridge().reencrypt_all(old, new)
    }

    /// Hex key material for `address`, opened with `credential`.
    pub fn export_key(&self, address: &Address, credential: &str) -> BridgeResult<Zeroizing<String>> {
        self.bridge().export_key(address, credential)
    }

    // Chain

    /// Selects the VM. The choice is saved even without a node.
    pub fn select_vm(&mut self, vm: VmSelection) -> ShellResult<Outcome> {
        self.core.settings.lock().vm = vm;
        self.persist(SettingsFlags::SKIP_GEOMETRY)?;
        info!(%vm, "vm selected");
        let Some(chain) = self.chain() else {
            return Ok(Outcome::NodeUnavailable);
        };
        chain.set_vm(vm);
        Ok(Outcome::Done)
    }

    pub fn vm(&self) -> VmSelection {
        self.core.settings.lock().vm
    }

    /// Asks the node to retry blocks whose parent was unknown.
    pub fn retry_unknown(&mut self) -> Outcome {
        let Some(chain) = self.chain() else {
            return Outcome::NodeUnavailable;
        };
        chain.retry_unknown();
        Outcome::Done
    }

    /// Rewinds the chain head to `block`, discarding the blocks above it.
    pub fn rewind_chain(&mut self, block: u64, _confirmed: Confirmation) -> ShellResult<Outcome> {
        let Some(chain) = self.chain() else {
            return Ok(Outcome::NodeUnavailable);
        };
        chain.rewind(block)?;
        self.note(format!("Rewound to block {block}"));
        self.tick();
        Ok(Outcome::Done)
    }

    /// Renames the private chain, reconfiguring the node when the name changed
    /// or `force` is set. Settings are written without geometry.
    pub fn set_private_chain(&mut self, name: &str, force: bool) -> ShellResult<Outcome> {
        let name = name.trim();
        let changed = {
            let mut settings = self.core.settings.lock();
            let changed = settings.private_chain_name != name;
            settings.private_chain_name = name.to_string();
            changed
        };
        if !changed && !force {
            return Ok(Outcome::Done);
        }
        self.persist(SettingsFlags::SKIP_GEOMETRY)?;

        let (Some(web3), Some(chain)) = (self.web3(), self.chain()) else {
            return Ok(Outcome::NodeUnavailable);
        };
        chain.set_private_chain((!name.is_empty()).then_some(name))?;
        if web3.is_networking() {
            web3.stop_network();
            web3.start_network(&self.network_preferences())?;
        }
        if name.is_empty() {
            self.note("Using the public chain");
        } else {
            self.note(format!("Using private chain '{name}'"));
        }
        self.core.scheduler.reset();
        self.tick();
        Ok(Outcome::Done)
    }

    /// Points the node at a sentinel endpoint.
    pub fn set_sentinel(&mut self, endpoint: &str) -> ShellResult<Outcome> {
        let Some(chain) = self.chain() else {
            return Ok(Outcome::NodeUnavailable);
        };
        chain.set_sentinel(endpoint.trim())?;
        Ok(Outcome::Done)
    }

    /// Injects a hex-encoded block, with or without a `0x` prefix.
    pub fn inject_block(&mut self, block_hex: &str) -> ShellResult<Outcome> {
        let text = block_hex.trim();
        let text = text.strip_prefix("0x").unwrap_or(text);
        let bytes = hex::decode(text)
            .map_err(|e| ShellError::InvalidInput(format!("block is not valid hex: {e}")))?;
        let Some(chain) = self.chain() else {
            return Ok(Outcome::NodeUnavailable);
        };
        chain.inject_block(&bytes)?;
        self.tick();
        Ok(Outcome::Done)
    }

    /// Drops every pending transaction.
    pub fn clear_pending(&mut self, _confirmed: Confirmation) -> Outcome {
        let Some(chain) = self.chain() else {
            return Outcome::NodeUnavailable;
        };
        chain.clear_pending();
        self.tick();
        Outcome::Done
    }

    /// Destroys the local chain database and refreshes from the new genesis.
    pub fn rebuild_chain(&mut self, _confirmed: Confirmation) -> ShellResult<Outcome> {
        let Some(chain) = self.chain() else {
            return Ok(Outcome::NodeUnavailable);
        };
        chain.kill_chain()?;
        self.warn("Local chain state destroyed");
        self.core.scheduler.reset();
        self.tick();
        Ok(Outcome::Done)
    }

    // Toggles

    /// Whether transactions need explicit confirmation. Returns the new state.
    pub fn toggle_confirm(&mut self) -> bool {
        self.toggles.confirm = !self.toggles.confirm;
        self.toggles.confirm
    }

    pub fn confirm_transactions(&self) -> bool {
        self.toggles.confirm
    }

    pub fn toggle_paranoia(&mut self) -> Outcome {
        self.toggles.paranoia = !self.toggles.paranoia;
        let Some(chain) = self.chain() else {
            return Outcome::NodeUnavailable;
        };
        chain.set_paranoia(self.toggles.paranoia);
        Outcome::Done
    }

    pub fn force_mining(&self) -> bool {
        self.toggles.force_mining
    }

    pub fn turbo_mining(&self) -> bool {
        self.toggles.turbo_mining
    }

    pub fn paranoia(&self) -> bool {
        self.toggles.paranoia
    }
}
