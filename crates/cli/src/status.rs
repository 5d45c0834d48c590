//! Built-in `status` plugin: traces chain progress while a node is bound.

use aleth_extensions::{ExtensionError, ExtensionResult, Plugin, PluginContext};
use tracing::{debug, info};

pub const NAME: &str = "status";

#[derive(Debug, Default)]
pub struct StatusPlugin {
    last_block: Option<u64>,
}

impl StatusPlugin {
    pub fn last_block(&self) -> Option<u64> {
        self.last_block
    }
}

impl Plugin for StatusPlugin {
    fn initialize(&mut self, context: &PluginContext) -> ExtensionResult<()> {
        info!(
            target: "aleth::status",
            data_dir = %context.data_dir.display(),
            "status plugin ready"
        );
        Ok(())
    }

    fn poll(&mut self, context: &PluginContext) -> ExtensionResult<()> {
        let Some(chain) = context.facade.node_handle() else {
            self.last_block = None;
            return Ok(());
        };
        let blocks = chain
            .block_count()
            .map_err(|err| ExtensionError::operation_failed(err.to_string()))?;
        if self.last_block != Some(blocks) {
            let peers = context
                .facade
                .web3_handle()
                .map(|web3| web3.peer_count())
                .unwrap_or_default();
            info!(target: "aleth::status", blocks, peers, "chain head");
            self.last_block = Some(blocks);
        } else {
            debug!(target: "aleth::status", blocks, "chain head unchanged");
        }
        Ok(())
    }

    fn finalize(&mut self) -> ExtensionResult<()> {
        info!(target: "aleth::status", "status plugin stopped");
        Ok(())
    }
}
