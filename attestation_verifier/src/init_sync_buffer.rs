use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use ssz::SszHash as _;
use state_store::StateStorage;
use types::{phase0::containers::SignedBeaconBlock, preset::Preset};

/// Blocks accepted during initial sync that have not been persisted yet.
///
/// The sync layer batches writes for throughput. Attestations may reference
/// one of the batched blocks before the batch lands, in which case the
/// verifier flushes the buffer on demand.
#[derive(Default)]
pub struct InitialSyncBuffer {
    blocks: Mutex<Vec<Arc<SignedBeaconBlock>>>,
}

impl InitialSyncBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, block: Arc<SignedBeaconBlock>) {
        self.blocks.lock().push(block);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.lock().is_empty()
    }

    /// Persists the currently buffered blocks into `store`.
    ///
    /// Persisting is idempotent, so concurrent flushes are safe. Blocks
    /// pushed while a flush is in progress stay buffered for the next one.
    pub fn drain_into<P: Preset>(&self, store: &impl StateStorage<P>) -> Result<()> {
        let blocks = core::mem::take(&mut *self.blocks.lock());

        for block in blocks {
            let block_root = block.message.hash_tree_root();
            store.put_block(block_root, block)?;
        }

        Ok(())
    }
}
