use std::sync::Arc;

use anyhow::Result;
use types::{
    phase0::{beacon_state::BeaconState, containers::SignedBeaconBlock, primitives::H256},
    preset::Preset,
};

/// Content-addressed storage of blocks and their post-states.
///
/// Reads may run concurrently. Writes to the same key must be serialized by
/// the implementation; both writes are idempotent because values are keyed by
/// their content. Persistent implementations surface decoding failures as
/// [`Error::Corrupt`](crate::Error::Corrupt).
pub trait StateStorage<P: Preset>: Send + Sync {
    fn has_state(&self, block_root: H256) -> Result<bool>;

    fn state(&self, block_root: H256) -> Result<Option<Arc<BeaconState<P>>>>;

    fn block(&self, block_root: H256) -> Result<Option<Arc<SignedBeaconBlock>>>;

    fn put_state(&self, block_root: H256, state: Arc<BeaconState<P>>) -> Result<()>;

    fn put_block(&self, block_root: H256, block: Arc<SignedBeaconBlock>) -> Result<()>;
}

impl<P: Preset, S: StateStorage<P>> StateStorage<P> for Arc<S> {
    fn has_state(&self, block_root: H256) -> Result<bool> {
        (**self).has_state(block_root)
    }

    fn state(&self, block_root: H256) -> Result<Option<Arc<BeaconState<P>>>> {
        (**self).state(block_root)
    }

    fn block(&self, block_root: H256) -> Result<Option<Arc<SignedBeaconBlock>>> {
        (**self).block(block_root)
    }

    fn put_state(&self, block_root: H256, state: Arc<BeaconState<P>>) -> Result<()> {
        (**self).put_state(block_root, state)
    }

    fn put_block(&self, block_root: H256, block: Arc<SignedBeaconBlock>) -> Result<()> {
        (**self).put_block(block_root, block)
    }
}
