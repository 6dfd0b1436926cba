use std::sync::Arc;

use anyhow::Result;
use im::HashMap;
use parking_lot::Mutex;
use std_ext::ArcExt as _;
use types::{
    phase0::{beacon_state::BeaconState, containers::SignedBeaconBlock, primitives::H256},
    preset::Preset,
};

use crate::storage::StateStorage;

/// Block and state storage backed by persistent maps.
///
/// Hosts with durable storage implement [`StateStorage`] over their own
/// database instead.
#[derive(Default)]
pub struct InMemoryStore<P: Preset> {
    blocks: Mutex<HashMap<H256, Arc<SignedBeaconBlock>>>,
    states: Mutex<HashMap<H256, Arc<BeaconState<P>>>>,
}

impl<P: Preset> InMemoryStore<P> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state_count(&self) -> usize {
        self.states.lock().len()
    }
}

impl<P: Preset> StateStorage<P> for InMemoryStore<P> {
    fn has_state(&self, block_root: H256) -> Result<bool> {
        Ok(self.states.lock().contains_key(&block_root))
    }

    fn state(&self, block_root: H256) -> Result<Option<Arc<BeaconState<P>>>> {
        Ok(self.states.lock().get(&block_root).map(|state| state.clone_arc()))
    }

    fn block(&self, block_root: H256) -> Result<Option<Arc<SignedBeaconBlock>>> {
        Ok(self.blocks.lock().get(&block_root).map(|block| block.clone_arc()))
    }

    fn put_state(&self, block_root: H256, state: Arc<BeaconState<P>>) -> Result<()> {
        self.states.lock().insert(block_root, state);
        Ok(())
    }

    fn put_block(&self, block_root: H256, block: Arc<SignedBeaconBlock>) -> Result<()> {
        self.blocks.lock().insert(block_root, block);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use core::num::NonZeroU64;

    use ssz::SszHash as _;
    use types::{config::Config, preset::Minimal};

    use super::*;

    #[test]
    fn states_round_trip_and_writes_are_idempotent() -> Result<()> {
        let store = InMemoryStore::<Minimal>::new();

        let state = Arc::new(interop::quick_start_beacon_state::<Minimal>(
            &Config::minimal(),
            0,
            NonZeroU64::new(2).expect("validator count is nonzero"),
        ));

        let root = state.hash_tree_root();

        assert!(!store.has_state(root)?);
        assert_eq!(store.state(root)?, None);

        store.put_state(root, state.clone_arc())?;
        store.put_state(root, state.clone_arc())?;

        assert!(store.has_state(root)?);
        assert_eq!(store.state(root)?, Some(state));
        assert_eq!(store.state_count(), 1);

        Ok(())
    }

    #[test]
    fn missing_blocks_are_not_an_error() -> Result<()> {
        let store = InMemoryStore::<Minimal>::new();

        assert_eq!(store.block(H256::repeat_byte(9))?, None);

        Ok(())
    }
}
