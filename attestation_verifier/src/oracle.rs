use core::marker::PhantomData;
use std::sync::Arc;

use anyhow::Result;
use state_store::StateStorage;
use std_ext::ArcExt as _;
use types::{
    phase0::{
        beacon_state::BeaconState,
        primitives::{Slot, H256},
    },
    preset::Preset,
};

/// The verifier's window into fork choice.
///
/// Head tracking is optional; hosts without it simply never serve checkpoint
/// states from the head.
pub trait ForkChoiceOracle<P: Preset>: Send + Sync {
    /// Returns the root of the newest ancestor of `root` with a slot at or
    /// before `slot`, or `None` when the chain of known blocks runs out.
    fn ancestor(&self, root: H256, slot: Slot) -> Result<Option<H256>>;

    /// The current head block root and its post-state, if tracked.
    fn head(&self) -> Result<Option<(H256, Arc<BeaconState<P>>)>> {
        Ok(None)
    }
}

/// Resolves ancestors by walking parent pointers through stored blocks.
pub struct StoreAncestry<P: Preset, S> {
    store: Arc<S>,
    phantom: PhantomData<P>,
}

impl<P: Preset, S> StoreAncestry<P, S> {
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self {
            store,
            phantom: PhantomData,
        }
    }
}

impl<P: Preset, S: StateStorage<P>> ForkChoiceOracle<P> for StoreAncestry<P, S> {
    fn ancestor(&self, root: H256, slot: Slot) -> Result<Option<H256>> {
        let mut current_root = root;

        loop {
            let Some(block) = self.store.block(current_root)? else {
                return Ok(None);
            };

            if block.message.slot <= slot {
                return Ok(Some(current_root));
            }

            current_root = block.message.parent_root;
        }
    }
}

impl<P: Preset, O: ForkChoiceOracle<P>> ForkChoiceOracle<P> for Arc<O> {
    fn ancestor(&self, root: H256, slot: Slot) -> Result<Option<H256>> {
        (**self).ancestor(root, slot)
    }

    fn head(&self) -> Result<Option<(H256, Arc<BeaconState<P>>)>> {
        (**self).head()
    }
}

impl<P: Preset, S> Clone for StoreAncestry<P, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone_arc(),
            phantom: PhantomData,
        }
    }
}
