use core::marker::PhantomData;
use std::sync::Arc;

use anyhow::{ensure, Result};
use log::debug;
use state_store::StateStorage;
use std_ext::ArcExt as _;
use tokio_util::sync::CancellationToken;
use transition_functions::{
    phase0::state_transition::state_transition, ProcessSlots, StateRootPolicy,
};
use types::{
    phase0::{beacon_state::BeaconState, containers::SignedBeaconBlock, primitives::H256},
    preset::Preset,
};

use crate::error::Error;

/// Materializes states on demand by replaying blocks from the nearest stored
/// ancestor state.
pub struct StateGenerator<P: Preset, S> {
    store: Arc<S>,
    phantom: PhantomData<P>,
}

impl<P: Preset, S: StateStorage<P>> StateGenerator<P, S> {
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self {
            store,
            phantom: PhantomData,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn has_state(&self, block_root: H256) -> Result<bool> {
        self.store.has_state(block_root)
    }

    /// Returns the post-state of the block identified by `block_root`,
    /// replaying ancestors as needed and persisting the result.
    ///
    /// The replayed blocks were validated before being stored, so their state
    /// roots are trusted rather than recomputed.
    pub fn state_by_block_root(
        &self,
        block_root: H256,
        token: &CancellationToken,
    ) -> Result<Arc<BeaconState<P>>> {
        if let Some(state) = self.store.state(block_root)? {
            return Ok(state);
        }

        let (anchor_root, chain) = self.collect_unprocessed_chain(block_root, token)?;

        let base_state = self
            .store
            .state(anchor_root)?
            .ok_or(Error::MissingAncestor { root: anchor_root })?;

        debug!(
            "replaying {} block(s) from {anchor_root:?} to materialize the state of {block_root:?}",
            chain.len(),
        );

        let mut state = (*base_state).clone();

        for block in chain.iter().rev() {
            ensure!(!token.is_cancelled(), Error::Cancelled);

            state_transition(
                &mut state,
                block,
                ProcessSlots::IfNeeded,
                StateRootPolicy::Trust,
            )?;
        }

        let state = Arc::new(state);

        self.store.put_state(block_root, state.clone_arc())?;

        Ok(state)
    }

    /// Walks parent pointers from `block_root` until a block whose post-state
    /// is stored, collecting the blocks that must be replayed on the way.
    fn collect_unprocessed_chain(
        &self,
        block_root: H256,
        token: &CancellationToken,
    ) -> Result<(H256, Vec<Arc<SignedBeaconBlock>>)> {
        let mut chain = vec![];
        let mut current_root = block_root;

        while !self.store.has_state(current_root)? {
            ensure!(!token.is_cancelled(), Error::Cancelled);

            let block = self
                .store
                .block(current_root)?
                .ok_or(Error::MissingAncestor { root: current_root })?;

            current_root = block.message.parent_root;
            chain.push(block);
        }

        Ok((current_root, chain))
    }
}
