use anyhow::{ensure, Result};
use ssz::SszHash as _;
use types::{
    phase0::{beacon_state::BeaconState, containers::BeaconBlock},
    preset::Preset,
};

use crate::error::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ProcessSlots {
    Always,
    IfNeeded,
}

impl ProcessSlots {
    #[must_use]
    pub fn should_process<P: Preset>(self, state: &BeaconState<P>, block: &BeaconBlock) -> bool {
        match self {
            Self::Always => true,
            Self::IfNeeded => state.slot < block.slot,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StateRootPolicy {
    Verify,
    /// Used when replaying blocks that were fully validated before storage.
    Trust,
}

impl StateRootPolicy {
    pub fn verify<P: Preset>(self, state: &BeaconState<P>, block: &BeaconBlock) -> Result<()> {
        match self {
            Self::Verify => {
                let computed = state.hash_tree_root();

                ensure!(
                    computed == block.state_root,
                    Error::StateRootMismatch {
                        computed,
                        in_block: block.state_root,
                    },
                );

                Ok(())
            }
            Self::Trust => Ok(()),
        }
    }
}
