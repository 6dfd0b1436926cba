use anyhow::Result;
use types::{
    phase0::{beacon_state::BeaconState, containers::SignedBeaconBlock},
    preset::Preset,
};

use crate::unphased::{ProcessSlots, StateRootPolicy};

use super::{block_processing, slot_processing};

pub fn state_transition<P: Preset>(
    state: &mut BeaconState<P>,
    signed_block: &SignedBeaconBlock,
    process_slots: ProcessSlots,
    state_root_policy: StateRootPolicy,
) -> Result<()> {
    let block = &signed_block.message;

    // > Process slots (including those with no blocks) since block
    if process_slots.should_process(state, block) {
        slot_processing::process_slots(state, block.slot)?;
    }

    // > Process block
    block_processing::process_block(state, block)?;

    // > Verify state root
    state_root_policy.verify(state, block)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use core::num::NonZeroU64;

    use helper_functions::accessors;
    use ssz::SszHash as _;
    use types::{
        config::Config,
        phase0::{
            containers::{BeaconBlock, BeaconBlockBody},
            primitives::H256,
        },
        preset::Minimal,
    };

    use super::*;

    #[test]
    fn state_roots_are_checked_under_the_verify_policy() -> Result<()> {
        let genesis = interop::quick_start_beacon_state::<Minimal>(
            &Config::minimal(),
            0,
            NonZeroU64::new(4).expect("validator count is nonzero"),
        );

        // Compute the correct post-state root by applying the block once
        // under the trusting policy.
        let mut block = BeaconBlock {
            slot: 2,
            proposer_index: 1,
            parent_root: H256::zero(),
            state_root: H256::zero(),
            body: BeaconBlockBody::default(),
        };

        let mut rehearsal = genesis.clone();
        slot_processing::process_slots(&mut rehearsal, block.slot)?;
        block.parent_root = accessors::latest_block_root(&rehearsal);

        let signed_block = SignedBeaconBlock {
            message: block.clone(),
            signature: Default::default(),
        };

        state_transition(
            &mut rehearsal,
            &signed_block,
            ProcessSlots::Always,
            StateRootPolicy::Trust,
        )?;

        block.state_root = rehearsal.hash_tree_root();

        let signed_block = SignedBeaconBlock {
            message: block.clone(),
            signature: Default::default(),
        };

        let mut state = genesis.clone();
        state_transition(
            &mut state,
            &signed_block,
            ProcessSlots::IfNeeded,
            StateRootPolicy::Verify,
        )?;

        assert_eq!(state.hash_tree_root(), block.state_root);
        assert_eq!(state, rehearsal);

        // A tampered state root fails under the verifying policy.
        let mut tampered_block = block;
        tampered_block.state_root = H256::repeat_byte(0xaa);

        let signed_block = SignedBeaconBlock {
            message: tampered_block,
            signature: Default::default(),
        };

        let mut state = genesis;
        assert!(state_transition(
            &mut state,
            &signed_block,
            ProcessSlots::IfNeeded,
            StateRootPolicy::Verify,
        )
        .is_err());

        Ok(())
    }
}
