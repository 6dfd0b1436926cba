use std::sync::Arc;

use anyhow::{ensure, Result};
use helper_functions::{accessors, misc};
use ssz::SszHash as _;
use types::{
    phase0::{beacon_state::BeaconState, primitives::Slot},
    preset::Preset,
};

use crate::error::Error;

/// [`process_slots`](https://github.com/ethereum/consensus-specs/blob/master/specs/phase0/beacon-chain.md#beacon-chain-state-transition-function)
///
/// The empty-slot transition. Epoch processing is reduced to the parts that
/// feed committee derivation; reward accounting and finality tracking are
/// performed by the block import pipeline upstream of this workspace.
pub fn process_slots<P: Preset>(state: &mut BeaconState<P>, target_slot: Slot) -> Result<()> {
    ensure!(
        state.slot <= target_slot,
        Error::SlotRegression {
            state_slot: state.slot,
            target_slot,
        },
    );

    while state.slot < target_slot {
        process_slot(state);

        // > Process epoch on the start slot of the next epoch
        if misc::is_epoch_start::<P>(state.slot + 1) {
            process_epoch(state);
        }

        state.slot += 1;
    }

    Ok(())
}

/// Advances a copy of `state` to `target_slot`, returning `state` itself when
/// it is already there.
pub fn advance_to_slot<P: Preset>(
    state: Arc<BeaconState<P>>,
    target_slot: Slot,
) -> Result<Arc<BeaconState<P>>> {
    if state.slot == target_slot {
        return Ok(state);
    }

    let mut advanced = (*state).clone();
    process_slots(&mut advanced, target_slot)?;

    Ok(Arc::new(advanced))
}

fn process_slot<P: Preset>(state: &mut BeaconState<P>) {
    let slots_per_historical_root = P::SLOTS_PER_HISTORICAL_ROOT;

    // > Cache state root
    let previous_state_root = state.hash_tree_root();
    let state_root_index = (state.slot % slots_per_historical_root) as usize;
    state.state_roots[state_root_index] = previous_state_root;

    // > Cache latest block header state root
    if state.latest_block_header.state_root.is_zero() {
        state.latest_block_header.state_root = previous_state_root;
    }

    // > Cache block root
    let block_root_index = (state.slot % slots_per_historical_root) as usize;
    state.block_roots[block_root_index] = state.latest_block_header.hash_tree_root();
}

fn process_epoch<P: Preset>(state: &mut BeaconState<P>) {
    process_randao_mixes_reset(state);
    state.cache.advance_epoch();
}

// > Set randao mix
fn process_randao_mixes_reset<P: Preset>(state: &mut BeaconState<P>) {
    let current_epoch = accessors::get_current_epoch(state);
    let next_epoch = current_epoch + 1;
    let mix = accessors::get_randao_mix(state, current_epoch);

    let mix_index = (next_epoch % P::EPOCHS_PER_HISTORICAL_VECTOR) as usize;
    state.randao_mixes[mix_index] = mix;
}

#[cfg(test)]
mod tests {
    use core::num::NonZeroU64;

    use std_ext::ArcExt as _;
    use types::{config::Config, phase0::primitives::H256, preset::Minimal};

    use super::*;

    fn genesis_state() -> Arc<BeaconState<Minimal>> {
        Arc::new(interop::quick_start_beacon_state(
            &Config::minimal(),
            0,
            NonZeroU64::new(8).expect("validator count is nonzero"),
        ))
    }

    #[test]
    fn advancing_to_the_same_slot_returns_the_state_unchanged() -> Result<()> {
        let state = genesis_state();
        let advanced = advance_to_slot(state.clone_arc(), state.slot)?;

        assert!(Arc::ptr_eq(&state, &advanced));

        Ok(())
    }

    #[test]
    fn advancing_is_deterministic() -> Result<()> {
        let state = genesis_state();

        let once = advance_to_slot(state.clone_arc(), 17)?;
        let again = advance_to_slot(state, 17)?;

        assert_eq!(once, again);
        assert_eq!(once.slot, 17);

        Ok(())
    }

    #[test]
    fn advancing_backwards_is_a_slot_regression() {
        let state = genesis_state();
        let advanced = advance_to_slot(state, 9).expect("advancing forward succeeds");

        let error = advance_to_slot(advanced, 8)
            .expect_err("advancing backwards fails")
            .downcast::<Error>()
            .expect("error kind is preserved");

        assert_eq!(
            error,
            Error::SlotRegression {
                state_slot: 9,
                target_slot: 8,
            },
        );
    }

    #[test]
    fn epoch_boundaries_carry_the_randao_mix_forward() -> Result<()> {
        let mut state = (*genesis_state()).clone();
        state.randao_mixes[0] = H256::repeat_byte(0xaa);

        let advanced = advance_to_slot(Arc::new(state), 8)?;

        assert_eq!(
            accessors::get_randao_mix(&advanced, 1),
            H256::repeat_byte(0xaa),
        );

        Ok(())
    }

    #[test]
    fn state_roots_are_recorded_for_processed_slots() -> Result<()> {
        let state = genesis_state();
        let advanced = advance_to_slot(state.clone_arc(), 3)?;

        assert_eq!(advanced.state_roots[0], state.hash_tree_root());
        assert_ne!(advanced.state_roots[1], H256::zero());
        assert_ne!(advanced.state_roots[2], H256::zero());

        assert_eq!(
            advanced.block_root_at_index(0),
            accessors::latest_block_root(&state),
        );

        Ok(())
    }
}
