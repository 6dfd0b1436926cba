use anyhow::{ensure, Result};
use helper_functions::accessors;
use ssz::SszHash as _;
use types::{
    phase0::{
        beacon_state::BeaconState,
        containers::{BeaconBlock, BeaconBlockBody, BeaconBlockHeader},
        primitives::H256,
    },
    preset::Preset,
};

use crate::error::Error;

/// The committee-relevant subset of block processing.
///
/// Operation processing and signature verification happen in the block import
/// pipeline before blocks reach the stores this workspace replays from.
pub fn process_block<P: Preset>(state: &mut BeaconState<P>, block: &BeaconBlock) -> Result<()> {
    process_block_header(state, block)?;
    process_randao(state, &block.body);
    Ok(())
}

// > Verify that the slots match
// > Verify that the block is newer than latest block header
// > Verify that the parent matches
fn process_block_header<P: Preset>(state: &mut BeaconState<P>, block: &BeaconBlock) -> Result<()> {
    ensure!(
        block.slot == state.slot,
        Error::BlockSlotMismatch {
            state_slot: state.slot,
            block_slot: block.slot,
        },
    );

    ensure!(
        block.slot > state.latest_block_header.slot,
        Error::BlockNotNewerThanLatestHeader {
            header_slot: state.latest_block_header.slot,
            block_slot: block.slot,
        },
    );

    let computed = accessors::latest_block_root(state);

    ensure!(
        block.parent_root == computed,
        Error::ParentRootMismatch {
            computed,
            block_parent_root: block.parent_root,
        },
    );

    // > Cache current block as the new latest block
    state.latest_block_header = BeaconBlockHeader {
        slot: block.slot,
        proposer_index: block.proposer_index,
        parent_root: block.parent_root,
        // > Overwritten in the next process_slot call
        state_root: H256::zero(),
        body_root: block.body.hash_tree_root(),
    };

    Ok(())
}

// > Mix in RANDAO reveal
fn process_randao<P: Preset>(state: &mut BeaconState<P>, body: &BeaconBlockBody) {
    let epoch = accessors::get_current_epoch(state);
    let mix = accessors::get_randao_mix(state, epoch) ^ hashing::hash(body.randao_reveal);

    let mix_index = (epoch % P::EPOCHS_PER_HISTORICAL_VECTOR) as usize;
    state.randao_mixes[mix_index] = mix;
}
