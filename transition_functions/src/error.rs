use thiserror::Error;
use types::phase0::primitives::{Slot, H256};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("block slot {block_slot} does not match state slot {state_slot}")]
    BlockSlotMismatch { state_slot: Slot, block_slot: Slot },
    #[error("block is not newer than the latest block header (block slot: {block_slot}, header slot: {header_slot})")]
    BlockNotNewerThanLatestHeader { header_slot: Slot, block_slot: Slot },
    #[error("block parent root {block_parent_root:?} does not match the latest block header root {computed:?}")]
    ParentRootMismatch {
        computed: H256,
        block_parent_root: H256,
    },
    // Advancing a state backwards indicates a bug in the caller, not bad input.
    #[error("target slot {target_slot} is earlier than state slot {state_slot}")]
    SlotRegression { state_slot: Slot, target_slot: Slot },
    #[error("state root in block ({in_block:?}) does not match the computed state root ({computed:?})")]
    StateRootMismatch { computed: H256, in_block: H256 },
}
