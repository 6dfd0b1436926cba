use core::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::{
    cache::Cache,
    phase0::{
        containers::{BeaconBlockHeader, Checkpoint, Fork, Validator},
        primitives::{Epoch, Gwei, Slot, UnixSeconds, H256},
    },
    preset::Preset,
};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(bound = "", deny_unknown_fields)]
pub struct BeaconState<P: Preset> {
    // > Versioning
    pub genesis_time: UnixSeconds,
    pub genesis_validators_root: H256,
    pub slot: Slot,
    pub fork: Fork,

    // > History
    pub latest_block_header: BeaconBlockHeader,
    pub block_roots: Vec<H256>,
    pub state_roots: Vec<H256>,

    // > Registry
    pub validators: Vec<Validator>,
    pub balances: Vec<Gwei>,

    // > Randomness
    pub randao_mixes: Vec<H256>,

    // > Finality
    pub previous_justified_checkpoint: Checkpoint,
    pub current_justified_checkpoint: Checkpoint,
    pub finalized_checkpoint: Checkpoint,

    // Cache
    #[serde(skip)]
    pub cache: Cache,

    #[serde(skip)]
    pub phantom: PhantomData<P>,
}

impl<P: Preset> Default for BeaconState<P> {
    fn default() -> Self {
        Self {
            genesis_time: 0,
            genesis_validators_root: H256::zero(),
            slot: 0,
            fork: Fork::default(),
            latest_block_header: BeaconBlockHeader::default(),
            block_roots: vec![H256::zero(); P::SLOTS_PER_HISTORICAL_ROOT.get() as usize],
            state_roots: vec![H256::zero(); P::SLOTS_PER_HISTORICAL_ROOT.get() as usize],
            validators: vec![],
            balances: vec![],
            randao_mixes: vec![H256::zero(); P::EPOCHS_PER_HISTORICAL_VECTOR.get() as usize],
            previous_justified_checkpoint: Checkpoint::default(),
            current_justified_checkpoint: Checkpoint::default(),
            finalized_checkpoint: Checkpoint::default(),
            cache: Cache::default(),
            phantom: PhantomData,
        }
    }
}

// The cache holds values derived from the other fields, so it is excluded.
impl<P: Preset> PartialEq for BeaconState<P> {
    fn eq(&self, other: &Self) -> bool {
        self.genesis_time == other.genesis_time
            && self.genesis_validators_root == other.genesis_validators_root
            && self.slot == other.slot
            && self.fork == other.fork
            && self.latest_block_header == other.latest_block_header
            && self.block_roots == other.block_roots
            && self.state_roots == other.state_roots
            && self.validators == other.validators
            && self.balances == other.balances
            && self.randao_mixes == other.randao_mixes
            && self.previous_justified_checkpoint == other.previous_justified_checkpoint
            && self.current_justified_checkpoint == other.current_justified_checkpoint
            && self.finalized_checkpoint == other.finalized_checkpoint
    }
}

impl<P: Preset> Eq for BeaconState<P> {}

impl<P: Preset> BeaconState<P> {
    /// Returns the RANDAO mix for `epoch`, which must be within
    /// `P::EPOCHS_PER_HISTORICAL_VECTOR` epochs of the state's own epoch.
    #[must_use]
    pub fn randao_mix(&self, epoch: Epoch) -> H256 {
        self.randao_mixes[(epoch % P::EPOCHS_PER_HISTORICAL_VECTOR) as usize]
    }

    #[must_use]
    pub fn block_root_at_index(&self, slot: Slot) -> H256 {
        self.block_roots[(slot % P::SLOTS_PER_HISTORICAL_ROOT) as usize]
    }
}
