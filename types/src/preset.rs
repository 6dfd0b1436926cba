use core::{fmt::Debug, hash::Hash, num::NonZeroU64};

use nonzero_ext::nonzero;

/// Compile-time configuration variables.
///
/// See [presets in `consensus-specs`](https://github.com/ethereum/consensus-specs/tree/master/presets).
pub trait Preset: Copy + Eq + Ord + Hash + Default + Debug + Send + Sync + 'static {
    const EPOCHS_PER_HISTORICAL_VECTOR: NonZeroU64;
    const MAX_COMMITTEES_PER_SLOT: u64;
    const MAX_VALIDATORS_PER_COMMITTEE: u64;
    const MIN_SEED_LOOKAHEAD: u64;
    const SHUFFLE_ROUND_COUNT: u8;
    const SLOTS_PER_EPOCH: NonZeroU64;
    const SLOTS_PER_HISTORICAL_ROOT: NonZeroU64;
    const TARGET_COMMITTEE_SIZE: NonZeroU64;
    const VALIDATOR_REGISTRY_LIMIT: u64;
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Mainnet;

impl Preset for Mainnet {
    const EPOCHS_PER_HISTORICAL_VECTOR: NonZeroU64 = nonzero!(65_536_u64);
    const MAX_COMMITTEES_PER_SLOT: u64 = 64;
    const MAX_VALIDATORS_PER_COMMITTEE: u64 = 2048;
    const MIN_SEED_LOOKAHEAD: u64 = 1;
    const SHUFFLE_ROUND_COUNT: u8 = 90;
    const SLOTS_PER_EPOCH: NonZeroU64 = nonzero!(32_u64);
    const SLOTS_PER_HISTORICAL_ROOT: NonZeroU64 = nonzero!(8192_u64);
    const TARGET_COMMITTEE_SIZE: NonZeroU64 = nonzero!(128_u64);
    const VALIDATOR_REGISTRY_LIMIT: u64 = 1 << 40;
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Minimal;

impl Preset for Minimal {
    const EPOCHS_PER_HISTORICAL_VECTOR: NonZeroU64 = nonzero!(64_u64);
    const MAX_COMMITTEES_PER_SLOT: u64 = 4;
    const MAX_VALIDATORS_PER_COMMITTEE: u64 = 2048;
    const MIN_SEED_LOOKAHEAD: u64 = 1;
    const SHUFFLE_ROUND_COUNT: u8 = 10;
    const SLOTS_PER_EPOCH: NonZeroU64 = nonzero!(8_u64);
    const SLOTS_PER_HISTORICAL_ROOT: NonZeroU64 = nonzero!(64_u64);
    const TARGET_COMMITTEE_SIZE: NonZeroU64 = nonzero!(4_u64);
    const VALIDATOR_REGISTRY_LIMIT: u64 = 1 << 40;
}
