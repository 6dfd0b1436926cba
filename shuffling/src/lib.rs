use core::num::NonZeroU64;

use bit_field::BitArray as _;
use types::{phase0::primitives::H256, preset::Preset};

const BITS_PER_HASH: u64 = H256::len_bytes() as u64 * 8;

// Based on the swap-or-not shuffle:
// <https://github.com/ethereum/consensus-specs/blob/master/specs/phase0/beacon-chain.md#compute_shuffled_index>
//
// Maps a position in the shuffled list to an index into the original list.
// Committee derivation applies this to each position in the committee's range,
// which is cheaper than shuffling the whole list when committees are read for
// a single slot at a time.
#[must_use]
pub fn shuffle_single<P: Preset>(mut index: u64, index_count: NonZeroU64, seed: H256) -> u64 {
    assert!(index < index_count.get());

    for round in 0..P::SHUFFLE_ROUND_COUNT {
        let pivot = compute_pivot(seed, round, index_count);
        let flip = (pivot + index_count.get() - index) % index_count;
        let position = index.max(flip);
        let source = compute_source(seed, round, position / BITS_PER_HASH);
        let bit_index = position.to_le_bytes()[0].into();
        let bit = source.as_bytes().get_bit(bit_index);

        if bit {
            index = flip;
        }
    }

    index
}

fn compute_pivot(seed: H256, round: u8, index_count: NonZeroU64) -> u64 {
    let digest = hashing::hash_256_8(seed, round);

    let pivot = digest[..size_of::<u64>()]
        .try_into()
        .map(u64::from_le_bytes)
        .expect("slice has the same size as u64");

    pivot % index_count
}

fn compute_source(seed: H256, round: u8, position_window: u64) -> H256 {
    // Truncate to match the behavior of `compute_shuffled_index` in `consensus-specs`.
    #[allow(clippy::cast_possible_truncation)]
    hashing::hash_256_8_32(seed, round, position_window as u32)
}
