use ethereum_types::H256;
use once_cell::sync::Lazy;
use sha2::{Digest as _, Sha256};

/// Roots of binary Merkle trees whose leaves are all zero, indexed by depth.
///
/// The higher entries are only needed when hashing the validator and balance
/// lists in `BeaconState`.
pub const ZERO_HASH_COUNT: usize = 41;

pub static ZERO_HASHES: Lazy<[H256; ZERO_HASH_COUNT]> = Lazy::new(|| {
    let mut hashes = [H256::zero(); ZERO_HASH_COUNT];

    for depth in 1..ZERO_HASH_COUNT {
        hashes[depth] = hash_256_256(hashes[depth - 1], hashes[depth - 1]);
    }

    hashes
});

#[must_use]
pub fn hash(bytes: impl AsRef<[u8]>) -> H256 {
    H256(Sha256::digest(bytes).into())
}

#[must_use]
pub fn hash_256_256(left: H256, right: H256) -> H256 {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    H256(hasher.finalize().into())
}

#[must_use]
pub fn hash_256_8(first: H256, second: u8) -> H256 {
    let mut hasher = Sha256::new();
    hasher.update(first);
    hasher.update([second]);
    H256(hasher.finalize().into())
}

#[must_use]
pub fn hash_256_8_32(first: H256, second: u8, third: u32) -> H256 {
    let mut hasher = Sha256::new();
    hasher.update(first);
    hasher.update([second]);
    hasher.update(third.to_le_bytes());
    H256(hasher.finalize().into())
}

#[must_use]
pub fn hash_256_64(first: H256, second: u64) -> H256 {
    let mut hasher = Sha256::new();
    hasher.update(first);
    hasher.update(second.to_le_bytes());
    H256(hasher.finalize().into())
}

#[must_use]
pub fn hash_32_64_256(first: [u8; 4], second: u64, third: H256) -> H256 {
    let mut hasher = Sha256::new();
    hasher.update(first);
    hasher.update(second.to_le_bytes());
    hasher.update(third);
    H256(hasher.finalize().into())
}
