use ethereum_types::H256;
use hashing::ZERO_HASHES;

pub const BYTES_PER_CHUNK: usize = H256::len_bytes();

/// Merkleizes `chunks` into a tree with `limit` leaves.
///
/// Passing `None` pads the leaf layer to the next power of two, which is the
/// rule for containers. Lists pass their maximum length and must mix in their
/// actual length afterwards.
#[must_use]
pub fn merkleize_chunks(chunks: impl IntoIterator<Item = H256>, limit: Option<u64>) -> H256 {
    let mut nodes = chunks.into_iter().collect::<Vec<_>>();

    let leaf_count = match limit {
        Some(limit) => {
            assert!(
                nodes.len() as u64 <= limit,
                "chunk count {} exceeds limit {limit}",
                nodes.len(),
            );
            limit
        }
        None => nodes.len() as u64,
    };

    let depth = depth_for(leaf_count);

    for height in 0..depth {
        if nodes.len() % 2 == 1 {
            nodes.push(ZERO_HASHES[height]);
        }

        nodes = nodes
            .chunks_exact(2)
            .map(|pair| hashing::hash_256_256(pair[0], pair[1]))
            .collect();
    }

    nodes.first().copied().unwrap_or(ZERO_HASHES[depth])
}

#[must_use]
pub fn mix_in_length(root: H256, length: u64) -> H256 {
    hashing::hash_256_256(root, length_chunk(length))
}

/// Packs little-endian `u64` values into 32 byte chunks for basic list hashing.
#[must_use]
pub fn pack_u64s(values: impl IntoIterator<Item = u64>) -> Vec<H256> {
    let mut chunks = vec![];
    let mut offset = BYTES_PER_CHUNK;

    for value in values {
        if offset == BYTES_PER_CHUNK {
            chunks.push(H256::zero());
            offset = 0;
        }

        let chunk = chunks.last_mut().expect("a chunk was pushed above");
        chunk[offset..offset + size_of::<u64>()].copy_from_slice(&value.to_le_bytes());
        offset += size_of::<u64>();
    }

    chunks
}

fn length_chunk(length: u64) -> H256 {
    let mut chunk = H256::zero();
    chunk[..size_of::<u64>()].copy_from_slice(&length.to_le_bytes());
    chunk
}

fn depth_for(leaf_count: u64) -> usize {
    leaf_count
        .next_power_of_two()
        .trailing_zeros()
        .try_into()
        .expect("tree depth fits in usize")
}
