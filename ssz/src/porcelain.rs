use ethereum_types::H256;

/// Merkleization as defined by SSZ.
///
/// Only hashing is provided. Wire serialization of consensus objects is the
/// responsibility of the enclosing protocol stack.
pub trait SszHash {
    fn hash_tree_root(&self) -> H256;
}

impl<T: SszHash + ?Sized> SszHash for &T {
    fn hash_tree_root(&self) -> H256 {
        (*self).hash_tree_root()
    }
}

impl SszHash for u8 {
    fn hash_tree_root(&self) -> H256 {
        let mut chunk = H256::zero();
        chunk.as_bytes_mut()[0] = *self;
        chunk
    }
}

impl SszHash for u64 {
    fn hash_tree_root(&self) -> H256 {
        let mut chunk = H256::zero();
        chunk[..size_of::<Self>()].copy_from_slice(&self.to_le_bytes());
        chunk
    }
}

impl SszHash for bool {
    fn hash_tree_root(&self) -> H256 {
        u8::from(*self).hash_tree_root()
    }
}

impl SszHash for H256 {
    fn hash_tree_root(&self) -> H256 {
        *self
    }
}
