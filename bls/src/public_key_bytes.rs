use core::{
    fmt::{Debug, Formatter, Result as FmtResult},
    hash::{Hash, Hasher},
};

use ethereum_types::H256;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use ssz::{merkleize_chunks, SszHash, BYTES_PER_CHUNK};

pub const COMPRESSED_SIZE: usize = 48;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKeyBytes(pub(crate) [u8; COMPRESSED_SIZE]);

impl Default for PublicKeyBytes {
    fn default() -> Self {
        Self([0; COMPRESSED_SIZE])
    }
}

impl Hash for PublicKeyBytes {
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        self.0.hash(hasher);
    }
}

impl AsRef<[u8]> for PublicKeyBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; COMPRESSED_SIZE]> for PublicKeyBytes {
    fn from(bytes: [u8; COMPRESSED_SIZE]) -> Self {
        Self(bytes)
    }
}

impl Debug for PublicKeyBytes {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        write!(formatter, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for PublicKeyBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
    }
}

impl<'de> Deserialize<'de> for PublicKeyBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let string = String::deserialize(deserializer)?;
        let digits = string.strip_prefix("0x").unwrap_or(&string);

        let mut bytes = [0; COMPRESSED_SIZE];
        hex::decode_to_slice(digits, &mut bytes).map_err(D::Error::custom)?;

        Ok(Self(bytes))
    }
}

impl SszHash for PublicKeyBytes {
    fn hash_tree_root(&self) -> H256 {
        let mut high = H256::zero();
        high[..COMPRESSED_SIZE - BYTES_PER_CHUNK].copy_from_slice(&self.0[BYTES_PER_CHUNK..]);
        merkleize_chunks([H256::from_slice(&self.0[..BYTES_PER_CHUNK]), high], None)
    }
}

impl PublicKeyBytes {
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; COMPRESSED_SIZE] {
        &self.0
    }
}
