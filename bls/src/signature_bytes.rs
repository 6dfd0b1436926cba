use core::fmt::{Debug, Formatter, Result as FmtResult};

use ethereum_types::H256;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use ssz::{merkleize_chunks, SszHash, BYTES_PER_CHUNK};

pub const COMPRESSED_SIZE: usize = 96;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SignatureBytes(pub(crate) [u8; COMPRESSED_SIZE]);

impl Default for SignatureBytes {
    fn default() -> Self {
        Self([0; COMPRESSED_SIZE])
    }
}

impl AsRef<[u8]> for SignatureBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; COMPRESSED_SIZE]> for SignatureBytes {
    fn from(bytes: [u8; COMPRESSED_SIZE]) -> Self {
        Self(bytes)
    }
}

impl Debug for SignatureBytes {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        write!(formatter, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for SignatureBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
    }
}

impl<'de> Deserialize<'de> for SignatureBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let string = String::deserialize(deserializer)?;
        let digits = string.strip_prefix("0x").unwrap_or(&string);

        let mut bytes = [0; COMPRESSED_SIZE];
        hex::decode_to_slice(digits, &mut bytes).map_err(D::Error::custom)?;

        Ok(Self(bytes))
    }
}

impl SszHash for SignatureBytes {
    fn hash_tree_root(&self) -> H256 {
        let chunks = self
            .0
            .chunks_exact(BYTES_PER_CHUNK)
            .map(H256::from_slice)
            .collect::<Vec<_>>();

        merkleize_chunks(chunks, None)
    }
}

impl SignatureBytes {
    /// The compressed serialization of the point at infinity.
    #[must_use]
    pub fn empty() -> Self {
        let mut bytes = [0; COMPRESSED_SIZE];
        bytes[0] = 0b1100_0000;
        Self(bytes)
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self == Self::empty()
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; COMPRESSED_SIZE] {
        &self.0
    }
}
