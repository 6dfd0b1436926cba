use core::fmt::{Debug, Formatter, Result as FmtResult};

use ethereum_types::H256;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ssz::SszHash;

use crate::{error::Error, public_key::PublicKey, public_key_bytes::PublicKeyBytes};

/// A compressed public key that caches its decompressed form.
///
/// Decompression is deferred because it is expensive and many stored keys are
/// never used to verify anything.
#[derive(Default)]
pub struct CachedPublicKey {
    bytes: PublicKeyBytes,
    decompressed: OnceCell<PublicKey>,
}

impl Clone for CachedPublicKey {
    fn clone(&self) -> Self {
        self.bytes.into()
    }
}

impl PartialEq for CachedPublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for CachedPublicKey {}

impl Debug for CachedPublicKey {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        self.bytes.fmt(formatter)
    }
}

impl From<PublicKeyBytes> for CachedPublicKey {
    fn from(bytes: PublicKeyBytes) -> Self {
        Self {
            bytes,
            decompressed: OnceCell::new(),
        }
    }
}

impl From<PublicKey> for CachedPublicKey {
    fn from(public_key: PublicKey) -> Self {
        Self {
            bytes: public_key.to_bytes(),
            decompressed: OnceCell::with_value(public_key),
        }
    }
}

impl Serialize for CachedPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bytes.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CachedPublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        PublicKeyBytes::deserialize(deserializer).map(Self::from)
    }
}

impl SszHash for CachedPublicKey {
    fn hash_tree_root(&self) -> H256 {
        self.bytes.hash_tree_root()
    }
}

impl CachedPublicKey {
    #[must_use]
    pub const fn to_bytes(&self) -> PublicKeyBytes {
        self.bytes
    }

    pub fn decompress(&self) -> Result<&PublicKey, Error> {
        self.decompressed.get_or_try_init(|| self.bytes.try_into())
    }
}
