use blst::min_pk::SecretKey as RawSecretKey;

use crate::{
    error::Error, public_key::PublicKey, signature::Signature, DOMAIN_SEPARATION_TAG,
};

pub struct SecretKey(RawSecretKey);

// Prevent `SecretKey` from implementing some traits to avoid leaking secret keys.
static_assertions::assert_not_impl_any! {
    SecretKey:
    Clone, Copy, core::ops::Deref, ToOwned,
    core::fmt::Binary, core::fmt::Display, core::fmt::LowerExp, core::fmt::LowerHex,
    core::fmt::Octal, core::fmt::Pointer, core::fmt::UpperExp, core::fmt::UpperHex,
    serde::Serialize,
}

impl core::fmt::Debug for SecretKey {
    fn fmt(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
        formatter.write_str("[REDACTED]")
    }
}

impl SecretKey {
    /// Derives a secret key from at least 32 bytes of input keying material.
    pub fn derive(input_keying_material: impl AsRef<[u8]>) -> Result<Self, Error> {
        RawSecretKey::key_gen(input_keying_material.as_ref(), &[])
            .map(Self)
            .map_err(|_| Error::InvalidSecretKey)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, Error> {
        RawSecretKey::from_bytes(&bytes)
            .map(Self)
            .map_err(|_| Error::InvalidSecretKey)
    }

    #[must_use]
    pub fn to_public_key(&self) -> PublicKey {
        self.as_raw().sk_to_pk().into()
    }

    #[must_use]
    pub fn sign(&self, message: impl AsRef<[u8]>) -> Signature {
        self.as_raw()
            .sign(message.as_ref(), DOMAIN_SEPARATION_TAG, &[])
            .into()
    }

    const fn as_raw(&self) -> &RawSecretKey {
        &self.0
    }
}
