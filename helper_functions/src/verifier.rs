use anyhow::{ensure, Result};
use bls::{
    AggregatePublicKey, AggregateSignature, CachedPublicKey, PublicKey, Signature, SignatureBytes,
};
use rayon::iter::{IntoParallelRefIterator as _, ParallelBridge as _, ParallelIterator as _};
use static_assertions::assert_not_impl_any;
use types::phase0::primitives::H256;

use crate::error::{Error, SignatureKind};

pub trait Verifier {
    fn reserve(&mut self, additional: usize);

    fn verify_singular(
        &mut self,
        message: H256,
        signature_bytes: SignatureBytes,
        cached_public_key: &CachedPublicKey,
        signature_kind: SignatureKind,
    ) -> Result<()>;

    fn verify_aggregate<'keys>(
        &mut self,
        message: H256,
        signature_bytes: SignatureBytes,
        public_keys: impl IntoIterator<IntoIter = impl Iterator<Item = &'keys PublicKey> + Send, Item = &'keys PublicKey>,
        signature_kind: SignatureKind,
    ) -> Result<()>;

    fn extend(
        &mut self,
        triples: impl IntoIterator<Item = Triple>,
        signature_kind: SignatureKind,
    ) -> Result<()>;

    fn finish(&self) -> Result<()>;
}

impl<V: Verifier> Verifier for &mut V {
    #[inline]
    fn reserve(&mut self, additional: usize) {
        (*self).reserve(additional);
    }

    #[inline]
    fn verify_singular(
        &mut self,
        message: H256,
        signature_bytes: SignatureBytes,
        cached_public_key: &CachedPublicKey,
        signature_kind: SignatureKind,
    ) -> Result<()> {
        (*self).verify_singular(message, signature_bytes, cached_public_key, signature_kind)
    }

    #[inline]
    fn verify_aggregate<'keys>(
        &mut self,
        message: H256,
        signature_bytes: SignatureBytes,
        public_keys: impl IntoIterator<IntoIter = impl Iterator<Item = &'keys PublicKey> + Send, Item = &'keys PublicKey>,
        signature_kind: SignatureKind,
    ) -> Result<()> {
        (*self).verify_aggregate(message, signature_bytes, public_keys, signature_kind)
    }

    #[inline]
    fn extend(
        &mut self,
        triples: impl IntoIterator<Item = Triple>,
        signature_kind: SignatureKind,
    ) -> Result<()> {
        (*self).extend(triples, signature_kind)
    }

    #[inline]
    fn finish(&self) -> Result<()> {
        (**self).finish()
    }
}

/// Collects messages without verifying anything.
///
/// Used when replaying blocks whose signatures were verified on arrival.
pub struct NullVerifier;

impl Verifier for NullVerifier {
    #[inline]
    fn reserve(&mut self, _additional: usize) {}

    #[inline]
    fn verify_singular(
        &mut self,
        _message: H256,
        _signature_bytes: SignatureBytes,
        _cached_public_key: &CachedPublicKey,
        _signature_kind: SignatureKind,
    ) -> Result<()> {
        Ok(())
    }

    #[inline]
    fn verify_aggregate<'keys>(
        &mut self,
        _message: H256,
        _signature_bytes: SignatureBytes,
        _public_keys: impl IntoIterator<IntoIter = impl Iterator<Item = &'keys PublicKey> + Send, Item = &'keys PublicKey>,
        _signature_kind: SignatureKind,
    ) -> Result<()> {
        Ok(())
    }

    #[inline]
    fn extend(
        &mut self,
        _triples: impl IntoIterator<Item = Triple>,
        _signature_kind: SignatureKind,
    ) -> Result<()> {
        Ok(())
    }

    #[inline]
    fn finish(&self) -> Result<()> {
        Ok(())
    }
}

pub struct SingleVerifier;

impl Verifier for SingleVerifier {
    #[inline]
    fn reserve(&mut self, _additional: usize) {}

    #[inline]
    fn verify_singular(
        &mut self,
        message: H256,
        signature_bytes: SignatureBytes,
        cached_public_key: &CachedPublicKey,
        signature_kind: SignatureKind,
    ) -> Result<()> {
        let public_key = *cached_public_key.decompress()?;
        let triple = Triple::new(message, signature_bytes, public_key);
        self.extend(core::iter::once(triple), signature_kind)
    }

    #[inline]
    fn verify_aggregate<'keys>(
        &mut self,
        message: H256,
        signature_bytes: SignatureBytes,
        public_keys: impl IntoIterator<IntoIter = impl Iterator<Item = &'keys PublicKey> + Send, Item = &'keys PublicKey>,
        signature_kind: SignatureKind,
    ) -> Result<()> {
        ensure!(
            AggregateSignature::try_from(signature_bytes)?
                .fast_aggregate_verify(message, public_keys),
            Error::SignatureInvalid(signature_kind),
        );

        Ok(())
    }

    #[inline]
    fn extend(
        &mut self,
        triples: impl IntoIterator<Item = Triple>,
        signature_kind: SignatureKind,
    ) -> Result<()> {
        for triple in triples {
            let Triple {
                message,
                signature_bytes,
                public_key,
            } = triple;

            let signature = Signature::try_from(signature_bytes)?;

            ensure!(
                signature.verify(message, &public_key),
                Error::SignatureInvalid(signature_kind),
            );
        }

        Ok(())
    }

    #[inline]
    fn finish(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MultiVerifier {
    triples: Vec<Triple>,
}

impl Verifier for MultiVerifier {
    #[inline]
    fn reserve(&mut self, additional: usize) {
        self.triples.reserve_exact(additional);
    }

    #[inline]
    fn verify_singular(
        &mut self,
        message: H256,
        signature_bytes: SignatureBytes,
        cached_public_key: &CachedPublicKey,
        _signature_kind: SignatureKind,
    ) -> Result<()> {
        let public_key = *cached_public_key.decompress()?;
        let triple = Triple::new(message, signature_bytes, public_key);
        self.triples.push(triple);
        Ok(())
    }

    #[inline]
    fn verify_aggregate<'keys>(
        &mut self,
        message: H256,
        signature_bytes: SignatureBytes,
        public_keys: impl IntoIterator<IntoIter = impl Iterator<Item = &'keys PublicKey> + Send, Item = &'keys PublicKey>,
        signature_kind: SignatureKind,
    ) -> Result<()> {
        let mut triple = Triple::default();
        triple.verify_aggregate(message, signature_bytes, public_keys, signature_kind)?;
        self.triples.push(triple);
        Ok(())
    }

    #[inline]
    fn extend(
        &mut self,
        triples: impl IntoIterator<Item = Triple>,
        _signature_kind: SignatureKind,
    ) -> Result<()> {
        self.triples.extend(triples);
        Ok(())
    }

    #[inline]
    fn finish(&self) -> Result<()> {
        if self.triples.is_empty() {
            return Ok(());
        }

        let messages = self.triples.iter().map(|triple| triple.message.as_bytes());

        let signatures = self
            .triples
            .par_iter()
            .map(|triple| triple.signature_bytes.try_into())
            .collect::<Result<Vec<_>, _>>()?;

        let public_keys = self.triples.iter().map(|triple| &triple.public_key);

        ensure!(
            Signature::multi_verify(messages, signatures.iter(), public_keys),
            Error::SignatureInvalid(SignatureKind::Multi),
        );

        Ok(())
    }
}

impl From<Vec<Triple>> for MultiVerifier {
    fn from(triples: Vec<Triple>) -> Self {
        Self { triples }
    }
}

#[derive(Default)]
pub struct Triple {
    message: H256,
    signature_bytes: SignatureBytes,
    public_key: PublicKey,
}

// `Triple` was originally an alias for a tuple and thus implemented `Copy`.
// Implicit copying would make it too easy to verify a stale triple.
assert_not_impl_any!(Triple: Copy);

impl Triple {
    #[must_use]
    pub const fn new(message: H256, signature_bytes: SignatureBytes, public_key: PublicKey) -> Self {
        Self {
            message,
            signature_bytes,
            public_key,
        }
    }
}

// The unimplemented methods could be implemented without much difficulty,
// but they're not used anywhere.
impl Verifier for Triple {
    #[inline]
    fn reserve(&mut self, _additional: usize) {
        unimplemented!("<Triple as Verifier>::reserve is not used anywhere")
    }

    #[inline]
    fn verify_singular(
        &mut self,
        _message: H256,
        _signature_bytes: SignatureBytes,
        _cached_public_key: &CachedPublicKey,
        _signature_kind: SignatureKind,
    ) -> Result<()> {
        unimplemented!("<Triple as Verifier>::verify_singular is not used anywhere")
    }

    #[inline]
    fn verify_aggregate<'keys>(
        &mut self,
        message: H256,
        signature_bytes: SignatureBytes,
        public_keys: impl IntoIterator<IntoIter = impl Iterator<Item = &'keys PublicKey> + Send, Item = &'keys PublicKey>,
        _signature_kind: SignatureKind,
    ) -> Result<()> {
        let public_key = public_keys
            .into_iter()
            .par_bridge()
            .copied()
            .reduce(AggregatePublicKey::default, AggregatePublicKey::aggregate);

        *self = Self::new(message, signature_bytes, public_key);

        Ok(())
    }

    #[inline]
    fn extend(
        &mut self,
        _triples: impl IntoIterator<Item = Self>,
        _signature_kind: SignatureKind,
    ) -> Result<()> {
        unimplemented!("<Triple as Verifier>::extend is not used anywhere")
    }

    #[inline]
    fn finish(&self) -> Result<()> {
        unimplemented!("<Triple as Verifier>::finish is not used anywhere")
    }
}

#[cfg(test)]
mod tests {
    use bls::SecretKey;

    use super::*;

    #[test]
    fn multi_verifier_finish_succeeds_with_0_signatures() -> Result<()> {
        MultiVerifier::default().finish()
    }

    #[test]
    fn null_verifier_accepts_undecodable_signatures() -> Result<()> {
        NullVerifier.verify_singular(
            H256::default(),
            SignatureBytes::default(),
            &CachedPublicKey::default(),
            SignatureKind::Attestation,
        )?;

        NullVerifier.finish()
    }

    #[test]
    fn multi_verifier_finish_succeeds_with_1_signature() -> Result<()> {
        let secret_key = secret_key();
        let public_key = secret_key.to_public_key().into();
        let message = H256::default();
        let signature = secret_key.sign(message).into();

        let mut verifier = MultiVerifier::default();
        verifier.verify_singular(message, signature, &public_key, SignatureKind::Attestation)?;
        verifier.finish()
    }

    #[test]
    fn multi_verifier_finish_fails_with_a_mismatched_message() -> Result<()> {
        let secret_key = secret_key();
        let public_key = secret_key.to_public_key().into();
        let signature = secret_key.sign(H256::default()).into();

        let mut verifier = MultiVerifier::default();
        verifier.verify_singular(
            H256::repeat_byte(1),
            signature,
            &public_key,
            SignatureKind::Attestation,
        )?;

        assert!(verifier.finish().is_err());

        Ok(())
    }

    fn secret_key() -> SecretKey {
        SecretKey::from_bytes(*b"????????????????????????????????")
            .expect("bytes encode a valid secret key")
    }
}
