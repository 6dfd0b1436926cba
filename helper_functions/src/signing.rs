use anyhow::Result;
use bls::{CachedPublicKey, SecretKey, Signature, SignatureBytes};
use ssz::SszHash;
use types::{
    config::Config,
    phase0::{
        beacon_state::BeaconState,
        consts::DOMAIN_BEACON_ATTESTER,
        containers::AttestationData,
        primitives::{DomainType, Epoch, H256},
    },
    preset::Preset,
};

use crate::{
    accessors,
    error::SignatureKind,
    misc,
    verifier::{SingleVerifier, Verifier as _},
};

/// Signing for messages whose domain is bound to a single fork epoch.
pub trait SignForSingleFork<P: Preset>: SszHash {
    const DOMAIN_TYPE: DomainType;
    const SIGNATURE_KIND: SignatureKind;

    fn epoch(&self) -> Epoch;

    fn signing_root(&self, config: &Config, state: &BeaconState<P>) -> H256 {
        let domain = accessors::get_domain(config, state, Self::DOMAIN_TYPE, Some(self.epoch()));
        misc::compute_signing_root(self, domain)
    }

    fn sign(&self, config: &Config, state: &BeaconState<P>, secret_key: &SecretKey) -> Signature {
        secret_key.sign(self.signing_root(config, state))
    }

    fn verify(
        &self,
        config: &Config,
        state: &BeaconState<P>,
        signature_bytes: SignatureBytes,
        cached_public_key: &CachedPublicKey,
    ) -> Result<()> {
        SingleVerifier.verify_singular(
            self.signing_root(config, state),
            signature_bytes,
            cached_public_key,
            Self::SIGNATURE_KIND,
        )
    }
}

impl<P: Preset> SignForSingleFork<P> for AttestationData {
    const DOMAIN_TYPE: DomainType = DOMAIN_BEACON_ATTESTER;
    const SIGNATURE_KIND: SignatureKind = SignatureKind::Attestation;

    fn epoch(&self) -> Epoch {
        self.target.epoch
    }
}
