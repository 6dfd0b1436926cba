use anyhow::{ensure, Error as AnyhowError, Result};
use itertools::Itertools as _;
use types::{
    config::Config,
    phase0::{
        beacon_state::BeaconState,
        containers::{IndexedAttestation, Validator},
        primitives::Epoch,
    },
    preset::Preset,
};

use crate::{
    accessors,
    error::{Error, SignatureKind},
    signing::SignForSingleFork as _,
    verifier::Verifier,
};

// > Check if ``validator`` is active.
#[inline]
#[must_use]
pub const fn is_active_validator(validator: &Validator, epoch: Epoch) -> bool {
    validator.activation_epoch <= epoch && epoch < validator.exit_epoch
}

// This doesn't verify the signature when called with `MultiVerifier`.
// When calling directly, use `SingleVerifier` or call `finish` manually.
pub fn validate_constructed_indexed_attestation<P: Preset>(
    config: &Config,
    state: &BeaconState<P>,
    indexed_attestation: &IndexedAttestation,
    verifier: impl Verifier,
) -> Result<()> {
    validate_indexed_attestation(config, state, indexed_attestation, verifier, false)
}

pub fn validate_received_indexed_attestation<P: Preset>(
    config: &Config,
    state: &BeaconState<P>,
    indexed_attestation: &IndexedAttestation,
    verifier: impl Verifier,
) -> Result<()> {
    validate_indexed_attestation(config, state, indexed_attestation, verifier, true)
}

fn validate_indexed_attestation<P: Preset>(
    config: &Config,
    state: &BeaconState<P>,
    indexed_attestation: &IndexedAttestation,
    mut verifier: impl Verifier,
    validate_indices_sorted_and_unique: bool,
) -> Result<()> {
    let indices = &indexed_attestation.attesting_indices;

    ensure!(!indices.is_empty(), Error::AttestationHasNoAttestingIndices);

    ensure!(
        indices.len() as u64 <= P::MAX_VALIDATORS_PER_COMMITTEE,
        Error::AttestingIndicesTooMany,
    );

    if validate_indices_sorted_and_unique {
        // > Verify indices are sorted and unique
        ensure!(
            indices.iter().tuple_windows().all(|(a, b)| a < b),
            Error::AttestingIndicesNotSortedAndUnique,
        );
    }

    let epoch = indexed_attestation.data.target.epoch;

    for validator_index in indices.iter().copied() {
        let validator = state
            .validators
            .get(usize::try_from(validator_index)?)
            .ok_or(Error::ValidatorIndexOutOfBounds {
                index: validator_index,
            })?;

        ensure!(
            is_active_validator(validator, epoch),
            Error::ValidatorNotActive {
                index: validator_index,
            },
        );
    }

    // > Verify aggregate signature
    itertools::process_results(
        indices.iter().copied().map(|validator_index| {
            accessors::public_key(state, validator_index)?
                .decompress()
                .map_err(AnyhowError::new)
        }),
        |public_keys| {
            verifier.verify_aggregate(
                indexed_attestation.data.signing_root(config, state),
                indexed_attestation.signature,
                public_keys,
                SignatureKind::Attestation,
            )
        },
    )?
}
