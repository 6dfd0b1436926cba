use anyhow::{ensure, Result};
use ssz::BitList;
use tap::Pipe as _;
use types::{
    phase0::{
        beacon_state::BeaconState,
        containers::{Attestation, AttestationData, IndexedAttestation},
        primitives::ValidatorIndex,
    },
    preset::Preset,
};

use crate::{accessors::beacon_committee, error::Error};

pub fn get_indexed_attestation<P: Preset>(
    state: &BeaconState<P>,
    attestation: &Attestation,
) -> Result<IndexedAttestation> {
    let mut attesting_indices =
        get_attesting_indices(state, attestation.data, &attestation.aggregation_bits)?
            .collect::<Vec<_>>();

    // Sorting a slice is faster than building a `BTreeMap`.
    attesting_indices.sort_unstable();

    Ok(IndexedAttestation {
        attesting_indices,
        data: attestation.data,
        signature: attestation.signature,
    })
}

pub fn get_attesting_indices<'all, P: Preset>(
    state: &'all BeaconState<P>,
    attestation_data: AttestationData,
    aggregation_bits: &'all BitList,
) -> Result<impl Iterator<Item = ValidatorIndex> + 'all> {
    let committee = beacon_committee(state, attestation_data.slot, attestation_data.index)?;

    ensure!(
        committee.len() == aggregation_bits.len(),
        Error::CommitteeLengthMismatch {
            aggregation_bitlist_length: aggregation_bits.len(),
            committee_length: committee.len(),
        },
    );

    aggregation_bits
        .iter()
        .by_vals()
        .zip(committee.iter().copied())
        .filter_map(|(present, validator_index)| present.then_some(validator_index))
        .pipe(Ok)
}
