use core::num::NonZeroU64;
use std::sync::Arc;

use anyhow::{bail, ensure, Result};
use bls::CachedPublicKey;
use ssz::SszHash as _;
use types::{
    config::Config,
    nonstandard::RelativeEpoch,
    phase0::{
        beacon_state::BeaconState,
        consts::GENESIS_EPOCH,
        primitives::{CommitteeIndex, DomainType, Epoch, Slot, ValidatorIndex, H256},
    },
    preset::Preset,
};

use crate::{error::Error, misc, predicates};

#[must_use]
pub fn get_previous_epoch<P: Preset>(state: &BeaconState<P>) -> Epoch {
    get_current_epoch(state)
        .saturating_sub(1)
        .max(GENESIS_EPOCH)
}

#[must_use]
pub fn get_current_epoch<P: Preset>(state: &BeaconState<P>) -> Epoch {
    misc::compute_epoch_at_slot::<P>(state.slot)
}

#[must_use]
pub fn get_next_epoch<P: Preset>(state: &BeaconState<P>) -> Epoch {
    get_current_epoch(state) + 1
}

#[must_use]
pub fn absolute_epoch<P: Preset>(state: &BeaconState<P>, relative_epoch: RelativeEpoch) -> Epoch {
    match relative_epoch {
        RelativeEpoch::Previous => get_previous_epoch(state),
        RelativeEpoch::Current => get_current_epoch(state),
        RelativeEpoch::Next => get_next_epoch(state),
    }
}

pub fn relative_epoch<P: Preset>(state: &BeaconState<P>, epoch: Epoch) -> Result<RelativeEpoch> {
    match get_next_epoch(state).checked_sub(epoch) {
        None => bail!(Error::EpochAfterNext),
        Some(0) => Ok(RelativeEpoch::Next),
        Some(1) => Ok(RelativeEpoch::Current),
        Some(2) => Ok(RelativeEpoch::Previous),
        Some(_) => bail!(Error::EpochBeforePrevious),
    }
}

#[must_use]
pub fn get_randao_mix<P: Preset>(state: &BeaconState<P>, epoch: Epoch) -> H256 {
    state.randao_mix(epoch)
}

/// Returns the root of the block the state was produced by.
///
/// The latest block header is stored with a zeroed state root until the next
/// slot is processed, so it may have to be filled in before hashing.
#[must_use]
pub fn latest_block_root<P: Preset>(state: &BeaconState<P>) -> H256 {
    let mut header = state.latest_block_header;

    if header.state_root.is_zero() {
        header.state_root = state.hash_tree_root();
    }

    header.hash_tree_root()
}

pub fn public_key<P: Preset>(
    state: &BeaconState<P>,
    validator_index: ValidatorIndex,
) -> Result<&CachedPublicKey> {
    let validator = state
        .validators
        .get(usize::try_from(validator_index)?)
        .ok_or(Error::ValidatorIndexOutOfBounds {
            index: validator_index,
        })?;

    Ok(&validator.pubkey)
}

pub fn get_active_validator_indices<P: Preset>(
    state: &BeaconState<P>,
    epoch: Epoch,
) -> impl Iterator<Item = ValidatorIndex> + '_ {
    (0..)
        .zip(&state.validators)
        .filter(move |(_, validator)| predicates::is_active_validator(validator, epoch))
        .map(|(index, _)| index)
}

pub fn active_validator_indices_ordered<P: Preset>(
    state: &BeaconState<P>,
    relative_epoch: RelativeEpoch,
) -> &Arc<[ValidatorIndex]> {
    state.cache.active_validator_indices_ordered[relative_epoch].get_or_init(|| {
        let epoch = absolute_epoch(state, relative_epoch);
        get_active_validator_indices(state, epoch).collect()
    })
}

/// Returns the active validator indices for `relative_epoch` permuted by the
/// swap-or-not shuffle under that epoch's attester seed.
///
/// Committees are contiguous slices of this list.
pub fn active_validator_indices_shuffled<P: Preset>(
    state: &BeaconState<P>,
    relative_epoch: RelativeEpoch,
) -> &Arc<[ValidatorIndex]> {
    state.cache.active_validator_indices_shuffled[relative_epoch].get_or_init(|| {
        let epoch = absolute_epoch(state, relative_epoch);
        let seed = get_seed(state, epoch, types::phase0::consts::DOMAIN_BEACON_ATTESTER);
        let ordered = active_validator_indices_ordered(state, relative_epoch);

        let Some(count) = NonZeroU64::new(ordered.len() as u64) else {
            return Arc::from(vec![]);
        };

        (0..count.get())
            .map(|position| {
                let index = misc::compute_shuffled_index::<P>(position, count, seed);
                ordered[usize::try_from(index).expect(
                    "the shuffled index is less than ordered.len() which fits in usize",
                )]
            })
            .collect()
    })
}

#[must_use]
pub fn active_validator_count_u64<P: Preset>(
    state: &BeaconState<P>,
    relative_epoch: RelativeEpoch,
) -> u64 {
    active_validator_indices_ordered(state, relative_epoch).len() as u64
}

#[must_use]
pub fn get_committee_count_per_slot<P: Preset>(
    state: &BeaconState<P>,
    relative_epoch: RelativeEpoch,
) -> u64 {
    let active_validator_count = active_validator_count_u64(state, relative_epoch);
    misc::committee_count_from_active_validator_count::<P>(active_validator_count)
}

pub fn beacon_committee<P: Preset>(
    state: &BeaconState<P>,
    slot: Slot,
    committee_index: CommitteeIndex,
) -> Result<&[ValidatorIndex]> {
    let epoch = misc::compute_epoch_at_slot::<P>(slot);
    let relative_epoch = relative_epoch(state, epoch)?;
    let committees_per_slot = get_committee_count_per_slot(state, relative_epoch);

    ensure!(
        committee_index < committees_per_slot,
        Error::CommitteeIndexOutOfBounds,
    );

    let indices = active_validator_indices_shuffled(state, relative_epoch);
    let validator_count = indices.len() as u64;
    let committees_in_epoch = committees_per_slot * P::SLOTS_PER_EPOCH.get();
    let slots_since_epoch_start = misc::slots_since_epoch_start::<P>(slot);
    let index_in_epoch = slots_since_epoch_start * committees_per_slot + committee_index;
    let start = usize::try_from(validator_count * index_in_epoch / committees_in_epoch)?;
    let end = usize::try_from(validator_count * (index_in_epoch + 1) / committees_in_epoch)?;

    Ok(&indices[start..end])
}

/// [`get_seed`](https://github.com/ethereum/consensus-specs/blob/master/specs/phase0/beacon-chain.md#get_seed)
///
/// The mix is taken from the end of the previous epoch's lookahead window, so
/// states that diverge only after that point still produce equal seeds.
#[must_use]
pub fn get_seed<P: Preset>(state: &BeaconState<P>, epoch: Epoch, domain_type: DomainType) -> H256 {
    let mix = get_randao_mix(
        state,
        epoch + P::EPOCHS_PER_HISTORICAL_VECTOR.get() - P::MIN_SEED_LOOKAHEAD - 1,
    );

    hashing::hash_32_64_256(domain_type.to_fixed_bytes(), epoch, mix)
}

#[must_use]
pub fn get_domain<P: Preset>(
    config: &Config,
    state: &BeaconState<P>,
    domain_type: DomainType,
    epoch: Option<Epoch>,
) -> H256 {
    let epoch = epoch.unwrap_or_else(|| get_current_epoch(state));
    let fork = state.fork;

    let fork_version = if epoch < fork.epoch {
        fork.previous_version
    } else {
        fork.current_version
    };

    misc::compute_domain(
        config,
        domain_type,
        Some(fork_version),
        Some(state.genesis_validators_root),
    )
}

#[cfg(test)]
mod tests {
    use types::preset::Minimal;

    use super::*;

    fn state_with_validators(validator_count: u64, slot: Slot) -> BeaconState<Minimal> {
        let mut state = interop::quick_start_beacon_state(
            &Config::minimal(),
            0,
            NonZeroU64::new(validator_count).expect("validator count is nonzero"),
        );

        state.slot = slot;
        state
    }

    #[test]
    fn committees_partition_the_active_validators_in_an_epoch() -> Result<()> {
        let state = state_with_validators(21, 8);

        let mut seen: Vec<u64> = vec![];

        for slot in 8..16 {
            let committees_per_slot =
                get_committee_count_per_slot(&state, RelativeEpoch::Current);

            for committee_index in 0..committees_per_slot {
                seen.extend(beacon_committee(&state, slot, committee_index)?);
            }
        }

        seen.sort_unstable();

        assert_eq!(seen, (0..21).collect::<Vec<_>>());

        Ok(())
    }

    #[test]
    fn equal_states_yield_equal_committees() -> Result<()> {
        let state = state_with_validators(16, 8);
        let copy = state.clone();

        assert_eq!(
            beacon_committee(&state, 9, 0)?,
            beacon_committee(&copy, 9, 0)?,
        );

        Ok(())
    }

    #[test]
    fn committee_index_past_the_count_is_rejected() {
        let state = state_with_validators(16, 8);
        let committees_per_slot = get_committee_count_per_slot(&state, RelativeEpoch::Current);

        assert!(beacon_committee(&state, 9, committees_per_slot).is_err());
    }

    #[test]
    fn seeds_depend_on_the_lookahead_mix() {
        let state = state_with_validators(4, 8);
        let mut diverged = state.clone();

        let domain_type = types::phase0::consts::DOMAIN_BEACON_ATTESTER;

        // Divergence in the mix the lookahead window ends on changes the seed.
        let mix_index = (1 + Minimal::EPOCHS_PER_HISTORICAL_VECTOR.get()
            - Minimal::MIN_SEED_LOOKAHEAD
            - 1)
            % Minimal::EPOCHS_PER_HISTORICAL_VECTOR.get();
        diverged.randao_mixes[usize::try_from(mix_index).expect("index fits in usize")] =
            H256::repeat_byte(0xff);

        assert_ne!(
            get_seed(&state, 1, domain_type),
            get_seed(&diverged, 1, domain_type),
        );
    }

    #[test]
    fn previous_epoch_saturates_at_genesis() {
        let state = state_with_validators(4, 0);

        assert_eq!(get_previous_epoch(&state), GENESIS_EPOCH);
    }
}
