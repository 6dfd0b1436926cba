use std::sync::Arc;

use anyhow::{bail, ensure, Result as AnyhowResult};
use clock::UnixClock;
use features::Feature;
use helper_functions::{
    accessors,
    error::Error as HelperError,
    misc,
    phase0::get_indexed_attestation,
    predicates,
    verifier::{MultiVerifier, SingleVerifier, Verifier as _},
};
use log::warn;
use state_cache::CheckpointStateCache;
use state_generator::{Error as GeneratorError, StateGenerator};
use state_store::{Error as StoreError, StateStorage};
use tokio_util::sync::CancellationToken;
use transition_functions::phase0::slot_processing;
use types::{
    config::Config,
    phase0::{
        beacon_state::BeaconState,
        consts::{DOMAIN_BEACON_ATTESTER, GENESIS_EPOCH},
        containers::{Attestation, AttestationData, Checkpoint, IndexedAttestation},
        primitives::{UnixSeconds, H256},
    },
    preset::Preset,
};

use crate::{error::Error, init_sync_buffer::InitialSyncBuffer, oracle::ForkChoiceOracle};

/// Selects where checkpoint base states come from.
///
/// The selection is made once at construction. [`PreStateSource::from_features`]
/// derives it from the global feature toggles.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PreStateSource {
    /// Reconstruct missing states by replaying blocks.
    Replayed,
    /// Read persisted states directly, optionally serving the current head's
    /// checkpoint from the head state.
    Persisted { check_head_state: bool },
}

impl PreStateSource {
    #[must_use]
    pub fn from_features() -> Self {
        if Feature::NewStateManagement.is_enabled() {
            Self::Replayed
        } else {
            Self::Persisted {
                check_head_state: Feature::CheckHeadState.is_enabled(),
            }
        }
    }
}

/// Validates attestations against the pre-state of their target checkpoint.
pub struct AttestationVerifier<P: Preset, S, O> {
    config: Arc<Config>,
    state_generator: StateGenerator<P, S>,
    checkpoint_states: CheckpointStateCache<P>,
    init_sync_buffer: InitialSyncBuffer,
    oracle: O,
    clock: Box<dyn UnixClock>,
    genesis_time: UnixSeconds,
    pre_state_source: PreStateSource,
}

impl<P: Preset, S: StateStorage<P>, O: ForkChoiceOracle<P>> AttestationVerifier<P, S, O> {
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        store: Arc<S>,
        oracle: O,
        clock: Box<dyn UnixClock>,
        genesis_time: UnixSeconds,
        pre_state_source: PreStateSource,
    ) -> Self {
        Self {
            config,
            state_generator: StateGenerator::new(store),
            checkpoint_states: CheckpointStateCache::default(),
            init_sync_buffer: InitialSyncBuffer::new(),
            oracle,
            clock,
            genesis_time,
            pre_state_source,
        }
    }

    #[must_use]
    pub const fn init_sync_buffer(&self) -> &InitialSyncBuffer {
        &self.init_sync_buffer
    }

    #[must_use]
    pub const fn checkpoint_states(&self) -> &CheckpointStateCache<P> {
        &self.checkpoint_states
    }

    /// Validates `attestation` as of `now_seconds` and returns its indexed
    /// form on success.
    pub fn verify(
        &self,
        attestation: &Attestation,
        now_seconds: UnixSeconds,
        token: &CancellationToken,
    ) -> Result<IndexedAttestation, Error> {
        let (pre_state, indexed) = self.prevalidate(attestation, now_seconds, token)?;
        self.check_signature_and_reconcile(&pre_state, attestation.data, indexed, token)
    }

    pub fn verify_at_current_time(
        &self,
        attestation: &Attestation,
        token: &CancellationToken,
    ) -> Result<IndexedAttestation, Error> {
        let now_seconds = self
            .clock
            .now_seconds()
            .map_err(|error| Error::ClockUnavailable { error })?;

        self.verify(attestation, now_seconds, token)
    }

    /// Validates a batch with one multi-signature pass.
    ///
    /// A failing batch falls back to singular verification so that one bad
    /// signature cannot reject the rest.
    pub fn verify_batch(
        &self,
        attestations: &[Attestation],
        now_seconds: UnixSeconds,
        token: &CancellationToken,
    ) -> Vec<Result<IndexedAttestation, Error>> {
        let mut results = Vec::with_capacity(attestations.len());
        results.resize_with(attestations.len(), || None);

        let mut accepted = vec![];

        for (position, attestation) in attestations.iter().enumerate() {
            match self.prevalidate(attestation, now_seconds, token) {
                Ok((pre_state, indexed)) => accepted.push((position, pre_state, indexed)),
                Err(error) => results[position] = Some(Err(error)),
            }
        }

        match self.verify_batch_signatures(&accepted) {
            Ok(()) => {
                for (position, _, indexed) in accepted {
                    results[position] = Some(Ok(indexed));
                }
            }
            Err(error) => {
                warn!(
                    "signature verification for attestation batch failed, \
                     falling back to singular verification: {error}",
                );

                for (position, pre_state, indexed) in accepted {
                    results[position] = Some(self.check_signature_and_reconcile(
                        &pre_state,
                        attestations[position].data,
                        indexed,
                        token,
                    ));
                }
            }
        }

        results
            .into_iter()
            .map(|result| result.expect("every attestation was either rejected or accepted"))
            .collect()
    }

    /// Resolves and caches the pre-state for `checkpoint` ahead of demand.
    pub fn preload_checkpoint(
        &self,
        checkpoint: Checkpoint,
        token: &CancellationToken,
    ) -> Result<(), Error> {
        self.attestation_pre_state(checkpoint, token).map(drop)
    }

    /// Steps shared by singular and batch verification: the target epoch
    /// bound, head block sanity, LMD/FFG consistency, pre-state resolution,
    /// and conversion to indexed form.
    fn prevalidate(
        &self,
        attestation: &Attestation,
        now_seconds: UnixSeconds,
        token: &CancellationToken,
    ) -> Result<(Arc<BeaconState<P>>, IndexedAttestation), Error> {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        self.verify_attestation_target_epoch(now_seconds, attestation.data.target)?;
        self.verify_beacon_block(attestation.data)?;
        self.verify_lmd_ffg_consistent(attestation.data.target, attestation.data.beacon_block_root)?;

        let pre_state = self.attestation_pre_state(attestation.data.target, token)?;

        let indexed = get_indexed_attestation(&pre_state, attestation)
            .map_err(|error| Error::MalformedAttestation { error })?;

        Ok((pre_state, indexed))
    }

    // > Validates attestation is from the current or previous epoch.
    fn verify_attestation_target_epoch(
        &self,
        now_seconds: UnixSeconds,
        target: Checkpoint,
    ) -> Result<(), Error> {
        let current_slot = clock::slot_at_time(&self.config, self.genesis_time, now_seconds);
        let current_epoch = misc::compute_epoch_at_slot::<P>(current_slot);

        // > Prevents previous epoch under flow
        let previous_epoch = if current_epoch > 1 {
            current_epoch - 1
        } else {
            GENESIS_EPOCH
        };

        if target.epoch != previous_epoch && target.epoch != current_epoch {
            return Err(Error::TargetEpochOutOfRange {
                target_epoch: target.epoch,
                current_epoch,
                previous_epoch,
            });
        }

        Ok(())
    }

    // > Verifies beacon head block is known and not from the future.
    fn verify_beacon_block(&self, data: AttestationData) -> Result<(), Error> {
        let block = self
            .state_generator
            .store()
            .block(data.beacon_block_root)
            .map_err(|error| Error::StateUnavailable {
                root: data.beacon_block_root,
                error,
            })?
            .ok_or(Error::UnknownHeadBlock {
                beacon_block_root: data.beacon_block_root,
            })?;

        // A validator cannot have voted for a head that did not exist at the
        // claimed slot.
        if block.message.slot > data.slot {
            return Err(Error::AttestationForFutureBlock {
                attestation_slot: data.slot,
                block_slot: block.message.slot,
            });
        }

        Ok(())
    }

    // > Verifies LMD GHOST and FFG votes are consistent with each other.
    fn verify_lmd_ffg_consistent(
        &self,
        target: Checkpoint,
        head_block_root: H256,
    ) -> Result<(), Error> {
        let target_start_slot = misc::compute_start_slot_at_epoch::<P>(target.epoch);

        let ancestor = self
            .oracle
            .ancestor(head_block_root, target_start_slot)
            .map_err(|error| Error::StateUnavailable {
                root: head_block_root,
                error,
            })?;

        if ancestor != Some(target.root) {
            return Err(Error::LmdGhostInconsistentWithFfgTarget {
                ffg_root: target.root,
                ancestor,
            });
        }

        Ok(())
    }

    /// Retrieves the pre-state of the attestation target, from the cache or
    /// by resolving and caching it.
    fn attestation_pre_state(
        &self,
        target: Checkpoint,
        token: &CancellationToken,
    ) -> Result<Arc<BeaconState<P>>, Error> {
        self.checkpoint_states
            .get_or_try_insert_with(target, || self.resolve_checkpoint_state(target, token))
            .map_err(|error| classify_state_error(target.root, error))
    }

    fn resolve_checkpoint_state(
        &self,
        checkpoint: Checkpoint,
        token: &CancellationToken,
    ) -> AnyhowResult<Arc<BeaconState<P>>> {
        let base_state = self.base_state_by_root(checkpoint.root, token)?;
        let target_slot = misc::compute_start_slot_at_epoch::<P>(checkpoint.epoch);

        if base_state.slot < target_slot {
            if Feature::WarnOnCheckpointStateAdvance.is_enabled() {
                Feature::WarnOnCheckpointStateAdvance.warn(format_args!(
                    "advancing the state of {:?} by {} slot(s) to the start of epoch {}",
                    checkpoint.root,
                    target_slot - base_state.slot,
                    checkpoint.epoch,
                ));
            }

            // The advanced state is a copy. Resident states are never mutated.
            return slot_processing::advance_to_slot(base_state, target_slot);
        }

        ensure!(
            base_state.slot == target_slot,
            "the state of {:?} is newer than the start of epoch {}",
            checkpoint.root,
            checkpoint.epoch,
        );

        Ok(base_state)
    }

    fn base_state_by_root(
        &self,
        block_root: H256,
        token: &CancellationToken,
    ) -> AnyhowResult<Arc<BeaconState<P>>> {
        if token.is_cancelled() {
            bail!(GeneratorError::Cancelled);
        }

        match self.pre_state_source {
            PreStateSource::Replayed => {
                if !self.state_generator.has_state(block_root)? {
                    self.init_sync_buffer
                        .drain_into(self.state_generator.store())?;
                }

                self.state_generator.state_by_block_root(block_root, token)
            }
            PreStateSource::Persisted { check_head_state } => {
                if check_head_state {
                    if let Some((head_root, head_state)) = self.oracle.head()? {
                        if head_root == block_root {
                            return Ok(head_state);
                        }
                    }
                }

                let state = self
                    .state_generator
                    .store()
                    .state(block_root)?
                    .ok_or(StoreError::NotFound { root: block_root })?;

                Ok(state)
            }
        }
    }

    fn check_signature_and_reconcile(
        &self,
        pre_state: &Arc<BeaconState<P>>,
        data: AttestationData,
        indexed: IndexedAttestation,
        token: &CancellationToken,
    ) -> Result<IndexedAttestation, Error> {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        match predicates::validate_received_indexed_attestation(
            &self.config,
            pre_state,
            &indexed,
            SingleVerifier,
        ) {
            Ok(()) => Ok(indexed),
            Err(error) => {
                let signature_failed = matches!(
                    error.downcast_ref::<HelperError>(),
                    Some(HelperError::SignatureInvalid(_)),
                );

                if signature_failed {
                    Err(self.reconcile_seed_divergence(pre_state, data, token, error))
                } else {
                    Err(Error::MalformedAttestation { error })
                }
            }
        }
    }

    // > When sig fails to verify, check if there's a difference in committees
    // > due to different seeds.
    //
    // An attestation formed on a sibling fork shuffles its committee with a
    // different seed. Such an attestation is not verifiable from this chain
    // view, but it is not demonstrably invalid either.
    fn reconcile_seed_divergence(
        &self,
        pre_state: &BeaconState<P>,
        data: AttestationData,
        token: &CancellationToken,
        original: anyhow::Error,
    ) -> Error {
        let head_state = match self.base_state_by_root(data.beacon_block_root, token) {
            Ok(state) => state,
            Err(error) => return classify_state_error(data.beacon_block_root, error),
        };

        let epoch = misc::compute_epoch_at_slot::<P>(data.slot);
        let orig_seed = accessors::get_seed(pre_state, epoch, DOMAIN_BEACON_ATTESTER);
        let head_seed = accessors::get_seed(&head_state, epoch, DOMAIN_BEACON_ATTESTER);

        if orig_seed == head_seed {
            Error::InvalidSignature { error: original }
        } else {
            Error::SeedMismatch {
                orig_seed,
                head_seed,
            }
        }
    }

    fn verify_batch_signatures(
        &self,
        accepted: &[(usize, Arc<BeaconState<P>>, IndexedAttestation)],
    ) -> AnyhowResult<()> {
        let mut verifier = MultiVerifier::default();

        verifier.reserve(accepted.len());

        for (_, pre_state, indexed) in accepted {
            predicates::validate_constructed_indexed_attestation(
                &self.config,
                pre_state,
                indexed,
                &mut verifier,
            )?;
        }

        verifier.finish()
    }
}

fn classify_state_error(root: H256, error: anyhow::Error) -> Error {
    if matches!(
        error.downcast_ref::<GeneratorError>(),
        Some(GeneratorError::Cancelled),
    ) {
        Error::Cancelled
    } else {
        Error::StateUnavailable { root, error }
    }
}
