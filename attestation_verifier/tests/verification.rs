use core::num::NonZeroU64;
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
};

use anyhow::Result;
use attestation_verifier::{
    AttestationVerifier, Error, ForkChoiceOracle, PreStateSource, StoreAncestry,
};
use clock::UnixClock;
use factory::ChainBuilder;
use state_store::{InMemoryStore, StateStorage};
use tokio_util::sync::CancellationToken;
use transition_functions::phase0::slot_processing;
use types::{
    config::Config,
    phase0::{
        beacon_state::BeaconState,
        containers::{Attestation, AttestationData, Checkpoint, SignedBeaconBlock},
        primitives::{Slot, UnixSeconds, H256},
    },
    preset::Minimal,
};

const VALIDATOR_COUNT: u64 = 32;

type Verifier<S, O> = AttestationVerifier<Minimal, S, O>;

struct FixedClock(UnixSeconds);

impl UnixClock for FixedClock {
    fn now_seconds(&self) -> Result<UnixSeconds> {
        Ok(self.0)
    }
}

/// Counts writes so tests can observe how often state generation ran.
struct CountingStore {
    inner: Arc<InMemoryStore<Minimal>>,
    state_writes: AtomicUsize,
}

impl CountingStore {
    fn new(inner: Arc<InMemoryStore<Minimal>>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            state_writes: AtomicUsize::new(0),
        })
    }

    fn state_writes(&self) -> usize {
        self.state_writes.load(Ordering::SeqCst)
    }
}

impl StateStorage<Minimal> for CountingStore {
    fn has_state(&self, block_root: H256) -> Result<bool> {
        self.inner.has_state(block_root)
    }

    fn state(&self, block_root: H256) -> Result<Option<Arc<BeaconState<Minimal>>>> {
        self.inner.state(block_root)
    }

    fn block(&self, block_root: H256) -> Result<Option<Arc<SignedBeaconBlock>>> {
        self.inner.block(block_root)
    }

    fn put_state(&self, block_root: H256, state: Arc<BeaconState<Minimal>>) -> Result<()> {
        self.state_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.put_state(block_root, state)
    }

    fn put_block(&self, block_root: H256, block: Arc<SignedBeaconBlock>) -> Result<()> {
        self.inner.put_block(block_root, block)
    }
}

struct PinnedAncestor(H256);

impl ForkChoiceOracle<Minimal> for PinnedAncestor {
    fn ancestor(&self, _root: H256, _slot: Slot) -> Result<Option<H256>> {
        Ok(Some(self.0))
    }
}

struct WithHead<O> {
    inner: O,
    head_root: H256,
    head_state: Arc<BeaconState<Minimal>>,
}

impl<O: ForkChoiceOracle<Minimal>> ForkChoiceOracle<Minimal> for WithHead<O> {
    fn ancestor(&self, root: H256, slot: Slot) -> Result<Option<H256>> {
        self.inner.ancestor(root, slot)
    }

    fn head(&self) -> Result<Option<(H256, Arc<BeaconState<Minimal>>)>> {
        Ok(Some((self.head_root, self.head_state.clone())))
    }
}

fn builder() -> Result<ChainBuilder<Minimal>> {
    ChainBuilder::new(
        Config::minimal(),
        NonZeroU64::new(VALIDATOR_COUNT).expect("validator count is nonzero"),
        0,
    )
}

fn seconds_at_slot(slot: Slot) -> UnixSeconds {
    slot * Config::minimal().seconds_per_slot.get()
}

fn verifier_over<S: StateStorage<Minimal>>(
    store: Arc<S>,
    source: PreStateSource,
) -> Verifier<S, StoreAncestry<Minimal, S>> {
    let ancestry = StoreAncestry::new(store.clone());

    AttestationVerifier::new(
        Arc::new(Config::minimal()),
        store,
        ancestry,
        Box::new(FixedClock(0)),
        0,
        source,
    )
}

fn advance(state: Arc<BeaconState<Minimal>>, slot: Slot) -> Result<Arc<BeaconState<Minimal>>> {
    slot_processing::advance_to_slot(state, slot)
}

/// Signs `signed_data` but claims `claimed_data`, producing an attestation
/// whose signature decodes fine yet fails verification.
fn attestation_with_mismatched_signature(
    config: &Config,
    pre_state: &BeaconState<Minimal>,
    claimed_data: AttestationData,
) -> Result<Attestation> {
    let mut signed_data = claimed_data;
    signed_data.source = Checkpoint {
        epoch: 0,
        root: H256::repeat_byte(0x77),
    };

    let attestation = factory::aggregate_attestation(config, pre_state, signed_data)?;

    Ok(Attestation {
        data: claimed_data,
        ..attestation
    })
}

#[test]
fn pre_states_are_resolved_once_and_cached() -> Result<()> {
    let mut builder = builder()?;

    let target_root = builder.add_block(5, false)?;
    let state_at_target = builder.head_state();
    let head_root = builder.add_block(9, false)?;

    let store = CountingStore::new(builder.store());
    let verifier = verifier_over(store.clone(), PreStateSource::Replayed);

    let pre_state = advance(state_at_target, 8)?;

    let data = AttestationData {
        slot: 9,
        index: 0,
        beacon_block_root: head_root,
        source: Checkpoint::default(),
        target: Checkpoint {
            epoch: 1,
            root: target_root,
        },
    };

    let attestation = factory::aggregate_attestation(builder.config(), &pre_state, data)?;

    let token = CancellationToken::new();
    let now = seconds_at_slot(9);

    let indexed = verifier.verify(&attestation, now, &token).map_err(anyhow::Error::new)?;

    assert!(!indexed.attesting_indices.is_empty());
    assert!(indexed
        .attesting_indices
        .windows(2)
        .all(|pair| pair[0] < pair[1]));
    assert_eq!(verifier.checkpoint_states().len(), 1);

    let writes_after_first = store.state_writes();

    let again = verifier.verify(&attestation, now, &token).map_err(anyhow::Error::new)?;

    assert_eq!(again, indexed);
    assert_eq!(store.state_writes(), writes_after_first);
    assert_eq!(verifier.checkpoint_states().len(), 1);

    Ok(())
}

#[test]
fn targets_outside_the_previous_and_current_epochs_are_rejected() -> Result<()> {
    let mut builder = builder()?;
    let target_root = builder.add_block(5, true)?;

    let verifier = verifier_over(builder.store(), PreStateSource::Replayed);

    let data = AttestationData {
        slot: 17,
        index: 0,
        beacon_block_root: target_root,
        source: Checkpoint::default(),
        target: Checkpoint {
            epoch: 2,
            root: target_root,
        },
    };

    let attestation = Attestation {
        data,
        ..Attestation::default()
    };

    let result = verifier.verify(&attestation, seconds_at_slot(40), &CancellationToken::new());

    assert!(matches!(
        result,
        Err(Error::TargetEpochOutOfRange {
            target_epoch: 2,
            current_epoch: 5,
            previous_epoch: 4,
        }),
    ));

    Ok(())
}

#[test]
fn the_previous_epoch_is_clamped_near_genesis() -> Result<()> {
    let builder = builder()?;
    let verifier = verifier_over(builder.store(), PreStateSource::Replayed);
    let token = CancellationToken::new();

    let attestation_targeting = |epoch| Attestation {
        data: AttestationData {
            slot: 0,
            index: 0,
            beacon_block_root: H256::repeat_byte(0xab),
            source: Checkpoint::default(),
            target: Checkpoint {
                epoch,
                root: H256::repeat_byte(0xcd),
            },
        },
        ..Attestation::default()
    };

    // At epoch 0 only epoch 0 is acceptable.
    assert!(matches!(
        verifier.verify(&attestation_targeting(0), 0, &token),
        Err(Error::UnknownHeadBlock { .. }),
    ));
    assert!(matches!(
        verifier.verify(&attestation_targeting(1), 0, &token),
        Err(Error::TargetEpochOutOfRange {
            previous_epoch: 0,
            ..
        }),
    ));

    // At epoch 1 the previous epoch stays clamped to 0.
    let now = seconds_at_slot(8);

    assert!(matches!(
        verifier.verify(&attestation_targeting(0), now, &token),
        Err(Error::UnknownHeadBlock { .. }),
    ));
    assert!(matches!(
        verifier.verify(&attestation_targeting(2), now, &token),
        Err(Error::TargetEpochOutOfRange {
            current_epoch: 1,
            previous_epoch: 0,
            ..
        }),
    ));

    Ok(())
}

#[test]
fn attestations_for_blocks_from_the_future_are_rejected() -> Result<()> {
    let mut builder = builder()?;

    builder.add_block(5, false)?;
    let head_root = builder.add_block(9, false)?;

    let verifier = verifier_over(builder.store(), PreStateSource::Replayed);

    let data = AttestationData {
        slot: 7,
        index: 0,
        beacon_block_root: head_root,
        source: Checkpoint::default(),
        target: Checkpoint {
            epoch: 1,
            root: head_root,
        },
    };

    let attestation = Attestation {
        data,
        ..Attestation::default()
    };

    let result = verifier.verify(&attestation, seconds_at_slot(9), &CancellationToken::new());

    assert!(matches!(
        result,
        Err(Error::AttestationForFutureBlock {
            attestation_slot: 7,
            block_slot: 9,
        }),
    ));

    Ok(())
}

#[test]
fn inconsistent_lmd_and_ffg_votes_are_rejected() -> Result<()> {
    let mut builder = builder()?;

    let genesis_root = builder.head_root();
    let actual_ancestor = builder.add_block(5, false)?;
    let head_root = builder.add_block(9, false)?;

    let verifier = verifier_over(builder.store(), PreStateSource::Replayed);

    let data = AttestationData {
        slot: 9,
        index: 0,
        beacon_block_root: head_root,
        source: Checkpoint::default(),
        target: Checkpoint {
            epoch: 1,
            root: genesis_root,
        },
    };

    let attestation = Attestation {
        data,
        ..Attestation::default()
    };

    let result = verifier.verify(&attestation, seconds_at_slot(9), &CancellationToken::new());

    match result {
        Err(Error::LmdGhostInconsistentWithFfgTarget { ffg_root, ancestor }) => {
            assert_eq!(ffg_root, genesis_root);
            assert_eq!(ancestor, Some(actual_ancestor));
        }
        other => panic!("expected an LMD/FFG inconsistency, got {other:?}"),
    }

    Ok(())
}

#[test]
fn diverging_committee_seeds_defer_instead_of_rejecting() -> Result<()> {
    let mut builder = builder()?;

    let genesis_root = builder.head_root();
    let fork_a_block = builder.add_block(1, true)?;
    let fork_a_state = builder.head_state();

    builder.checkout(genesis_root)?;
    builder.add_block(2, true)?;
    let fork_b_head = builder.add_block(17, true)?;

    let store = builder.store();

    let ancestry = PinnedAncestor(fork_a_block);
    let verifier = AttestationVerifier::new(
        Arc::new(Config::minimal()),
        store,
        ancestry,
        Box::new(FixedClock(0)),
        0,
        PreStateSource::Replayed,
    );

    let pre_state = advance(fork_a_state, 16)?;

    let data = AttestationData {
        slot: 17,
        index: 0,
        beacon_block_root: fork_b_head,
        source: Checkpoint::default(),
        target: Checkpoint {
            epoch: 2,
            root: fork_a_block,
        },
    };

    let attestation = attestation_with_mismatched_signature(builder.config(), &pre_state, data)?;

    let result = verifier.verify(&attestation, seconds_at_slot(17), &CancellationToken::new());

    match result {
        Err(Error::SeedMismatch {
            orig_seed,
            head_seed,
        }) => assert_ne!(orig_seed, head_seed),
        other => panic!("expected a seed mismatch, got {other:?}"),
    }

    Ok(())
}

#[test]
fn invalid_signatures_with_agreeing_seeds_are_rejected() -> Result<()> {
    let mut builder = builder()?;

    let target_root = builder.add_block(1, true)?;
    let state_at_target = builder.head_state();
    let head_root = builder.add_block(17, true)?;

    let verifier = verifier_over(builder.store(), PreStateSource::Replayed);

    let pre_state = advance(state_at_target, 16)?;

    let data = AttestationData {
        slot: 17,
        index: 0,
        beacon_block_root: head_root,
        source: Checkpoint::default(),
        target: Checkpoint {
            epoch: 2,
            root: target_root,
        },
    };

    let attestation = attestation_with_mismatched_signature(builder.config(), &pre_state, data)?;

    let result = verifier.verify(&attestation, seconds_at_slot(17), &CancellationToken::new());

    assert!(matches!(result, Err(Error::InvalidSignature { .. })));

    Ok(())
}

#[test]
fn concurrent_duplicates_generate_the_state_at_most_once() -> Result<()> {
    let mut builder = builder()?;

    let target_root = builder.add_block(5, false)?;
    let state_at_target = builder.head_state();
    let head_root = builder.add_block(9, false)?;

    let store = CountingStore::new(builder.store());
    let verifier = verifier_over(store.clone(), PreStateSource::Replayed);

    let pre_state = advance(state_at_target, 8)?;

    let data = AttestationData {
        slot: 9,
        index: 0,
        beacon_block_root: head_root,
        source: Checkpoint::default(),
        target: Checkpoint {
            epoch: 1,
            root: target_root,
        },
    };

    let attestation = factory::aggregate_attestation(builder.config(), &pre_state, data)?;

    let writes_before = store.state_writes();
    let now = seconds_at_slot(9);

    thread::scope(|scope| {
        for _ in 0..32 {
            let verifier = &verifier;
            let attestation = &attestation;

            scope.spawn(move || {
                let token = CancellationToken::new();

                verifier
                    .verify(attestation, now, &token)
                    .expect("the attestation is valid");
            });
        }
    });

    // Replaying the target's state persists it exactly once.
    assert_eq!(store.state_writes(), writes_before + 1);
    assert_eq!(verifier.checkpoint_states().len(), 1);

    Ok(())
}

#[test]
fn cancelled_verifications_leave_no_cache_side_effects() -> Result<()> {
    let mut builder = builder()?;

    let target_root = builder.add_block(5, false)?;
    let state_at_target = builder.head_state();
    let head_root = builder.add_block(9, false)?;

    let verifier = verifier_over(builder.store(), PreStateSource::Replayed);

    let pre_state = advance(state_at_target, 8)?;

    let data = AttestationData {
        slot: 9,
        index: 0,
        beacon_block_root: head_root,
        source: Checkpoint::default(),
        target: Checkpoint {
            epoch: 1,
            root: target_root,
        },
    };

    let attestation = factory::aggregate_attestation(builder.config(), &pre_state, data)?;

    let token = CancellationToken::new();
    token.cancel();

    let result = verifier.verify(&attestation, seconds_at_slot(9), &token);

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(verifier.checkpoint_states().is_empty());

    Ok(())
}

#[test]
fn buffered_blocks_are_flushed_when_the_target_state_is_missing() -> Result<()> {
    let sparse_builder = builder()?;

    // An identically configured chain provides the blocks the sparse store
    // has not persisted yet.
    let mut full_builder = builder()?;
    let buffered_root = full_builder.add_block(1, false)?;
    let target_root = full_builder.add_block(2, false)?;
    let state_at_target = full_builder.head_state();

    let store = sparse_builder.store();

    let buffered_block = full_builder
        .store()
        .block(buffered_root)?
        .expect("the block was added above");
    let target_block = full_builder
        .store()
        .block(target_root)?
        .expect("the block was added above");

    store.put_block(target_root, target_block)?;

    let verifier = verifier_over(store.clone(), PreStateSource::Replayed);
    verifier.init_sync_buffer().push(buffered_block);

    let pre_state = advance(state_at_target, 8)?;

    let data = AttestationData {
        slot: 9,
        index: 0,
        beacon_block_root: target_root,
        source: Checkpoint::default(),
        target: Checkpoint {
            epoch: 1,
            root: target_root,
        },
    };

    let attestation = factory::aggregate_attestation(sparse_builder.config(), &pre_state, data)?;

    verifier
        .verify(&attestation, seconds_at_slot(9), &CancellationToken::new())
        .map_err(anyhow::Error::new)?;

    assert!(verifier.init_sync_buffer().is_empty());
    assert!(store.block(buffered_root)?.is_some());

    Ok(())
}

#[test]
fn the_head_state_serves_its_own_checkpoint_when_enabled() -> Result<()> {
    let mut builder = builder()?;

    let head_root = builder.add_block(8, false)?;
    let head_state = builder.head_state();

    let store = builder.store();

    let data = AttestationData {
        slot: 8,
        index: 0,
        beacon_block_root: head_root,
        source: Checkpoint::default(),
        target: Checkpoint {
            epoch: 1,
            root: head_root,
        },
    };

    let attestation = factory::aggregate_attestation(builder.config(), &head_state, data)?;

    let now = seconds_at_slot(8);

    let with_head = |check_head_state| {
        AttestationVerifier::new(
            Arc::new(Config::minimal()),
            store.clone(),
            WithHead {
                inner: StoreAncestry::new(store.clone()),
                head_root,
                head_state: head_state.clone(),
            },
            Box::new(FixedClock(now)),
            0,
            PreStateSource::Persisted { check_head_state },
        )
    };

    let result = with_head(true).verify(&attestation, now, &CancellationToken::new());
    assert!(result.is_ok(), "the head state satisfies the checkpoint: {result:?}");

    // Without the shortcut the unpersisted state cannot be found.
    let result = with_head(false).verify(&attestation, now, &CancellationToken::new());
    assert!(matches!(result, Err(Error::StateUnavailable { .. })));

    Ok(())
}

#[test]
fn batches_verify_together_and_fall_back_individually() -> Result<()> {
    let mut builder = builder()?;

    let target_root = builder.add_block(5, false)?;
    let state_at_target = builder.head_state();
    let head_root = builder.add_block(9, false)?;

    let verifier = verifier_over(builder.store(), PreStateSource::Replayed);

    let pre_state = advance(state_at_target, 8)?;

    let target = Checkpoint {
        epoch: 1,
        root: target_root,
    };

    let data_at_slot = |slot, beacon_block_root| AttestationData {
        slot,
        index: 0,
        beacon_block_root,
        source: Checkpoint::default(),
        target,
    };

    let config = builder.config();

    let valid_a = factory::aggregate_attestation(config, &pre_state, data_at_slot(9, head_root))?;
    let valid_b =
        factory::aggregate_attestation(config, &pre_state, data_at_slot(10, target_root))?;
    let invalid = attestation_with_mismatched_signature(
        config,
        &pre_state,
        data_at_slot(11, target_root),
    )?;

    let token = CancellationToken::new();
    let now = seconds_at_slot(11);

    let results = verifier.verify_batch(
        &[valid_a.clone(), valid_b.clone(), invalid],
        now,
        &token,
    );

    assert!(results[0].is_ok(), "{results:?}");
    assert!(results[1].is_ok(), "{results:?}");
    assert!(matches!(results[2], Err(Error::InvalidSignature { .. })));

    // With every signature valid the batch passes in one pass.
    let results = verifier.verify_batch(&[valid_a, valid_b], now, &token);

    assert!(results.iter().all(Result::is_ok), "{results:?}");

    Ok(())
}

#[test]
fn preloading_a_checkpoint_is_idempotent() -> Result<()> {
    let mut builder = builder()?;

    let target_root = builder.add_block(5, false)?;
    builder.add_block(9, false)?;

    let store = CountingStore::new(builder.store());
    let verifier = verifier_over(store.clone(), PreStateSource::Replayed);

    let checkpoint = Checkpoint {
        epoch: 1,
        root: target_root,
    };

    let token = CancellationToken::new();
    let writes_before = store.state_writes();

    verifier
        .preload_checkpoint(checkpoint, &token)
        .map_err(anyhow::Error::new)?;
    verifier
        .preload_checkpoint(checkpoint, &token)
        .map_err(anyhow::Error::new)?;

    assert_eq!(store.state_writes(), writes_before + 1);
    assert_eq!(verifier.checkpoint_states().len(), 1);

    Ok(())
}

#[test]
fn verification_can_use_the_host_clock() -> Result<()> {
    let mut builder = builder()?;

    let target_root = builder.add_block(5, false)?;
    let state_at_target = builder.head_state();
    let head_root = builder.add_block(9, false)?;

    let store = builder.store();
    let ancestry = StoreAncestry::new(store.clone());

    let verifier: Verifier<_, _> = AttestationVerifier::new(
        Arc::new(Config::minimal()),
        store,
        ancestry,
        Box::new(FixedClock(seconds_at_slot(9))),
        0,
        PreStateSource::Replayed,
    );

    let pre_state = advance(state_at_target, 8)?;

    let data = AttestationData {
        slot: 9,
        index: 0,
        beacon_block_root: head_root,
        source: Checkpoint::default(),
        target: Checkpoint {
            epoch: 1,
            root: target_root,
        },
    };

    let attestation = factory::aggregate_attestation(builder.config(), &pre_state, data)?;

    let indexed = verifier
        .verify_at_current_time(&attestation, &CancellationToken::new())
        .map_err(anyhow::Error::new)?;

    assert!(!indexed.attesting_indices.is_empty());

    Ok(())
}
