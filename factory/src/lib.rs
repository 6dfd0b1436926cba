//! Deterministic chains and attestations for tests.

use core::num::NonZeroU64;
use std::sync::Arc;

use anyhow::Result;
use bls::AggregateSignature;
use helper_functions::{accessors, signing::SignForSingleFork as _};
use ssz::{BitList, SszHash as _};
use state_store::{InMemoryStore, StateStorage as _};
use std_ext::ArcExt as _;
use transition_functions::phase0::{block_processing, slot_processing};
use types::{
    config::Config,
    phase0::{
        beacon_state::BeaconState,
        containers::{
            Attestation, AttestationData, BeaconBlock, BeaconBlockBody, BeaconBlockHeader,
            SignedBeaconBlock,
        },
        primitives::{Slot, UnixSeconds, H256},
    },
    preset::Preset,
};

/// Grows a block tree on top of a quick-start genesis, persisting blocks and
/// selected states into an in-memory store.
pub struct ChainBuilder<P: Preset> {
    config: Config,
    store: Arc<InMemoryStore<P>>,
    head_root: H256,
    head_state: Arc<BeaconState<P>>,
}

impl<P: Preset> ChainBuilder<P> {
    pub fn new(config: Config, validator_count: NonZeroU64, genesis_time: UnixSeconds) -> Result<Self> {
        let mut state = interop::quick_start_beacon_state::<P>(&config, genesis_time, validator_count);

        state.latest_block_header = BeaconBlockHeader {
            body_root: BeaconBlockBody::default().hash_tree_root(),
            ..BeaconBlockHeader::default()
        };

        let head_root = accessors::latest_block_root(&state);
        let head_state = Arc::new(state);

        let store = Arc::new(InMemoryStore::new());
        store.put_state(head_root, head_state.clone_arc())?;

        Ok(Self {
            config,
            store,
            head_root,
            head_state,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> Arc<InMemoryStore<P>> {
        self.store.clone_arc()
    }

    #[must_use]
    pub const fn head_root(&self) -> H256 {
        self.head_root
    }

    #[must_use]
    pub fn head_state(&self) -> Arc<BeaconState<P>> {
        self.head_state.clone_arc()
    }

    /// Extends the chain with an empty block at `slot` and stores the block.
    ///
    /// The post-state is only persisted when `store_state` is set, leaving
    /// gaps for state replay to fill in.
    pub fn add_block(&mut self, slot: Slot, store_state: bool) -> Result<H256> {
        let mut state = (*self.head_state).clone();

        slot_processing::process_slots(&mut state, slot)?;

        let mut block = BeaconBlock {
            slot,
            proposer_index: 0,
            parent_root: self.head_root,
            state_root: H256::zero(),
            body: BeaconBlockBody {
                // Varied so sibling forks end up with different RANDAO mixes.
                randao_reveal: interop::secret_key(slot)
                    .sign(self.head_root)
                    .into(),
                graffiti: H256::zero(),
            },
        };

        block_processing::process_block(&mut state, &block)?;

        block.state_root = state.hash_tree_root();

        let block_root = block.hash_tree_root();

        self.store.put_block(
            block_root,
            Arc::new(SignedBeaconBlock {
                message: block,
                signature: Default::default(),
            }),
        )?;

        self.head_state = Arc::new(state);
        self.head_root = block_root;

        if store_state {
            self.store
                .put_state(block_root, self.head_state.clone_arc())?;
        }

        Ok(block_root)
    }

    /// Moves the head back to a block whose state is stored, so a sibling
    /// fork can be built on top of it.
    pub fn checkout(&mut self, block_root: H256) -> Result<()> {
        let state = self
            .store
            .state(block_root)?
            .ok_or_else(|| anyhow::anyhow!("no state is stored for {block_root:?}"))?;

        self.head_root = block_root;
        self.head_state = state;

        Ok(())
    }
}

/// Builds an aggregate attestation signed by every committee member for
/// `(data.slot, data.index)` as derived from `pre_state`.
pub fn aggregate_attestation<P: Preset>(
    config: &Config,
    pre_state: &BeaconState<P>,
    data: AttestationData,
) -> Result<Attestation> {
    let committee = accessors::beacon_committee(pre_state, data.slot, data.index)?.to_vec();
    let signing_root = data.signing_root(config, pre_state);

    let mut signature: Option<AggregateSignature> = None;

    for validator_index in committee.iter().copied() {
        let partial = interop::secret_key(validator_index).sign(signing_root);

        match signature.as_mut() {
            Some(aggregate) => aggregate.aggregate_in_place(partial),
            None => signature = Some(partial),
        }
    }

    let mut aggregation_bits = BitList::with_length(committee.len());

    for position in 0..committee.len() {
        aggregation_bits.set(position, true);
    }

    Ok(Attestation {
        aggregation_bits,
        data,
        signature: match signature {
            Some(signature) => signature.into(),
            None => Default::default(),
        },
    })
}
