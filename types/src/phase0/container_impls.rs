use ssz::{merkleize_chunks, mix_in_length, pack_u64s, SszHash};

use crate::{
    phase0::{
        beacon_state::BeaconState,
        containers::{
            AttestationData, BeaconBlock, BeaconBlockBody, BeaconBlockHeader, Checkpoint, Fork,
            ForkData, SigningData, Validator,
        },
        primitives::{Version, H256},
    },
    preset::Preset,
};

fn version_chunk(version: Version) -> H256 {
    let mut chunk = H256::zero();
    chunk[..Version::len_bytes()].copy_from_slice(version.as_bytes());
    chunk
}

impl SszHash for Checkpoint {
    fn hash_tree_root(&self) -> H256 {
        merkleize_chunks([self.epoch.hash_tree_root(), self.root], None)
    }
}

impl SszHash for AttestationData {
    fn hash_tree_root(&self) -> H256 {
        merkleize_chunks(
            [
                self.slot.hash_tree_root(),
                self.index.hash_tree_root(),
                self.beacon_block_root,
                self.source.hash_tree_root(),
                self.target.hash_tree_root(),
            ],
            None,
        )
    }
}

impl SszHash for Fork {
    fn hash_tree_root(&self) -> H256 {
        merkleize_chunks(
            [
                version_chunk(self.previous_version),
                version_chunk(self.current_version),
                self.epoch.hash_tree_root(),
            ],
            None,
        )
    }
}

impl SszHash for ForkData {
    fn hash_tree_root(&self) -> H256 {
        merkleize_chunks(
            [
                version_chunk(self.current_version),
                self.genesis_validators_root,
            ],
            None,
        )
    }
}

impl SszHash for SigningData {
    fn hash_tree_root(&self) -> H256 {
        merkleize_chunks([self.object_root, self.domain], None)
    }
}

impl SszHash for BeaconBlockHeader {
    fn hash_tree_root(&self) -> H256 {
        merkleize_chunks(
            [
                self.slot.hash_tree_root(),
                self.proposer_index.hash_tree_root(),
                self.parent_root,
                self.state_root,
                self.body_root,
            ],
            None,
        )
    }
}

impl SszHash for BeaconBlockBody {
    fn hash_tree_root(&self) -> H256 {
        merkleize_chunks(
            [self.randao_reveal.hash_tree_root(), self.graffiti],
            None,
        )
    }
}

// A block and its header merkleize identically because the header stores
// `hash_tree_root(body)` where the block stores the body itself.
impl SszHash for BeaconBlock {
    fn hash_tree_root(&self) -> H256 {
        merkleize_chunks(
            [
                self.slot.hash_tree_root(),
                self.proposer_index.hash_tree_root(),
                self.parent_root,
                self.state_root,
                self.body.hash_tree_root(),
            ],
            None,
        )
    }
}

impl SszHash for Validator {
    fn hash_tree_root(&self) -> H256 {
        merkleize_chunks(
            [
                self.pubkey.hash_tree_root(),
                self.withdrawal_credentials,
                self.effective_balance.hash_tree_root(),
                self.slashed.hash_tree_root(),
                self.activation_eligibility_epoch.hash_tree_root(),
                self.activation_epoch.hash_tree_root(),
                self.exit_epoch.hash_tree_root(),
                self.withdrawable_epoch.hash_tree_root(),
            ],
            None,
        )
    }
}

impl<P: Preset> SszHash for BeaconState<P> {
    fn hash_tree_root(&self) -> H256 {
        let validators_root = mix_in_length(
            merkleize_chunks(
                self.validators.iter().map(SszHash::hash_tree_root),
                Some(P::VALIDATOR_REGISTRY_LIMIT),
            ),
            self.validators.len() as u64,
        );

        let balances_root = mix_in_length(
            merkleize_chunks(
                pack_u64s(self.balances.iter().copied()),
                Some(P::VALIDATOR_REGISTRY_LIMIT / 4),
            ),
            self.balances.len() as u64,
        );

        merkleize_chunks(
            [
                self.genesis_time.hash_tree_root(),
                self.genesis_validators_root,
                self.slot.hash_tree_root(),
                self.fork.hash_tree_root(),
                self.latest_block_header.hash_tree_root(),
                merkleize_chunks(self.block_roots.iter().copied(), None),
                merkleize_chunks(self.state_roots.iter().copied(), None),
                validators_root,
                balances_root,
                merkleize_chunks(self.randao_mixes.iter().copied(), None),
                self.previous_justified_checkpoint.hash_tree_root(),
                self.current_justified_checkpoint.hash_tree_root(),
                self.finalized_checkpoint.hash_tree_root(),
            ],
            None,
        )
    }
}
