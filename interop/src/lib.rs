use core::num::NonZeroU64;

use bls::SecretKey;
use hex_literal::hex;
use num_bigint::BigUint;
use ssz::SszHash as _;
use types::{
    config::Config,
    phase0::{
        beacon_state::BeaconState,
        consts::FAR_FUTURE_EPOCH,
        containers::{Fork, Validator},
        primitives::{Gwei, UnixSeconds, ValidatorIndex, H256},
    },
    preset::Preset,
};

/// <https://github.com/ethereum/eth2.0-pm/tree/b7c76e7a9d036ce73ca6aa0b7065db92f7728f41/interop/mocked_start#create-genesis-state>
const QUICK_START_ETH1_BLOCK_HASH: H256 = H256([0x42; 32]);

const MAX_EFFECTIVE_BALANCE: Gwei = 32_000_000_000;

/// <https://github.com/ethereum/eth2.0-pm/tree/b7c76e7a9d036ce73ca6aa0b7065db92f7728f41/interop/mocked_start#pubkeyprivkey-generation>
///
/// Encoded in binary to avoid parsing a decimal string at runtime.
const CURVE_ORDER: &[u8] =
    &hex!("73eda753299d7d483339d80809a1d80553bda402fffe5bfeffffffff00000001");

/// A genesis-like state populated with deterministically keyed validators.
///
/// All RANDAO mixes start out equal to the mocked Eth1 block hash, matching
/// the quick-start genesis rule. Deposit processing is skipped; validators are
/// appended directly with their activation already finalized.
#[must_use]
pub fn quick_start_beacon_state<P: Preset>(
    config: &Config,
    genesis_time: UnixSeconds,
    validator_count: NonZeroU64,
) -> BeaconState<P> {
    let mut state = BeaconState::<P>::default();

    state.genesis_time = genesis_time;
    state.fork = Fork {
        previous_version: config.genesis_fork_version,
        current_version: config.genesis_fork_version,
        epoch: 0,
    };

    for mix in &mut state.randao_mixes {
        *mix = QUICK_START_ETH1_BLOCK_HASH;
    }

    for index in 0..validator_count.get() {
        let public_key = secret_key(index).to_public_key();

        state.validators.push(Validator {
            pubkey: public_key.into(),
            withdrawal_credentials: H256::zero(),
            effective_balance: MAX_EFFECTIVE_BALANCE,
            slashed: false,
            activation_eligibility_epoch: 0,
            activation_epoch: 0,
            exit_epoch: FAR_FUTURE_EPOCH,
            withdrawable_epoch: FAR_FUTURE_EPOCH,
        });

        state.balances.push(MAX_EFFECTIVE_BALANCE);
    }

    state
}

/// <https://github.com/ethereum/eth2.0-pm/tree/b7c76e7a9d036ce73ca6aa0b7065db92f7728f41/interop/mocked_start#pubkeyprivkey-generation>
#[must_use]
pub fn secret_key(validator_index: ValidatorIndex) -> SecretKey {
    let index_hash = hashing::hash(validator_index.hash_tree_root());
    let curve_order = BigUint::from_bytes_be(CURVE_ORDER);
    let secret_key_uint = BigUint::from_bytes_le(index_hash.as_bytes()) % &curve_order;
    let unpadded = secret_key_uint.to_bytes_be();

    let mut padded = [0; 32];
    padded[32 - unpadded.len()..].copy_from_slice(unpadded.as_slice());

    SecretKey::from_bytes(padded)
        .expect("the algorithm given in the standard should produce valid secret keys")
}
