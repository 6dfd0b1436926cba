use thiserror::Error;
use types::phase0::primitives::{Epoch, Slot, H256};

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "attestation votes for a block from the future \
         (attestation slot: {attestation_slot}, block slot: {block_slot})"
    )]
    AttestationForFutureBlock {
        attestation_slot: Slot,
        block_slot: Slot,
    },
    #[error("attestation verification was cancelled")]
    Cancelled,
    #[error("could not read the host clock: {error}")]
    ClockUnavailable { error: anyhow::Error },
    #[error("attestation has an invalid signature: {error}")]
    InvalidSignature { error: anyhow::Error },
    #[error(
        "LMD GHOST vote is inconsistent with FFG vote target \
         (FFG root: {ffg_root:?}, ancestor at the target's starting slot: {ancestor:?})"
    )]
    LmdGhostInconsistentWithFfgTarget {
        ffg_root: H256,
        ancestor: Option<H256>,
    },
    #[error("attestation is structurally invalid: {error}")]
    MalformedAttestation { error: anyhow::Error },
    #[error(
        "committee seeds differ between the verifier's chain and the attester's \
         (ours: {orig_seed:?}, theirs: {head_seed:?})"
    )]
    SeedMismatch { orig_seed: H256, head_seed: H256 },
    #[error("could not resolve the state for {root:?}: {error}")]
    StateUnavailable { root: H256, error: anyhow::Error },
    #[error(
        "attestation votes for a checkpoint in the wrong epoch \
         (target epoch: {target_epoch}, current epoch: {current_epoch}, \
          previous epoch: {previous_epoch})"
    )]
    TargetEpochOutOfRange {
        target_epoch: Epoch,
        current_epoch: Epoch,
        previous_epoch: Epoch,
    },
    #[error("attestation votes for an unknown head block: {beacon_block_root:?}")]
    UnknownHeadBlock { beacon_block_root: H256 },
}
