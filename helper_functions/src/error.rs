use parse_display::Display;
use thiserror::Error;
use types::phase0::primitives::ValidatorIndex;

#[derive(Debug, Error)]
pub enum Error {
    #[error("attestation has no attesting indices")]
    AttestationHasNoAttestingIndices,
    #[error("attesting indices are not sorted and unique")]
    AttestingIndicesNotSortedAndUnique,
    #[error("attestation has more attesting indices than the committee maximum")]
    AttestingIndicesTooMany,
    #[error("committee index is out of bounds")]
    CommitteeIndexOutOfBounds,
    #[error("aggregation bitlist length {aggregation_bitlist_length} does not match committee length {committee_length}")]
    CommitteeLengthMismatch {
        aggregation_bitlist_length: usize,
        committee_length: usize,
    },
    #[error("epoch is after next one relative to state")]
    EpochAfterNext,
    #[error("epoch is before previous one relative to state")]
    EpochBeforePrevious,
    #[error("{0} is invalid")]
    SignatureInvalid(SignatureKind),
    #[error("validator index {index} is out of bounds")]
    ValidatorIndexOutOfBounds { index: ValidatorIndex },
    #[error("validator {index} is not active in the attestation epoch")]
    ValidatorNotActive { index: ValidatorIndex },
}

#[derive(Debug, Display)]
pub enum SignatureKind {
    #[display("attestation signature")]
    Attestation,
    #[display("collection of multiple signatures")]
    Multi,
}
