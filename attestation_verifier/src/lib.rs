pub use crate::{
    attestation_verifier::{AttestationVerifier, PreStateSource},
    error::Error,
    init_sync_buffer::InitialSyncBuffer,
    oracle::{ForkChoiceOracle, StoreAncestry},
};

mod attestation_verifier;
mod error;
mod init_sync_buffer;
mod oracle;
