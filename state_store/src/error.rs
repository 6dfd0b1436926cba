use thiserror::Error;
use types::phase0::primitives::H256;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("bytes stored under {root:?} fail integrity checks")]
    Corrupt { root: H256 },
    #[error("no value is stored under {root:?}")]
    NotFound { root: H256 },
}
