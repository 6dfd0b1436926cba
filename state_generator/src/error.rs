use thiserror::Error;
use types::phase0::primitives::H256;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("state generation was cancelled")]
    Cancelled,
    #[error("no block or state is stored for {root:?}")]
    MissingAncestor { root: H256 },
}
