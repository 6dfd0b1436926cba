use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("public key bytes do not encode a valid point")]
    InvalidPublicKey,
    #[error("secret key bytes do not encode a valid scalar")]
    InvalidSecretKey,
    #[error("signature bytes do not encode a valid point")]
    InvalidSignature,
}
