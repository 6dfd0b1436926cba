use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum ReadError {
    #[error("bit list has no delimiting bit")]
    BitListMissingDelimitingBit,
}
