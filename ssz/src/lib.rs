pub use crate::{
    bit_list::BitList,
    error::ReadError,
    merkle::{merkleize_chunks, mix_in_length, pack_u64s, BYTES_PER_CHUNK},
    porcelain::SszHash,
};

mod bit_list;
mod error;
mod merkle;
mod porcelain;
