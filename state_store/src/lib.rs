pub use crate::{error::Error, in_memory::InMemoryStore, storage::StateStorage};

mod error;
mod in_memory;
mod storage;
