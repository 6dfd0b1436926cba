pub use crate::{
    error::Error,
    unphased::{ProcessSlots, StateRootPolicy},
};

pub mod phase0 {
    pub mod block_processing;
    pub mod slot_processing;
    pub mod state_transition;
}

mod error;
mod unphased;
