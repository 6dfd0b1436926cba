pub use crate::{error::Error, generator::StateGenerator};

mod error;
mod generator;
