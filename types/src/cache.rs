use std::sync::Arc;

use enum_map::EnumMap;
use once_cell::sync::OnceCell;

use crate::{nonstandard::RelativeEpoch, phase0::primitives::ValidatorIndex};

/// Values derived from a state that are expensive to compute and stable for
/// the lifetime of the state.
///
/// The cache is deliberately excluded from equality: two states with equal
/// fields are equal regardless of which derived values have been computed.
#[derive(Clone, Default, Debug)]
pub struct Cache {
    pub active_validator_indices_ordered: EnumMap<RelativeEpoch, OnceCell<Arc<[ValidatorIndex]>>>,
    pub active_validator_indices_shuffled: EnumMap<RelativeEpoch, OnceCell<Arc<[ValidatorIndex]>>>,
}

impl Cache {
    pub fn advance_epoch(&mut self) {
        let ordered = &mut self.active_validator_indices_ordered;
        let shuffled = &mut self.active_validator_indices_shuffled;

        ordered[RelativeEpoch::Previous] = core::mem::take(&mut ordered[RelativeEpoch::Current]);
        shuffled[RelativeEpoch::Previous] = core::mem::take(&mut shuffled[RelativeEpoch::Current]);

        ordered[RelativeEpoch::Current] = core::mem::take(&mut ordered[RelativeEpoch::Next]);
        shuffled[RelativeEpoch::Current] = core::mem::take(&mut shuffled[RelativeEpoch::Next]);
    }
}
