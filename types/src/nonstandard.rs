use enum_map::Enum;

/// An epoch relative to the current epoch of some state.
///
/// Committee and seed caches are keyed by this because states only ever serve
/// lookups for the epochs adjacent to their own.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Enum)]
pub enum RelativeEpoch {
    Previous,
    Current,
    Next,
}
