use core::num::NonZeroUsize;
use std::{collections::VecDeque, sync::Arc};

use anyhow::Result;
use helper_functions::misc;
use im::HashMap;
use log::debug;
use parking_lot::Mutex;
use std_ext::ArcExt as _;
use types::{
    phase0::{beacon_state::BeaconState, containers::Checkpoint},
    preset::Preset,
};

const DEFAULT_CAPACITY: NonZeroUsize = NonZeroUsize::new(32).expect("capacity is nonzero");

type EntryLock<P> = Arc<Mutex<Option<Arc<BeaconState<P>>>>>;

/// A bounded map from checkpoints to epoch-boundary states.
///
/// Entries are reserved before they are resolved. The per-entry mutex makes
/// resolution single-flight: the first caller computes the state while the
/// rest block on the entry, then read the published value. The outer mutex is
/// held only for lookups, reservations, and evictions, never for the slow
/// resolution itself.
pub struct CheckpointStateCache<P: Preset> {
    entries: Mutex<Entries<P>>,
    capacity: NonZeroUsize,
}

struct Entries<P: Preset> {
    states: HashMap<Checkpoint, EntryLock<P>>,
    insertion_order: VecDeque<Checkpoint>,
}

impl<P: Preset> Default for CheckpointStateCache<P> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<P: Preset> CheckpointStateCache<P> {
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(Entries {
                states: HashMap::new(),
                insertion_order: VecDeque::new(),
            }),
            capacity,
        }
    }

    #[must_use]
    pub fn get(&self, checkpoint: Checkpoint) -> Option<Arc<BeaconState<P>>> {
        let entry = self.entries.lock().states.get(&checkpoint)?.clone_arc();
        let state = entry.lock().as_ref().map(|state| state.clone_arc());
        state
    }

    /// Returns the state for `checkpoint`, resolving it with `resolve` on a
    /// miss.
    ///
    /// Concurrent calls for the same missing checkpoint run `resolve` at most
    /// once among them. If the resolving call fails, its reservation is
    /// discarded and the next waiter retries.
    pub fn get_or_try_insert_with(
        &self,
        checkpoint: Checkpoint,
        resolve: impl FnOnce() -> Result<Arc<BeaconState<P>>>,
    ) -> Result<Arc<BeaconState<P>>> {
        let entry = self.reserve(checkpoint);

        let mut slot_guard = entry.lock();

        if let Some(state) = slot_guard.as_ref() {
            return Ok(state.clone_arc());
        }

        match resolve() {
            Ok(state) => {
                assert_pre_state_invariant::<P>(checkpoint, &state);
                *slot_guard = Some(state.clone_arc());
                Ok(state)
            }
            Err(error) => {
                drop(slot_guard);
                self.discard_reservation(checkpoint, &entry);
                Err(error)
            }
        }
    }

    pub fn insert(&self, checkpoint: Checkpoint, state: Arc<BeaconState<P>>) {
        assert_pre_state_invariant::<P>(checkpoint, &state);

        let entry = self.reserve(checkpoint);
        *entry.lock() = Some(state);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn reserve(&self, checkpoint: Checkpoint) -> EntryLock<P> {
        let mut entries = self.entries.lock();

        if let Some(entry) = entries.states.get(&checkpoint) {
            return entry.clone_arc();
        }

        while entries.states.len() >= self.capacity.get() {
            let Some(oldest) = entries.insertion_order.pop_front() else {
                break;
            };

            debug!("evicting checkpoint state for {oldest:?}");

            entries.states.remove(&oldest);
        }

        let entry = EntryLock::<P>::default();
        entries.states.insert(checkpoint, entry.clone_arc());
        entries.insertion_order.push_back(checkpoint);

        entry
    }

    // Removes a reservation that was never published. A newer reservation
    // under the same checkpoint is left alone.
    fn discard_reservation(&self, checkpoint: Checkpoint, entry: &EntryLock<P>) {
        let mut entries = self.entries.lock();

        if let Some(current) = entries.states.get(&checkpoint) {
            if Arc::ptr_eq(current, entry) {
                entries.states.remove(&checkpoint);
                entries
                    .insertion_order
                    .retain(|ordered| *ordered != checkpoint);
            }
        }
    }
}

fn assert_pre_state_invariant<P: Preset>(checkpoint: Checkpoint, state: &BeaconState<P>) {
    assert_eq!(
        state.slot,
        misc::compute_start_slot_at_epoch::<P>(checkpoint.epoch),
        "a cached checkpoint state must sit at the checkpoint epoch's starting slot",
    );
}

#[cfg(test)]
mod tests {
    use core::num::NonZeroU64;
    use std::thread;

    use anyhow::{bail, Result};
    use types::{config::Config, phase0::primitives::H256, preset::Minimal};

    use super::*;

    fn state_at_slot(slot: u64) -> Arc<BeaconState<Minimal>> {
        let mut state = interop::quick_start_beacon_state(
            &Config::minimal(),
            0,
            NonZeroU64::new(2).expect("validator count is nonzero"),
        );

        state.slot = slot;

        Arc::new(state)
    }

    fn checkpoint(epoch: u64, byte: u8) -> Checkpoint {
        Checkpoint {
            epoch,
            root: H256::repeat_byte(byte),
        }
    }

    #[test]
    fn hits_do_not_invoke_the_resolver() -> Result<()> {
        let cache = CheckpointStateCache::default();
        let state = state_at_slot(8);

        cache.insert(checkpoint(1, 1), state.clone());

        let resolved = cache.get_or_try_insert_with(checkpoint(1, 1), || {
            bail!("the resolver must not run on a hit")
        })?;

        assert_eq!(resolved, state);
        assert_eq!(cache.get(checkpoint(1, 1)), Some(state));
        assert_eq!(cache.len(), 1);

        Ok(())
    }

    #[test]
    fn distinct_roots_in_the_same_epoch_are_distinct_entries() -> Result<()> {
        let cache = CheckpointStateCache::default();

        cache.insert(checkpoint(1, 1), state_at_slot(8));
        cache.insert(checkpoint(1, 2), state_at_slot(8));

        assert_eq!(cache.len(), 2);

        Ok(())
    }

    #[test]
    fn capacity_evicts_the_least_recently_inserted_entry() {
        let cache = CheckpointStateCache::new(
            NonZeroUsize::new(2).expect("capacity is nonzero"),
        );

        cache.insert(checkpoint(1, 1), state_at_slot(8));
        cache.insert(checkpoint(2, 2), state_at_slot(16));
        cache.insert(checkpoint(3, 3), state_at_slot(24));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(checkpoint(1, 1)), None);
        assert!(cache.get(checkpoint(2, 2)).is_some());
        assert!(cache.get(checkpoint(3, 3)).is_some());
    }

    #[test]
    fn failed_resolutions_leave_the_cache_unchanged() {
        let cache = CheckpointStateCache::<Minimal>::default();

        let result =
            cache.get_or_try_insert_with(checkpoint(1, 1), || bail!("resolution failed"));

        assert!(result.is_err());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.get(checkpoint(1, 1)), None);
    }

    #[test]
    #[should_panic(expected = "starting slot")]
    fn inserting_a_state_off_the_epoch_boundary_is_a_bug() {
        CheckpointStateCache::default().insert(checkpoint(1, 1), state_at_slot(9));
    }

    #[test]
    fn concurrent_misses_resolve_once() -> Result<()> {
        let cache = Arc::new(CheckpointStateCache::default());
        let resolutions = Arc::new(Mutex::new(0_usize));

        thread::scope(|scope| {
            for _ in 0..16 {
                let cache = cache.clone_arc();
                let resolutions = resolutions.clone_arc();

                scope.spawn(move || {
                    cache
                        .get_or_try_insert_with(checkpoint(1, 1), || {
                            *resolutions.lock() += 1;
                            Ok(state_at_slot(8))
                        })
                        .expect("resolution succeeds");
                });
            }
        });

        assert_eq!(*resolutions.lock(), 1);
        assert_eq!(cache.len(), 1);

        Ok(())
    }
}
