use std::time::SystemTime;

use anyhow::Result;
use helper_functions::misc;
use types::{
    config::Config,
    phase0::primitives::{Epoch, Slot, UnixSeconds},
    preset::Preset,
};

/// The host's wall clock.
///
/// Consensus time is genesis-relative, so the only requirement is that the
/// clock tracks Unix time and is adjusted at startup at the latest.
pub trait UnixClock: Send + Sync {
    fn now_seconds(&self) -> Result<UnixSeconds>;
}

pub struct SystemClock;

impl UnixClock for SystemClock {
    fn now_seconds(&self) -> Result<UnixSeconds> {
        let since_epoch = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH)?;
        Ok(since_epoch.as_secs())
    }
}

/// The consensus slot in progress at `now`, saturating to the genesis slot
/// for times before genesis.
#[must_use]
pub fn slot_at_time(config: &Config, genesis_time: UnixSeconds, now: UnixSeconds) -> Slot {
    now.saturating_sub(genesis_time) / config.seconds_per_slot
}

#[must_use]
pub fn epoch_at_time<P: Preset>(
    config: &Config,
    genesis_time: UnixSeconds,
    now: UnixSeconds,
) -> Epoch {
    misc::compute_epoch_at_slot::<P>(slot_at_time(config, genesis_time, now))
}

#[cfg(test)]
mod tests {
    use types::preset::Mainnet;

    use super::*;

    #[test]
    fn slots_count_up_from_genesis() {
        let config = Config::mainnet();

        assert_eq!(slot_at_time(&config, 100, 99), 0);
        assert_eq!(slot_at_time(&config, 100, 100), 0);
        assert_eq!(slot_at_time(&config, 100, 111), 0);
        assert_eq!(slot_at_time(&config, 100, 112), 1);
        assert_eq!(slot_at_time(&config, 0, 12 * 64), 64);
    }

    #[test]
    fn epochs_follow_slots() {
        let config = Config::mainnet();

        assert_eq!(epoch_at_time::<Mainnet>(&config, 0, 0), 0);
        assert_eq!(epoch_at_time::<Mainnet>(&config, 0, 12 * 64), 2);
    }
}
