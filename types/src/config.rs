use core::num::NonZeroU64;
use std::borrow::Cow;

use hex_literal::hex;
use nonzero_ext::nonzero;
use serde::{Deserialize, Serialize};

use crate::phase0::primitives::{Version, H32};

/// Configuration variables customizable at runtime.
///
/// See [configurations in `consensus-specs`](https://github.com/ethereum/consensus-specs/tree/master/configs).
// `Config` has no invariants. It is intended to be deserialized from user input.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Config {
    // Meta
    pub config_name: Cow<'static, str>,

    // Genesis
    pub genesis_fork_version: Version,

    // Time parameters
    pub seconds_per_slot: NonZeroU64,
}

impl Default for Config {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl Config {
    #[must_use]
    pub const fn mainnet() -> Self {
        Self {
            config_name: Cow::Borrowed("mainnet"),
            genesis_fork_version: H32(hex!("00000000")),
            seconds_per_slot: nonzero!(12_u64),
        }
    }

    #[must_use]
    pub const fn minimal() -> Self {
        Self {
            config_name: Cow::Borrowed("minimal"),
            genesis_fork_version: H32(hex!("00000001")),
            seconds_per_slot: nonzero!(6_u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configs_round_trip_through_serde() -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(&Config::minimal())?;
        let decoded = serde_json::from_str::<Config>(&json)?;

        assert_eq!(decoded.config_name, "minimal");
        assert_eq!(decoded.seconds_per_slot.get(), 6);

        Ok(())
    }

    #[test]
    fn omitted_fields_fall_back_to_mainnet_values() -> Result<(), serde_json::Error> {
        let decoded = serde_json::from_str::<Config>(r#"{"CONFIG_NAME": "devnet"}"#)?;

        assert_eq!(decoded.config_name, "devnet");
        assert_eq!(decoded.seconds_per_slot.get(), 12);

        Ok(())
    }
}
