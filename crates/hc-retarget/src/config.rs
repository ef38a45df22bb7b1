//! Configuration types for the retargeting engine

use crate::domain::Network;
use crate::error::{Result, RetargetError};
use serde::Deserialize;

/// Runtime configuration for the retargeting engine
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetargetConfig {
    /// Network whose consensus parameters apply
    pub network: Network,

    /// Memoize ASERT reference averages (default: true)
    pub use_target_cache: bool,

    /// Key cached averages on the newest averaged block as well as the
    /// window index, so competing forks never share an entry (default: true)
    pub scope_cache_to_fork: bool,
}

impl Default for RetargetConfig {
    fn default() -> Self {
        Self {
            network: Network::Main,
            use_target_cache: true,
            scope_cache_to_fork: true,
        }
    }
}

impl RetargetConfig {
    /// Configuration for `network` with default cache settings.
    pub fn for_network(network: Network) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }

    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RetargetError::Config(e.to_string()))
    }
}
