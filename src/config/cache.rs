//! Cache maintenance configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Run the periodic purge of expired cache entries
    pub sweep_enabled: bool,
    pub sweep_interval_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sweep_enabled: true,
            sweep_interval_seconds: 300,
        }
    }
}
