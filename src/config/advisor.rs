//! AI advisor configuration

use serde::{Deserialize, Serialize};

/// One generative model in the fallback chain, with its own retry budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    4
}

fn default_base_delay_ms() -> u64 {
    5_000
}

impl ModelConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

/// Settings for suggestion generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Generative Language API base URL
    pub base_url: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    /// Models tried in order; the next one is used only after the previous
    /// one ran out of attempts on quota or availability errors
    pub models: Vec<ModelConfig>,
    pub cache_ttl_seconds: u64,
    pub cache_max_entries: usize,
    pub timeout_seconds: u64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            models: vec![
                ModelConfig::new("gemini-1.5-flash"),
                ModelConfig::new("gemini-1.5-pro"),
            ],
            cache_ttl_seconds: 60 * 60,
            cache_max_entries: 100,
            timeout_seconds: 60,
        }
    }
}
