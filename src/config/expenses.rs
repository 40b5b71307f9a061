//! Expense workflow configuration

use serde::{Deserialize, Serialize};

pub const DEFAULT_FALLBACK_SUGGESTION: &str = "- Track expenses daily to identify savings opportunities.\n- Prioritize needs over wants to stay within budget.\n- Review subscriptions for potential cancellations.";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpensesConfig {
    /// Multiplier applied to total USD spend to derive the advice budget
    pub budget_headroom: f64,
    /// Upper bound on the advice budget, in USD
    pub budget_cap_usd: f64,
    /// A stored suggestion must be at least this old to be reused
    pub stale_suggestion_age_seconds: u64,
    /// Text attached when no usable suggestion exists
    pub fallback_suggestion: String,
}

impl Default for ExpensesConfig {
    fn default() -> Self {
        Self {
            budget_headroom: 1.2,
            budget_cap_usd: 10_000.0,
            stale_suggestion_age_seconds: 60 * 60,
            fallback_suggestion: DEFAULT_FALLBACK_SUGGESTION.to_string(),
        }
    }
}
