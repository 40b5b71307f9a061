//! Cache keys and prompt text.

use crate::domain::{Category, ExpenseLine};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Content-addressed key for a user's expense list.
///
/// Lines are rendered and sorted before hashing, so the key depends on the
/// multiset of `(category, amount, currency)` and not on list order.
pub fn cache_key(user_id: &str, expenses: &[ExpenseLine]) -> String {
    let mut lines: Vec<String> = expenses
        .iter()
        .map(|e| format!("{}|{}|{}", e.category, e.amount, e.currency))
        .collect();
    lines.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    for line in &lines {
        hasher.update(b"\n");
        hasher.update(line.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Round to the nearest 100 so near-equal budgets share prompts.
pub fn round_budget(budget_usd: f64) -> f64 {
    (budget_usd / 100.0).round() * 100.0
}

/// `"food: 50.00 USD, shopping: 12.50 USD"`, ordered by category name.
pub fn format_summary(totals: &BTreeMap<Category, f64>) -> String {
    totals
        .iter()
        .map(|(category, amount)| format!("{}: {:.2} USD", category, amount))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn build_prompt(rounded_budget_usd: f64, summary: &str) -> String {
    format!(
        "Analyze the following spending pattern and provide budget optimization tips \
         for a {:.0} USD monthly budget. Spending by category: {}. \
         Return exactly 3 specific, actionable suggestions in a concise bulleted list, \
         and mention each spending category by name.",
        rounded_budget_usd, summary
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Currency;

    fn line(category: Category, amount: f64, currency: Currency) -> ExpenseLine {
        ExpenseLine {
            category,
            amount,
            currency,
        }
    }

    #[test]
    fn test_key_ignores_order() {
        let a = line(Category::Food, 12.5, Currency::Usd);
        let b = line(Category::Shopping, 40.0, Currency::Eur);
        assert_eq!(cache_key("u1", &[a, b]), cache_key("u1", &[b, a]));
    }

    #[test]
    fn test_key_depends_on_user_and_content() {
        let a = line(Category::Food, 12.5, Currency::Usd);
        let b = line(Category::Food, 12.5, Currency::Eur);
        assert_ne!(cache_key("u1", &[a]), cache_key("u2", &[a]));
        assert_ne!(cache_key("u1", &[a]), cache_key("u1", &[b]));
        assert_ne!(cache_key("u1", &[a]), cache_key("u1", &[a, a]));
    }

    #[test]
    fn test_round_budget() {
        assert_eq!(round_budget(60.0), 100.0);
        assert_eq!(round_budget(49.0), 0.0);
        assert_eq!(round_budget(1234.0), 1200.0);
        assert_eq!(round_budget(1250.0), 1300.0);
    }

    #[test]
    fn test_summary_format_sorted() {
        let mut totals = BTreeMap::new();
        totals.insert(Category::Shopping, 12.5);
        totals.insert(Category::Food, 50.0);
        assert_eq!(
            format_summary(&totals),
            "food: 50.00 USD, shopping: 12.50 USD"
        );
    }

    #[test]
    fn test_prompt_mentions_budget_and_summary() {
        let prompt = build_prompt(1200.0, "food: 50.00 USD");
        assert!(prompt.contains("1200 USD monthly budget"));
        assert!(prompt.contains("food: 50.00 USD"));
        assert!(prompt.contains("exactly 3"));
    }
}
