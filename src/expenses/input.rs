//! Raw client input and its validation.

use super::ExpenseError;
use crate::domain::{Category, Currency, ExpensePatch, UnknownCategory, UnknownCurrency};
use crate::store::{ExpenseQuery, Page};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// An amount as clients send it: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

impl AmountInput {
    fn value(&self) -> Option<f64> {
        match self {
            AmountInput::Number(n) => Some(*n),
            AmountInput::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl From<f64> for AmountInput {
    fn from(n: f64) -> Self {
        AmountInput::Number(n)
    }
}

/// Body of a create or update request. Every field is optional at this
/// layer so that missing fields produce a named validation error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseInput {
    pub amount: Option<AmountInput>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub currency: Option<String>,
    pub date: Option<String>,
}

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub amount: f64,
    pub category: Category,
    pub description: Option<String>,
    pub currency: Currency,
    pub date: Option<DateTime<Utc>>,
}

impl ExpenseInput {
    pub fn validate_new(&self) -> Result<NewExpense, ExpenseError> {
        let amount = match &self.amount {
            Some(amount) => parse_amount(amount)?,
            None => return Err(ExpenseError::validation("amount", "amount is required")),
        };
        let category = match self.category.as_deref() {
            Some(category) => parse_category(category)?,
            None => return Err(ExpenseError::validation("category", "category is required")),
        };
        let currency = match self.currency.as_deref() {
            Some(currency) => parse_currency(currency)?,
            None => Currency::default(),
        };
        let date = self
            .date
            .as_deref()
            .map(|d| parse_date("date", d, false))
            .transpose()?;

        Ok(NewExpense {
            amount,
            category,
            description: normalize_description(self.description.as_deref()),
            currency,
            date,
        })
    }

    /// Same rules as [`Self::validate_new`], applied only to present fields.
    pub fn validate_patch(&self) -> Result<ExpensePatch, ExpenseError> {
        Ok(ExpensePatch {
            amount: self.amount.as_ref().map(parse_amount).transpose()?,
            category: self.category.as_deref().map(parse_category).transpose()?,
            description: normalize_description(self.description.as_deref()),
            currency: self.currency.as_deref().map(parse_currency).transpose()?,
            date: self
                .date
                .as_deref()
                .map(|d| parse_date("date", d, false))
                .transpose()?,
        })
    }
}

/// Query string of the list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilter {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl ListFilter {
    pub fn validate(&self, user_id: &str) -> Result<(ExpenseQuery, Page), ExpenseError> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(ExpenseError::validation("page", "page starts at 1"));
        }
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(ExpenseError::validation(
                "limit",
                format!("limit must be between 1 and {}", MAX_PAGE_LIMIT),
            ));
        }

        let query = ExpenseQuery {
            user_id: user_id.to_string(),
            category: self.category.as_deref().map(parse_category).transpose()?,
            start: self
                .start_date
                .as_deref()
                .map(|d| parse_date("startDate", d, false))
                .transpose()?,
            end: self
                .end_date
                .as_deref()
                .map(|d| parse_date("endDate", d, true))
                .transpose()?,
        };
        if let (Some(start), Some(end)) = (query.start, query.end) {
            if start > end {
                return Err(ExpenseError::validation(
                    "startDate",
                    "startDate must not be after endDate",
                ));
            }
        }

        Ok((query, Page { page, limit }))
    }
}

fn parse_amount(input: &AmountInput) -> Result<f64, ExpenseError> {
    match input.value() {
        Some(amount) if amount.is_finite() && amount > 0.0 => Ok(amount),
        Some(_) => Err(ExpenseError::validation(
            "amount",
            "amount must be a positive number",
        )),
        None => Err(ExpenseError::validation("amount", "amount must be numeric")),
    }
}

fn parse_category(input: &str) -> Result<Category, ExpenseError> {
    input
        .parse()
        .map_err(|UnknownCategory(c)| ExpenseError::InvalidCategory(c))
}

fn parse_currency(input: &str) -> Result<Currency, ExpenseError> {
    input
        .parse()
        .map_err(|UnknownCurrency(c)| ExpenseError::InvalidCurrency(c))
}

fn normalize_description(input: Option<&str>) -> Option<String> {
    input
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

/// RFC 3339 timestamp or a plain `YYYY-MM-DD` date. A plain date is taken
/// as the start of the day, or its last instant when `end_of_day` is set.
fn parse_date(field: &str, input: &str, end_of_day: bool) -> Result<DateTime<Utc>, ExpenseError> {
    let input = input.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        ExpenseError::validation(field, format!("'{}' is not a valid date", input))
    })?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN)
    } else {
        NaiveTime::MIN
    };
    Ok(date.and_time(time).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(amount: Option<AmountInput>, category: Option<&str>) -> ExpenseInput {
        ExpenseInput {
            amount,
            category: category.map(str::to_string),
            ..Default::default()
        }
    }

    fn field_of(err: ExpenseError) -> String {
        match err {
            ExpenseError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_input_defaults_currency() {
        let valid = input(Some(50.0.into()), Some("Food")).validate_new().unwrap();
        assert_eq!(valid.amount, 50.0);
        assert_eq!(valid.category, Category::Food);
        assert_eq!(valid.currency, Currency::Usd);
        assert_eq!(valid.description, None);
        assert_eq!(valid.date, None);
    }

    #[test]
    fn test_numeric_string_amount_accepted() {
        let valid = input(Some(AmountInput::Text(" 12.5 ".into())), Some("food"))
            .validate_new()
            .unwrap();
        assert_eq!(valid.amount, 12.5);
    }

    #[test]
    fn test_missing_and_bad_amount() {
        let err = input(None, Some("food")).validate_new().unwrap_err();
        assert_eq!(field_of(err), "amount");
        for bad in [
            AmountInput::Number(0.0),
            AmountInput::Number(-3.0),
            AmountInput::Text("abc".into()),
            AmountInput::Text("NaN".into()),
        ] {
            let err = input(Some(bad), Some("food")).validate_new().unwrap_err();
            assert_eq!(field_of(err), "amount");
        }
    }

    #[test]
    fn test_missing_category() {
        let err = input(Some(1.0.into()), None).validate_new().unwrap_err();
        assert_eq!(field_of(err), "category");
    }

    #[test]
    fn test_unknown_category_and_currency() {
        let err = input(Some(1.0.into()), Some("utilities"))
            .validate_new()
            .unwrap_err();
        assert!(matches!(err, ExpenseError::InvalidCategory(c) if c == "utilities"));

        let mut bad_currency = input(Some(1.0.into()), Some("food"));
        bad_currency.currency = Some("XYZ".into());
        assert!(matches!(
            bad_currency.validate_new().unwrap_err(),
            ExpenseError::InvalidCurrency(_)
        ));
    }

    #[test]
    fn test_description_trimmed() {
        let mut raw = input(Some(1.0.into()), Some("food"));
        raw.description = Some("  lunch ".into());
        assert_eq!(raw.validate_new().unwrap().description.as_deref(), Some("lunch"));
        raw.description = Some("   ".into());
        assert_eq!(raw.validate_new().unwrap().description, None);
    }

    #[test]
    fn test_patch_validates_present_fields_only() {
        let patch = ExpenseInput {
            currency: Some("eur".into()),
            ..Default::default()
        }
        .validate_patch()
        .unwrap();
        assert_eq!(patch.currency, Some(Currency::Eur));
        assert_eq!(patch.amount, None);

        let err = ExpenseInput {
            amount: Some((-1.0).into()),
            ..Default::default()
        }
        .validate_patch()
        .unwrap_err();
        assert_eq!(field_of(err), "amount");
    }

    #[test]
    fn test_dates() {
        let ts = parse_date("date", "2024-03-05T10:00:00Z", false).unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-05T10:00:00+00:00");

        let start = parse_date("d", "2024-03-05", false).unwrap();
        let end = parse_date("d", "2024-03-05", true).unwrap();
        assert!(start < end);
        assert_eq!(end - start, chrono::Duration::milliseconds(86_399_999));

        assert_eq!(field_of(parse_date("date", "yesterday", false).unwrap_err()), "date");
    }

    #[test]
    fn test_list_filter_defaults_and_bounds() {
        let (query, page) = ListFilter::default().validate("u1").unwrap();
        assert_eq!(query.user_id, "u1");
        assert_eq!(page, Page { page: 1, limit: 10 });

        let err = ListFilter {
            limit: Some(500),
            ..Default::default()
        }
        .validate("u1")
        .unwrap_err();
        assert_eq!(field_of(err), "limit");

        let err = ListFilter {
            page: Some(0),
            ..Default::default()
        }
        .validate("u1")
        .unwrap_err();
        assert_eq!(field_of(err), "page");
    }

    #[test]
    fn test_list_filter_date_range() {
        let err = ListFilter {
            start_date: Some("2024-05-01".into()),
            end_date: Some("2024-04-01".into()),
            ..Default::default()
        }
        .validate("u1")
        .unwrap_err();
        assert_eq!(field_of(err), "startDate");
    }
}
