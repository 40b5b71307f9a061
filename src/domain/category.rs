//! Expense categories.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Closed set of spending categories.
///
/// Parsing is case-insensitive so `"Accommodation"` and `"accommodation"` are
/// the same category; misspellings such as `"accomodation"` are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Accommodation,
    Education,
    Electricity,
    Entertainment,
    Food,
    Groceries,
    Healthcare,
    Other,
    Shopping,
    Transportation,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Accommodation,
        Category::Education,
        Category::Electricity,
        Category::Entertainment,
        Category::Food,
        Category::Groceries,
        Category::Healthcare,
        Category::Other,
        Category::Shopping,
        Category::Transportation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Accommodation => "accommodation",
            Category::Education => "education",
            Category::Electricity => "electricity",
            Category::Entertainment => "entertainment",
            Category::Food => "food",
            Category::Groceries => "groceries",
            Category::Healthcare => "healthcare",
            Category::Other => "other",
            Category::Shopping => "shopping",
            Category::Transportation => "transportation",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == needle)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}
