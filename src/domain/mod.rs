//! Core domain types shared by the store, the services and the HTTP layer.

mod budget;
mod category;
mod currency;
mod expense;

pub use budget::Budget;
pub use category::{Category, UnknownCategory};
pub use currency::{Currency, UnknownCurrency};
pub use expense::{Expense, ExpenseLine, ExpensePatch};
