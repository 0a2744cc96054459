//! Core domain types: outcomes, categories, and the rolling history.

pub mod history;
pub mod outcome;

pub use history::{HistoryBuffer, DEFAULT_CAPACITY};
pub use outcome::{Category, Outcome, OutcomeId, PRIMARY_ROLLS, SECONDARY_ROLLS};
