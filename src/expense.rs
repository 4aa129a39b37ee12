// Expense record and the fixed category set
//
// A record is created once by the store and never edited afterwards.
// Identity is the millisecond id; removal matches on it alone.

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
    #[default]
    Food,
    Travel,
    Shopping,
    Rent,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category '{0}' (expected one of Food, Travel, Shopping, Rent, Other)")]
pub struct ParseCategoryError(pub String);

impl Category {
    /// Enumeration order; the breakdown and the UI selector follow it.
    pub const ALL: [Category; 5] = [
        Category::Food,
        Category::Travel,
        Category::Shopping,
        Category::Rent,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Travel => "Travel",
            Category::Shopping => "Shopping",
            Category::Rent => "Rent",
            Category::Other => "Other",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Category::Food => 0,
            Category::Travel => 1,
            Category::Shopping => 2,
            Category::Rent => 3,
            Category::Other => 4,
        }
    }

    /// Next entry in the selector, wrapping around
    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

// ============================================================================
// EXPENSE RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Millisecond timestamp, unique within the collection
    pub id: i64,
    pub title: String,
    pub amount: f64,
    pub category: Category,
    /// Calendar date at creation, already formatted
    pub date: String,
}

/// Parse user-entered amount text.
///
/// Returns `None` for empty, non-numeric, non-finite or negative input.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Some(value),
        _ => None,
    }
}

// ============================================================================
// CLOCK
// ============================================================================

/// Source of ids and creation dates
pub trait Clock {
    fn now_millis(&self) -> i64;
    fn today(&self, format: &str) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn today(&self, format: &str) -> String {
        Local::now().format(format).to_string()
    }
}

/// Clock frozen at one instant; used by tests and demos.
#[derive(Debug, Clone)]
pub struct FixedClock {
    pub millis: i64,
    pub date: String,
}

impl FixedClock {
    pub fn new(millis: i64, date: &str) -> Self {
        Self {
            millis,
            date: date.to_string(),
        }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.millis
    }

    fn today(&self, _format: &str) -> String {
        self.date.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_str_is_case_insensitive() {
        assert_eq!("food".parse::<Category>(), Ok(Category::Food));
        assert_eq!(" RENT ".parse::<Category>(), Ok(Category::Rent));
        assert!("Groceries".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_cycle_wraps() {
        assert_eq!(Category::Other.next(), Category::Food);
        assert_eq!(Category::Food.previous(), Category::Other);
        assert_eq!(Category::default(), Category::Food);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("150"), Some(150.0));
        assert_eq!(parse_amount(" 12.5 "), Some(12.5));
        assert_eq!(parse_amount("0"), Some(0.0));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("   "), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("inf"), None);
        assert_eq!(parse_amount("-5"), None);
    }

    #[test]
    fn test_expense_json_shape() {
        let expense = Expense {
            id: 1_700_000_000_000,
            title: "Coffee".to_string(),
            amount: 150.0,
            category: Category::Food,
            date: "2026-10-14".to_string(),
        };

        let json = serde_json::to_value(&expense).unwrap();
        assert_eq!(json["category"], "Food");
        assert_eq!(json["id"], 1_700_000_000_000i64);
        assert_eq!(json["title"], "Coffee");
    }
}
