use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

/// Labels offered when entering an expense. Any other label is accepted too.
pub const CATEGORY_SUGGESTIONS: &[&str] = &["Food", "Travel", "Shopping", "Bills", "Other"];

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: i64,
    pub date: String,
    pub category: String,
    pub description: String,
    pub amount: f64,
}

/// A validated expense that has not been written yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub date: String,
    pub category: String,
    pub description: String,
    pub amount: f64,
}

impl NewExpense {
    /// Validate raw form input. An empty date means today.
    pub fn parse(date: &str, category: &str, description: &str, amount: &str) -> Result<Self> {
        let amount: f64 = amount
            .trim()
            .parse()
            .map_err(|_| TrackerError::InvalidInput("Amount must be a number".to_string()))?;
        if !amount.is_finite() {
            return Err(TrackerError::InvalidInput("Amount must be a finite number".to_string()));
        }

        let category = category.trim();
        if category.is_empty() {
            return Err(TrackerError::InvalidInput(format!(
                "Category is required (e.g. {})",
                CATEGORY_SUGGESTIONS.join(", ")
            )));
        }

        let date = date.trim();
        let date = if date.is_empty() {
            Local::now().date_naive().format(DATE_FORMAT).to_string()
        } else {
            NaiveDate::parse_from_str(date, DATE_FORMAT)
                .map_err(|_| TrackerError::InvalidInput(format!("Date must be YYYY-MM-DD, got '{date}'")))?
                .format(DATE_FORMAT)
                .to_string()
        };

        Ok(Self {
            date,
            category: category.to_string(),
            description: description.trim().to_string(),
            amount,
        })
    }
}

/// Sum of expense amounts for one calendar month, labelled `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub month: String,
    pub total: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_input() {
        let e = NewExpense::parse("2025-03-04", " Food ", " Lunch at cafe ", "12.50").unwrap();
        assert_eq!(e.date, "2025-03-04");
        assert_eq!(e.category, "Food");
        assert_eq!(e.description, "Lunch at cafe");
        assert_eq!(e.amount, 12.5);
    }

    #[test]
    fn test_parse_negative_amount() {
        let e = NewExpense::parse("2025-03-04", "Other", "Refund", "-20").unwrap();
        assert_eq!(e.amount, -20.0);
    }

    #[test]
    fn test_parse_empty_date_defaults_to_today() {
        let e = NewExpense::parse("", "Food", "", "1").unwrap();
        let today = Local::now().date_naive().format(DATE_FORMAT).to_string();
        assert_eq!(e.date, today);
    }

    #[test]
    fn test_parse_rejects_non_numeric_amount() {
        let err = NewExpense::parse("2025-03-04", "Food", "x", "ten").unwrap_err();
        assert!(matches!(err, TrackerError::InvalidInput(_)));
    }

    #[test]
    fn test_parse_rejects_nan() {
        assert!(NewExpense::parse("2025-03-04", "Food", "x", "NaN").is_err());
        assert!(NewExpense::parse("2025-03-04", "Food", "x", "inf").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_category() {
        let err = NewExpense::parse("2025-03-04", "  ", "x", "1").unwrap_err();
        let msg = err.to_string();
        for label in CATEGORY_SUGGESTIONS {
            assert!(msg.contains(label), "{msg}");
        }
    }

    #[test]
    fn test_parse_rejects_bad_date() {
        assert!(NewExpense::parse("04/03/2025", "Food", "x", "1").is_err());
        assert!(NewExpense::parse("2025-02-30", "Food", "x", "1").is_err());
    }
}
