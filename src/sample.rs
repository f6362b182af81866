use chrono::{Local, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rusqlite::Connection;

use crate::error::{Result, TrackerError};
use crate::ledger::add_expense;
use crate::models::{NewExpense, DATE_FORMAT};

/// Sample descriptions per category.
const DESCRIPTIONS: &[(&str, &[&str])] = &[
    ("Food", &["Lunch at cafe", "Groceries", "Dinner at restaurant"]),
    ("Travel", &["Uber ride", "Bus ticket", "Train fare"]),
    ("Shopping", &["Clothes", "Electronics", "Books"]),
    ("Bills", &["Electricity bill", "Water bill", "Internet bill"]),
    ("Other", &["Gift", "Donation", "Miscellaneous"]),
];

const MIN_AMOUNT: f64 = 5.0;
const MAX_AMOUNT: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub rows: usize,
    /// Length of the historical window ending at `end`.
    pub days: u32,
    pub end: NaiveDate,
    pub seed: Option<u64>,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            rows: 50,
            days: 180,
            end: Local::now().date_naive(),
            seed: None,
        }
    }
}

pub fn generate_rows(config: &SampleConfig) -> Result<Vec<NewExpense>> {
    let start = config
        .end
        .checked_sub_days(chrono::Days::new(u64::from(config.days)))
        .ok_or_else(|| TrackerError::InvalidInput(format!("window of {} days is too long", config.days)))?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut rows = Vec::with_capacity(config.rows);
    for _ in 0..config.rows {
        let offset = rng.gen_range(0..=config.days);
        let date = start + chrono::Days::new(u64::from(offset));
        let (category, descriptions) = DESCRIPTIONS[rng.gen_range(0..DESCRIPTIONS.len())];
        let description = descriptions.choose(&mut rng).copied().unwrap_or(category);
        let amount = (rng.gen_range(MIN_AMOUNT..=MAX_AMOUNT) * 100.0).round() / 100.0;
        rows.push(NewExpense {
            date: date.format(DATE_FORMAT).to_string(),
            category: category.to_string(),
            description: description.to_string(),
            amount,
        });
    }
    Ok(rows)
}

/// Insert synthetic expenses in one transaction. Returns how many were added.
pub fn insert_sample_data(conn: &mut Connection, config: &SampleConfig) -> Result<usize> {
    let rows = generate_rows(config)?;
    let tx = conn.transaction()?;
    for row in &rows {
        add_expense(&tx, row)?;
    }
    tx.commit()?;
    Ok(rows.len())
}
