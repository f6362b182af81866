pub mod assist;
pub mod expenses;
pub mod export;
pub mod init;
pub mod months;
pub mod sample;
pub mod status;
pub mod train;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::db::open_ledger;
use crate::error::Result;
use crate::settings::{load_settings, Settings};

/// Load settings and open (creating if needed) the ledger they point at.
pub(crate) fn open_context() -> Result<(Settings, Connection)> {
    let settings = load_settings()?;
    std::fs::create_dir_all(settings.data_dir())?;
    let conn = open_ledger(&settings.db_path())?;
    Ok((settings, conn))
}

#[derive(Parser)]
#[command(
    name = "spendsense",
    about = "Personal expense tracker with category suggestions, spend forecasts and anomaly checks."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for spendsense data (default: ~/Documents/spendsense)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Currency symbol used when printing amounts
        #[arg(long)]
        currency: Option<String>,
    },
    /// Add an expense.
    Add {
        /// Amount, e.g. 12.50 (negative for refunds)
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Category label (any text; run without it to see common ones)
        #[arg(long, default_value = "")]
        category: String,
        /// Free-text description
        #[arg(long, default_value = "")]
        description: String,
        /// Date: YYYY-MM-DD (default: today)
        #[arg(long, default_value = "")]
        date: String,
    },
    /// List all expenses, newest first.
    List,
    /// Delete an expense by ID.
    Delete {
        /// Expense ID (shown in `spendsense list`)
        id: i64,
    },
    /// Suggest a category for a description.
    Suggest {
        /// Description to classify
        description: String,
    },
    /// Predict next month's total spend.
    Predict,
    /// Report months with unusual total spend.
    Anomalies,
    /// Retrain all models from the full ledger.
    Train,
    /// Insert synthetic expenses for trying things out.
    Sample {
        /// Number of rows to insert
        #[arg(long, default_value = "50")]
        rows: usize,
        /// Length of the historical window in days, ending today
        #[arg(long, default_value = "180")]
        days: u32,
        /// Seed for a reproducible data set
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show spend per calendar month.
    Months,
    /// Export the ledger to CSV.
    Export {
        /// Output path (default: <data_dir>/exports/expenses-YYYY-MM-DD.csv)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show data location, ledger size and model status.
    Status,
}
