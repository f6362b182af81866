use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rusqlite::{Connection, OptionalExtension};
use tracing::warn;

use crate::error::{Result, TrackerError};
use crate::models::{Expense, MonthlyTotal, NewExpense, DATE_FORMAT};

fn row_to_expense(row: &rusqlite::Row) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: row.get(0)?,
        date: row.get(1)?,
        category: row.get(2)?,
        description: row.get(3)?,
        amount: row.get(4)?,
    })
}

pub fn add_expense(conn: &Connection, expense: &NewExpense) -> Result<Expense> {
    conn.execute(
        "INSERT INTO expenses (date, category, description, amount) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![expense.date, expense.category, expense.description, expense.amount],
    )?;
    Ok(Expense {
        id: conn.last_insert_rowid(),
        date: expense.date.clone(),
        category: expense.category.clone(),
        description: expense.description.clone(),
        amount: expense.amount,
    })
}

/// Newest first, as shown in the expense list.
pub fn list_expenses(conn: &Connection) -> Result<Vec<Expense>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, category, description, amount FROM expenses ORDER BY date DESC, id DESC",
    )?;
    let rows = stmt
        .query_map([], row_to_expense)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_expense(conn: &Connection, id: i64) -> Result<Option<Expense>> {
    let expense = conn
        .query_row(
            "SELECT id, date, category, description, amount FROM expenses WHERE id = ?1",
            [id],
            row_to_expense,
        )
        .optional()?;
    Ok(expense)
}

pub fn delete_expense(conn: &Connection, id: i64) -> Result<()> {
    let removed = conn.execute("DELETE FROM expenses WHERE id = ?1", [id])?;
    if removed == 0 {
        return Err(TrackerError::UnknownExpense(id));
    }
    Ok(())
}

/// The full ledger in insertion order.
pub fn load_ledger(conn: &Connection) -> Result<Vec<Expense>> {
    let mut stmt =
        conn.prepare("SELECT id, date, category, description, amount FROM expenses ORDER BY id")?;
    let rows = stmt
        .query_map([], row_to_expense)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count_expenses(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT count(*) FROM expenses", [], |r| r.get(0))?)
}

fn parse_day(date: &str) -> Option<NaiveDate> {
    let date = date.trim();
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .ok()
        .or_else(|| date.get(..10).and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok()))
}

/// Sum amounts per calendar month, oldest month first. Months without rows
/// are not emitted.
pub fn monthly_totals(expenses: &[Expense]) -> Vec<MonthlyTotal> {
    let mut by_month: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for expense in expenses {
        match parse_day(&expense.date) {
            Some(day) => *by_month.entry((day.year(), day.month())).or_insert(0.0) += expense.amount,
            None => warn!(id = expense.id, date = %expense.date, "skipping expense with unreadable date"),
        }
    }
    by_month
        .into_iter()
        .map(|((year, month), total)| MonthlyTotal {
            month: format!("{year:04}-{month:02}"),
            total,
        })
        .collect()
}
