use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::open_context;
use crate::error::{Result, TrackerError};
use crate::fmt::money;
use crate::ledger::{add_expense, delete_expense, get_expense, list_expenses};
use crate::models::NewExpense;

pub fn add(date: &str, category: &str, description: &str, amount: &str) -> Result<()> {
    let expense = NewExpense::parse(date, category, description, amount)?;
    let (settings, conn) = open_context()?;
    let stored = add_expense(&conn, &expense)?;
    println!(
        "Added expense {}: {} {} ({})",
        stored.id,
        stored.date,
        money(stored.amount, &settings.currency_symbol),
        stored.category
    );
    Ok(())
}

pub fn list() -> Result<()> {
    let (settings, conn) = open_context()?;
    let rows = list_expenses(&conn)?;
    if rows.is_empty() {
        println!("No expenses yet. Add one with `spendsense add <amount> --category <label>`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Category", "Description", "Amount"]);
    for e in &rows {
        table.add_row(vec![
            Cell::new(e.id),
            Cell::new(&e.date),
            Cell::new(&e.category),
            Cell::new(&e.description),
            Cell::new(money(e.amount, &settings.currency_symbol)).set_alignment(CellAlignment::Right),
        ]);
    }
    let total: f64 = rows.iter().map(|e| e.amount).sum();
    println!("Expenses\n{table}");
    println!("{} expenses, {} total", rows.len(), money(total, &settings.currency_symbol));
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let (settings, conn) = open_context()?;
    let expense = get_expense(&conn, id)?.ok_or(TrackerError::UnknownExpense(id))?;
    delete_expense(&conn, id)?;
    println!(
        "Deleted expense {id}: {} {} '{}'",
        expense.date,
        money(expense.amount, &settings.currency_symbol),
        expense.description
    );
    Ok(())
}
