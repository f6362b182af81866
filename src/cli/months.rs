use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::open_context;
use crate::error::Result;
use crate::fmt::money;
use crate::ledger::{load_ledger, monthly_totals};

pub fn run() -> Result<()> {
    let (settings, conn) = open_context()?;
    let months = monthly_totals(&load_ledger(&conn)?);
    if months.is_empty() {
        println!("No expenses yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Month", "Total"]);
    for m in &months {
        table.add_row(vec![
            Cell::new(&m.month),
            Cell::new(money(m.total, &settings.currency_symbol)).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("Spend per month\n{table}");
    Ok(())
}
