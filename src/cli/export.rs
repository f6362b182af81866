use std::path::{Path, PathBuf};

use crate::cli::open_context;
use crate::error::Result;
use crate::ledger::load_ledger;
use crate::models::Expense;

fn default_path(data_dir: &Path) -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    data_dir.join("exports").join(format!("expenses-{date}.csv"))
}

pub fn write_csv<W: std::io::Write>(writer: W, expenses: &[Expense]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["id", "date", "category", "description", "amount"])?;
    for e in expenses {
        wtr.write_record([
            e.id.to_string(),
            e.date.clone(),
            e.category.clone(),
            e.description.clone(),
            format!("{:.2}", e.amount),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn run(output: Option<String>) -> Result<()> {
    let (settings, conn) = open_context()?;
    let expenses = load_ledger(&conn)?;
    let path = output.map(PathBuf::from).unwrap_or_else(|| default_path(&settings.data_dir()));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    write_csv(std::fs::File::create(&path)?, &expenses)?;
    println!("Wrote {} expenses to {}", expenses.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_csv_quotes_and_formats() {
        let expenses = vec![Expense {
            id: 3,
            date: "2025-01-02".to_string(),
            category: "Food".to_string(),
            description: "Lunch, with team".to_string(),
            amount: 12.5,
        }];
        let mut buf = Vec::new();
        write_csv(&mut buf, &expenses).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "id,date,category,description,amount\n3,2025-01-02,Food,\"Lunch, with team\",12.50\n"
        );
    }
}
