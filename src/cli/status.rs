use crate::artifacts::{ArtifactKind, ModelBundle, Slot};
use crate::cli::open_context;
use crate::error::Result;
use crate::fmt::money;
use crate::ledger::{count_expenses, load_ledger, monthly_totals};

fn slot_status<T>(slot: &Slot<T>) -> String {
    match slot {
        Slot::Missing => "not trained".to_string(),
        Slot::Ready(_) => "ready".to_string(),
        Slot::Broken(reason) => format!("unreadable ({reason})"),
    }
}

pub fn run() -> Result<()> {
    let (settings, conn) = open_context()?;
    let store = settings.artifact_store();

    println!("Data dir:   {}", settings.data_dir().display());
    println!("Database:   {}", settings.db_path().display());
    println!("Models:     {}", store.dir().display());

    let count = count_expenses(&conn)?;
    let months = monthly_totals(&load_ledger(&conn)?);
    let total: f64 = months.iter().map(|m| m.total).sum();
    println!();
    println!("Expenses:   {count}");
    println!("Months:     {}", months.len());
    println!("Total:      {}", money(total, &settings.currency_symbol));

    let bundle = ModelBundle::load(&store);
    println!();
    for kind in ArtifactKind::ALL {
        let status = match kind {
            ArtifactKind::Category => slot_status(&bundle.category),
            ArtifactKind::Prediction => slot_status(&bundle.prediction),
            ArtifactKind::Anomaly => slot_status(&bundle.anomaly),
        };
        println!("{:<11} {status}", format!("{}:", kind.name()));
    }
    Ok(())
}
