use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::assist::retrain;
use crate::classifier::TrainingFit;
use crate::cli::open_context;
use crate::error::Result;
use crate::forecast::Basis;
use crate::training::StepOutcome;

fn outcome_line(label: &str, outcome: &StepOutcome, detail: Option<String>) {
    let status = match outcome {
        StepOutcome::Saved => "saved".green().to_string(),
        StepOutcome::Skipped(reason) => format!("{} ({reason})", "skipped".yellow()),
        StepOutcome::Failed(reason) => format!("{} ({reason})", "failed".red()),
    };
    match detail {
        Some(d) if *outcome == StepOutcome::Saved => println!("  {label:<12} {status}, {d}"),
        _ => println!("  {label:<12} {status}"),
    }
}

fn print_fit(fit: &TrainingFit) {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Precision", "Recall", "F1", "Support"]);
    for c in &fit.classes {
        table.add_row(vec![
            Cell::new(&c.label),
            Cell::new(format!("{:.2}", c.precision)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}", c.recall)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}", c.f1)).set_alignment(CellAlignment::Right),
            Cell::new(c.support).set_alignment(CellAlignment::Right),
        ]);
    }
    println!();
    println!(
        "Category classifier {}",
        "training-set fit (not a generalization estimate)".dimmed()
    );
    println!("{table}");
    println!("Accuracy on the {} training rows: {:.2}", fit.rows, fit.accuracy);
}

pub fn run() -> Result<()> {
    let (settings, conn) = open_context()?;
    let store = settings.artifact_store();
    let (report, _bundle) = retrain(&conn, &store)?;

    println!("Loaded {} rows ({} months) from the ledger.", report.rows, report.months);
    outcome_line(
        "category",
        &report.category,
        report.category_fit.as_ref().map(|f| format!("{} labels", f.classes.len())),
    );
    outcome_line(
        "prediction",
        &report.prediction,
        report.prediction_basis.map(|b| match b {
            Basis::Trend => "linear trend".to_string(),
            Basis::Fallback => "fallback mean".to_string(),
        }),
    );
    outcome_line(
        "anomaly",
        &report.anomaly,
        report.anomalies_flagged.map(|n| format!("{n} anomalous months")),
    );

    if let Some(fit) = &report.category_fit {
        print_fit(fit);
    }
    println!();
    println!("Models written to {}", store.dir().display());
    Ok(())
}
