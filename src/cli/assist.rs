use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::artifacts::ModelBundle;
use crate::assist::{detect_anomalies, predict_next_month, suggest_category, Availability};
use crate::error::Result;
use crate::fmt::money;
use crate::forecast::Basis;
use crate::settings::load_settings;

fn unavailable(reason: &str) {
    println!("{}", reason.yellow());
}

pub fn suggest(description: &str) -> Result<()> {
    let settings = load_settings()?;
    let bundle = ModelBundle::load(&settings.artifact_store());
    match suggest_category(&bundle, description)? {
        Availability::Available(category) => println!("Suggested category: {}", category.bold()),
        Availability::Unavailable(reason) => unavailable(&reason),
    }
    Ok(())
}

pub fn predict() -> Result<()> {
    let settings = load_settings()?;
    let bundle = ModelBundle::load(&settings.artifact_store());
    let forecast = match predict_next_month(&bundle)? {
        Availability::Available(f) => f,
        Availability::Unavailable(reason) => {
            unavailable(&reason);
            return Ok(());
        }
    };
    let symbol = &settings.currency_symbol;

    if !forecast.history.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Month", "Total", ""]);
        for m in &forecast.history {
            table.add_row(vec![
                Cell::new(&m.month),
                Cell::new(money(m.total, symbol)).set_alignment(CellAlignment::Right),
                Cell::new(""),
            ]);
        }
        if let Some(next) = &forecast.next_month {
            table.add_row(vec![
                Cell::new(next),
                Cell::new(money(forecast.value, symbol)).set_alignment(CellAlignment::Right),
                Cell::new("predicted"),
            ]);
        }
        println!("Monthly expenses (history + predicted)\n{table}");
    }

    let value = money(forecast.value, symbol);
    match forecast.basis {
        Basis::Trend => println!("Predicted next month expense: {}", value.bold()),
        Basis::Fallback => println!(
            "Predicted next month expense (fallback mean): {}",
            value.bold()
        ),
    }
    Ok(())
}

pub fn anomalies() -> Result<()> {
    let settings = load_settings()?;
    let bundle = ModelBundle::load(&settings.artifact_store());
    match detect_anomalies(&bundle)? {
        Availability::Unavailable(reason) => unavailable(&reason),
        Availability::Available(months) if months.is_empty() => {
            println!("{}", "No anomalous months detected.".green());
        }
        Availability::Available(months) => {
            println!("{}", "Anomalies detected:".red().bold());
            for m in &months {
                println!("  {}: {}", m.month, money(m.total, &settings.currency_symbol));
            }
        }
    }
    Ok(())
}

