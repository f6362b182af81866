mod anomaly;
mod artifacts;
mod assist;
mod classifier;
mod cli;
mod db;
mod error;
mod fmt;
mod forecast;
mod ledger;
mod models;
mod sample;
mod settings;
mod training;

use clap::Parser;
use tracing_subscriber::{fmt as log_fmt, EnvFilter};

use cli::{Cli, Commands};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("spendsense=info"));
    log_fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Init { data_dir, currency } => cli::init::run(data_dir, currency),
        Commands::Add {
            amount,
            category,
            description,
            date,
        } => cli::expenses::add(&date, &category, &description, &amount),
        Commands::List => cli::expenses::list(),
        Commands::Delete { id } => cli::expenses::delete(id),
        Commands::Suggest { description } => cli::assist::suggest(&description),
        Commands::Predict => cli::assist::predict(),
        Commands::Anomalies => cli::assist::anomalies(),
        Commands::Train => cli::train::run(),
        Commands::Sample { rows, days, seed } => cli::sample::run(rows, days, seed),
        Commands::Months => cli::months::run(),
        Commands::Export { output } => cli::export::run(output),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
