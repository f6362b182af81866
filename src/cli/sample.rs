use crate::cli::open_context;
use crate::error::Result;
use crate::sample::{insert_sample_data, SampleConfig};

pub fn run(rows: usize, days: u32, seed: Option<u64>) -> Result<()> {
    let (_settings, mut conn) = open_context()?;
    let config = SampleConfig {
        rows,
        days,
        seed,
        ..SampleConfig::default()
    };
    let added = insert_sample_data(&mut conn, &config)?;

    println!("Sample data inserted: {added} expenses over the last {days} days.");
    println!();
    println!("Try these next:");
    println!("  spendsense list");
    println!("  spendsense train");
    println!("  spendsense predict");
    println!("  spendsense anomalies");
    Ok(())
}
