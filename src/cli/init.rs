use crate::db::open_ledger;
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(data_dir: Option<String>, currency: Option<String>) -> Result<()> {
    let mut settings = load_settings()?;
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    if let Some(symbol) = currency {
        settings.currency_symbol = symbol;
    }
    save_settings(&settings)?;

    let resolved = settings.data_dir();
    std::fs::create_dir_all(&resolved)?;
    std::fs::create_dir_all(settings.artifact_store().dir())?;
    open_ledger(&settings.db_path())?;

    println!("Initialized spendsense at {}", resolved.display());
    Ok(())
}
