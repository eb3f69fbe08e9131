mod import;
mod verify;
mod watch;

pub use import::import;
pub use verify::{stats, verify};
pub use watch::watch;

use anyhow::{Context, Result};
use gl860_loader::extract::Extractor;
use gl860_loader::loader::LoaderOptions;
use gl860_loader::{Config, Loader, Store};

fn open_store(config: &Config) -> Result<Store> {
    Store::open(&config.database_path)
        .with_context(|| format!("Cannot start with database '{}'", config.database_path.display()))
}

fn open_loader(config: &Config, options: LoaderOptions) -> Result<Loader> {
    Ok(Loader::new(open_store(config)?, Extractor::default(), options))
}
