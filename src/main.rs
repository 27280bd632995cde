mod analytics;
mod config;
mod db;
mod export;
mod logging;
mod models;
mod run;
mod store;
mod ui;

use anyhow::{Context, Result};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let (config, rest) = config::Config::load(&args)?;

    if let Some(dir) = config.db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
    }

    match rest.len() {
        0 | 1 => {
            logging::init_file(&config.db_path.with_file_name("fintrack.log"))?;
            let mut db = db::Database::open(&config.db_path)?;
            run::as_tui(&mut db, &config)
        }
        _ => {
            logging::init_stderr()?;
            let mut db = db::Database::open(&config.db_path)?;
            run::as_cli(&rest, &mut db, &config)
        }
    }
}
