use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;

use kvstore::cli::{Cli, Command};
use kvstore::config::Config;
use kvstore::{KvBackend, KvStore};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let store_path = cli.store.unwrap_or(config.store_path);

    info!("ks starting, store at {}", store_path.display());
    let store = KvStore::open(&store_path)?;

    match cli.command {
        Command::Get { key, pretty } => {
            let value = store.get(&key)?.ok_or_else(|| eyre!("Key not found: {}", key))?;
            if pretty && let Ok(json) = serde_json::from_str::<serde_json::Value>(&value) {
                println!("{}", serde_json::to_string_pretty(&json)?);
            } else {
                println!("{}", value);
            }
        }
        Command::Set { key, value } => {
            store.set(&key, &value)?;
            println!("{} Stored: {}", "✓".green(), key.cyan());
        }
        Command::Rm { key } => {
            store.remove(&key)?;
            println!("{} Removed: {}", "✓".green(), key);
        }
        Command::List => {
            let entries = store.entries()?;
            if entries.is_empty() {
                println!("No keys found");
            } else {
                for entry in entries {
                    let modified = entry
                        .modified
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_default();
                    println!(
                        "{} {} {}",
                        entry.key.cyan(),
                        format!("{}B", entry.size).dimmed(),
                        modified.dimmed()
                    );
                }
            }
        }
    }

    Ok(())
}
