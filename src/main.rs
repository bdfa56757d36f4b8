//! Ledgerdash main entry point

use anyhow::Context;
use clap::Parser;
use ledgerdash_api::start_server;
use ledgerdash_config::{Config, ConfigError};
use ledgerdash_core::seed::seed_store;
use ledgerdash_core::{InMemoryStore, TransactionStore};
use ledgerdash_utils::{format_currency_places, format_date};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "ledgerdash")]
#[command(version = "0.1.0")]
#[command(about = "Transactions dashboard with an optimistic paged cache", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Seed the store, print the newest rows and exit
    #[arg(long)]
    seed_only: bool,

    /// Print the default configuration file and exit
    #[arg(long)]
    print_config: bool,
}

/// Missing config file falls back to defaults; anything else is fatal
fn load_config(path: &Path) -> anyhow::Result<(Config, Option<String>)> {
    match Config::load(path) {
        Ok(config) => Ok((config, None)),
        Err(ConfigError::FileNotFound { path }) => Ok((
            Config::default(),
            Some(format!("Config file {} not found, using defaults", path)),
        )),
        Err(e) => {
            let details = e.to_details();
            let mut message = format!("failed to load {}", path.display());
            for suggestion in &details.suggestions {
                message.push_str(&format!("\n  hint: {}", suggestion));
            }
            Err(anyhow::Error::new(e).context(message))
        }
    }
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let (config, warning) = load_config(&args.config)?;
    init_logging(&config.logging.level);
    match warning {
        Some(warning) => log::warn!("{}", warning),
        None => log::info!("Config loaded from {}", args.config.display()),
    }

    let rt = Runtime::new().context("failed to start the tokio runtime")?;
    rt.block_on(async {
        let store = Arc::new(InMemoryStore::new());
        let seeded = seed_store(&store, &config.store).await;

        if args.seed_only {
            let (rows, total) = store
                .select_page(&config.store.seed_user_id, 0, 5)
                .await
                .context("failed to read back seeded rows")?;
            println!("Seeded {} transactions ({} stored)", seeded, total);
            for row in rows {
                println!(
                    "{:>12}  {:<12}  {:<36}  {:>12}",
                    format_date(row.date),
                    row.account_number,
                    row.description,
                    format_currency_places(
                        row.amount,
                        &config.currency.code,
                        config.currency.decimal_places
                    )
                );
            }
            return Ok(());
        }

        start_server(config, store).await
    })
}
