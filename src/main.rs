mod cli;

use anyhow::Context;
use clap::Parser;
use cli::commands::{Cli, Mode};
use cli::progress::CliReporter;
use colored::*;
use dotenv::dotenv;
use hashfs::storage::Store;
use hashfs::{AppConfig, IndexEngine};
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args = Cli::parse();
    let _guard = cli::logging::init_logger();

    let config = match hashfs::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            return Err(err).context("invalid configuration");
        }
    };

    match args.mode() {
        Mode::ToJson { store } => {
            let store = store.unwrap_or_else(|| config.store_path.clone());
            run_to_json(&store)
        }
        Mode::Index { directory, store } => {
            // No banner for --tojson; its stdout must stay parsable.
            info!("HashFS v{}", env!("CARGO_PKG_VERSION"));
            let store = store.unwrap_or_else(|| config.store_path.clone());
            if let Err(err) = run_index(&config, &directory, &store) {
                error!("Error: {:#}", err);
                return Err(err);
            }
            Ok(())
        }
    }
}

fn run_index(config: &AppConfig, directory: &str, store: &str) -> anyhow::Result<()> {
    let engine = IndexEngine::new(config.clone())
        .with_root(directory)
        .with_store_path(store);
    let reporter = CliReporter::new();
    let result = engine
        .run(&reporter)
        .with_context(|| format!("indexing {} into {}", directory, store))?;

    info!(
        "Load: {}, Walk: {}, Reconcile: {}",
        format!("{:.2}s", result.load_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.walk_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.reconcile_duration.as_secs_f64()).green(),
    );
    info!(
        "{} files processed, {} hashed, {} cached, {} records removed",
        format!("{}", result.tally.processed()).cyan(),
        format!("{}", result.tally.hashed()).cyan(),
        format!("{}", result.tally.cached).cyan(),
        format!("{}", result.reconcile.removed).red(),
    );
    if result.scheduler.abandoned > 0 {
        info!(
            "{} units exceeded the abandon threshold",
            format!("{}", result.scheduler.abandoned).yellow()
        );
    }

    Ok(())
}

fn run_to_json(store: &str) -> anyhow::Result<()> {
    let store = Store::open(store).with_context(|| format!("opening store {}", store))?;
    let json = hashfs::tree::export_json(&store)?;
    println!("{}", json);
    Ok(())
}
