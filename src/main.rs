//! mirrorstore CLI - inspect and edit persisted stores.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use mirrorstore::{BackendKind, Registry, RegistryConfig, paths};

#[derive(Parser)]
#[command(name = "mirrorstore")]
#[command(about = "Inspect and edit lazily persisted key/value stores", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to <home>/config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store database file (overrides config)
    #[arg(long, global = true)]
    path: Option<PathBuf>,

    /// Scope of the store name (overrides config)
    #[arg(long, global = true)]
    scope: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Store name, without scope
    store: String,

    #[command(subcommand)]
    action: StoreAction,
}

#[derive(Subcommand)]
pub enum StoreAction {
    /// Print one value, or the whole store without a key
    Get { key: Option<String> },
    /// Set a value (parsed as JSON, otherwise stored as a string)
    Set { key: String, value: String },
    /// Remove a key
    Remove { key: String },
    /// Reset the store to its defaults
    Clear,
    /// Print the approximate size of the store
    Size,
    /// Enable the store and load its persisted data
    Enable,
    /// Disable the store (clears data unless --keep-data)
    Disable {
        #[arg(long)]
        keep_data: bool,
    },
    /// Print name, state and size
    Status,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let registry = Registry::open(config).context("Failed to open store backend")?;

    commands::execute(&registry, &cli.store, cli.action)?;

    let report = registry.shutdown();
    if let Some((name, err)) = report.failed.first() {
        anyhow::bail!("Failed saving store {name}: {err}");
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<RegistryConfig> {
    let mut config = match &cli.config {
        Some(path) => RegistryConfig::load_from(path)?,
        None => {
            let default_path = paths::get_config_path()?;
            if default_path.exists() {
                RegistryConfig::load_from(&default_path)?
            } else {
                RegistryConfig::default()
            }
        },
    };

    if let Some(path) = &cli.path {
        config.backend = BackendKind::File;
        config.path = Some(path.clone());
    }
    if let Some(scope) = &cli.scope {
        config.public_path.clone_from(scope);
    }
    config.logging |= cli.verbose;

    Ok(config)
}

/// Initialize stderr logging, `RUST_LOG` taking precedence.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
