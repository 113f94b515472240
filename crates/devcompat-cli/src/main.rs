//! Devcompat - Device compatibility checks from the command line
//!
//! Reads device snapshots and transaction descriptions from JSON files and
//! prints the derived compatibility metadata as JSON on stdout.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use devcompat_core::{
    analyze, collect_witness_paths, normalize_revision, parse_capabilities, AssetCatalog,
    Certificate, DeviceState, TxInput, Withdrawal,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "devcompat")]
#[command(about = "Firmware capability and asset compatibility checks")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "devcompat.toml")]
    config: PathBuf,

    /// Log filter (trace, debug, info, warn, error, or directives such as
    /// `devcompat_core=debug`); `RUST_LOG` takes precedence
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the capabilities of a device snapshot
    Capabilities {
        /// Device snapshot (JSON)
        #[arg(short, long)]
        device: PathBuf,
    },
    /// Normalize a firmware revision string
    Revision {
        revision: String,
    },
    /// Resolve which assets and capabilities are unavailable on a device
    Resolve {
        /// Device snapshot (JSON)
        #[arg(short, long)]
        device: PathBuf,
        /// Asset catalog, overriding the configured path
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// List the distinct witness paths of a transaction
    WitnessPaths {
        /// Transaction description (JSON)
        #[arg(short, long)]
        tx: PathBuf,
    },
    /// Write an example configuration file
    InitConfig {
        #[arg(default_value = "devcompat.toml")]
        path: PathBuf,
    },
}

/// Transaction parts that carry witness paths
#[derive(Debug, Default, Deserialize)]
struct TxDescription {
    #[serde(default)]
    inputs: Vec<TxInput>,
    #[serde(default)]
    certificates: Vec<Certificate>,
    #[serde(default)]
    withdrawals: Vec<Withdrawal>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging on stderr, keeping stdout for JSON
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    debug!("Devcompat v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Capabilities { device } => {
            let device: DeviceState = read_json(&device)?;
            print_json(&parse_capabilities(Some(&device)))?;
        }
        Command::Revision { revision } => {
            print_json(&normalize_revision(Some(&revision)))?;
        }
        Command::Resolve { device, catalog } => {
            let config = config::load_config(&args.config)?;
            let catalog_path = catalog.unwrap_or_else(|| PathBuf::from(&config.catalog.path));
            let catalog = AssetCatalog::from_file(&catalog_path)
                .with_context(|| format!("loading catalog {}", catalog_path.display()))?;
            let device: DeviceState = read_json(&device)?;

            info!(
                firmware = %device.version(),
                assets = catalog.assets.len(),
                "Resolving availability"
            );

            let summary = analyze(Some(&device), &catalog.assets, &config.support_ranges);
            print_json(&summary)?;
        }
        Command::WitnessPaths { tx } => {
            let tx: TxDescription = read_json(&tx)?;
            let paths: Vec<String> =
                collect_witness_paths(&tx.inputs, &tx.certificates, &tx.withdrawals)
                    .iter()
                    .map(ToString::to_string)
                    .collect();
            print_json(&paths)?;
        }
        Command::InitConfig { path } => {
            config::save_default_config(&path)?;
            info!(path = %path.display(), "Wrote example configuration");
        }
    }

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
