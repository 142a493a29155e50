use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use assetinsights::config::Config;
use assetinsights::detect::{self, engine::AnomalyEngine};
use assetinsights::model::AssetRecord;
use assetinsights::storage;

#[derive(Parser)]
#[command(
    name = "assetinsights",
    about = "Energy KPIs and peer-group anomaly detection for building assets",
    version,
    long_about = None
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true, env = "ASSETINSIGHTS_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database path (overrides the config file)
    #[arg(long, global = true, env = "ASSETINSIGHTS_DATABASE")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Bind address (overrides the config file)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Score every asset against its peers and print the anomalies
    Anomalies {
        /// Minimum absolute z-score, clamped to [0, 10]
        #[arg(long, allow_negative_numbers = true)]
        z: Option<f64>,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Print portfolio energy totals
    Kpi {
        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Load assets from a JSON array file into the database
    Import {
        /// Input file path
        #[arg(long)]
        file: PathBuf,
    },

    /// Create or upgrade the database schema and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::resolve(cli.config.as_deref())?;
    if let Some(path) = cli.database {
        config.database.path = path;
    }

    assetinsights::init_tracing(&config.logging);

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            tracing::info!(bind = %config.server.bind, "Starting asset insights service");
            assetinsights::serve(&config).await?;
        }
        Commands::Anomalies { z, json } => {
            let threshold =
                detect::clamp_threshold(z.unwrap_or(config.insights.default_threshold));
            let pool = open(&config)?;
            let results = AnomalyEngine::new(pool).scan(threshold).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else if results.is_empty() {
                println!("No anomalies at |z| >= {:.2}.", threshold);
            } else {
                println!(
                    "{:<16} | {:<10} | {:<12} | {:<6} | {:>10} | {:>10} | {:>7}",
                    "Asset", "Type", "Building", "Floor", "kWh", "Peer avg", "Z"
                );
                println!(
                    "{:-<16}-|-{:-<10}-|-{:-<12}-|-{:-<6}-|-{:->10}-|-{:->10}-|-{:->7}",
                    "", "", "", "", "", "", ""
                );
                for r in &results {
                    println!(
                        "{:<16} | {:<10} | {:<12} | {:<6} | {:>10.1} | {:>10.1} | {:>+7.2}",
                        r.asset_id,
                        r.asset_type,
                        r.building,
                        r.floor,
                        r.actual_kwh,
                        r.avg_kwh,
                        r.zscore
                    );
                }
            }
        }
        Commands::Kpi { json } => {
            let pool = open(&config)?;
            let kpi = storage::assets::kpi_summary(&pool)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&kpi)?);
            } else {
                println!("Baseline: {:>12.1} kWh", kpi.baseline_kwh);
                println!("Actual:   {:>12.1} kWh", kpi.actual_kwh);
                println!("Saved:    {:>12.1} kWh", kpi.saved_kwh);
                println!("Offline:  {:>12}", kpi.offline_count);
            }
        }
        Commands::Import { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let assets: Vec<AssetRecord> = serde_json::from_str(&content)
                .with_context(|| format!("failed to parse {}", file.display()))?;
            let pool = open(&config)?;
            let written = storage::assets::upsert_many(&pool, &assets)?;
            tracing::info!(written, file = %file.display(), "Imported assets");
            println!("Imported {} assets.", written);
        }
        Commands::Migrate => {
            open(&config)?;
            println!("Database ready at {}.", config.database.path.display());
        }
    }

    Ok(())
}

fn open(config: &Config) -> Result<storage::Pool> {
    storage::open_pool(&config.database.path, config.database.max_connections)
}
