mod session;

use clap::{Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use unity_api::models::RecalculatePriceRequest;
use unity_api::{ApiState, UnityService};
use unity_core::{CirculatingSupply, UnityConfig};
use unity_storage::SledSnapshotStore;

#[derive(Parser)]
#[command(name = "unityd")]
#[command(about = "UNITY index token pricing and ledger", version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use fixed prices instead of the live price API
    #[arg(long)]
    offline: bool,

    /// Directory of the snapshot store
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the latest UNITY price
    Price,

    /// Recompute the UNITY price, optionally with a circulating supply
    Recalculate {
        #[arg(long, requires_all = ["vtho", "b3tr"])]
        vet: Option<Decimal>,
        #[arg(long, requires_all = ["vet", "b3tr"])]
        vtho: Option<Decimal>,
        #[arg(long, requires_all = ["vet", "vtho"])]
        b3tr: Option<Decimal>,
    },

    /// Show the current reserves
    Reserves,

    /// List stored records, newest first
    History {
        #[arg(value_enum, default_value = "prices")]
        kind: HistoryKind,

        /// Number of records to show
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Run ledger commands from a script, or stdin when none is given
    Session {
        #[arg(value_name = "SCRIPT")]
        script: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum HistoryKind {
    Prices,
    Reserves,
    Transactions,
}

fn load_config(cli: &Cli) -> Result<UnityConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => UnityConfig::load_from_file(path)?,
        None => UnityConfig::from_env()?,
    };
    if cli.offline {
        config.feed.offline = true;
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

fn print_json<T: Serialize>(title: &str, value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", title.cyan().bold());
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let store_path = config.data_dir.join("snapshots");
    log::info!("📂 Snapshot store: {}", store_path.display());
    let store = Arc::new(SledSnapshotStore::open(&store_path)?);

    let service = UnityService::new(ApiState::from_config(config, store)?);
    service.state().ledger.resume().await?;

    match cli.command {
        Commands::Price => {
            print_json("UNITY price", &service.get_price().await?)?;
        }
        Commands::Recalculate { vet, vtho, b3tr } => {
            let circulating_supply = match (vet, vtho, b3tr) {
                (Some(vet), Some(vtho), Some(b3tr)) => {
                    Some(CirculatingSupply::new(vet, vtho, b3tr))
                }
                _ => None,
            };
            let price = service
                .recalculate_price(RecalculatePriceRequest { circulating_supply })
                .await?;
            print_json("UNITY price (recalculated)", &price)?;
        }
        Commands::Reserves => {
            print_json("Reserves", &service.get_reserves())?;
        }
        Commands::History { kind, limit } => match kind {
            HistoryKind::Prices => print_json("Price history", &service.price_history(limit)?)?,
            HistoryKind::Reserves => {
                print_json("Reserve history", &service.reserve_history(limit)?)?
            }
            HistoryKind::Transactions => {
                print_json("Transactions", &service.transactions(limit)?)?
            }
        },
        Commands::Session { script } => {
            println!(
                "{} ({} ledger)",
                "🚀 UNITY session".green().bold(),
                service.state().ledger.mode()
            );
            let failures = match script {
                Some(path) => {
                    let file = std::fs::File::open(&path)?;
                    session::run(&service, BufReader::new(file)).await?
                }
                None => session::run(&service, std::io::stdin().lock()).await?,
            };
            if failures > 0 {
                println!("{} {} command(s) failed", "⚠".yellow(), failures);
            }
        }
    }

    Ok(())
}
