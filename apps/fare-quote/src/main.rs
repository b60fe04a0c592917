//! # fare-quote
//!
//! Prices one journey, or rebuilds one train's route distances, against a
//! Railfare SQLite database.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  argv ──► Cli::parse ──► QuoteConfig::load ──► init_tracing             │
//! │                                                    │                    │
//! │                                                    ▼                    │
//! │                              Database::new(config.db_config())          │
//! │                                                    │                    │
//! │                                                    ▼                    │
//! │                 PricingEngine::new(db).with_policy(config.policy)       │
//! │                          │                              │               │
//! │                  quote   ▼                      rebuild ▼               │
//! │               calculate_price               index().rebuild             │
//! │                          │                              │               │
//! │                          └──────────► JSON on stdout ◄──┘               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cli;
mod config;
mod error;

use railfare_core::{PriceRequest, PricingEngine, StationId};
use railfare_db::Database;
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, QuoteArgs, StationRef, USAGE};
use crate::config::QuoteConfig;
use crate::error::{CliError, CliResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse(std::env::args().skip(1))?;

    if cli.command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = QuoteConfig::load(cli.config.clone())?;
    init_tracing(&config.logging.filter);

    debug!(?config, "Configuration loaded");

    run(cli.command, &config).await?;
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so stdout stays pure JSON. `RUST_LOG` wins over the
/// configured filter.
fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Command, config: &QuoteConfig) -> CliResult<()> {
    let db = Database::new(config.db_config()).await?;
    let engine = PricingEngine::new(db.clone()).with_policy(config.pricing.missing_range_policy);

    info!(policy = %engine.policy(), "Pricing engine ready");

    let output = match command {
        Command::Quote(args) => {
            let request = price_request(&db, args).await?;
            let breakdown = engine.calculate_price(&request).await?;
            serde_json::to_string_pretty(&breakdown)?
        }
        Command::Rebuild { train_id } => {
            let distances = engine.index().rebuild(train_id).await?;
            serde_json::to_string_pretty(&json!({
                "train_id": train_id,
                "station_pairs": distances.len(),
            }))?
        }
        Command::Help => USAGE.to_string(),
    };

    println!("{}", output);

    db.close().await;
    Ok(())
}

async fn price_request(db: &Database, args: QuoteArgs) -> CliResult<PriceRequest> {
    Ok(PriceRequest {
        train_id: args.train_id,
        from_station_id: resolve_station(db, &args.from).await?,
        to_station_id: resolve_station(db, &args.to).await?,
        bogie_id: args.bogie_id,
        berth_type: args.berth,
    })
}

async fn resolve_station(db: &Database, station: &StationRef) -> CliResult<StationId> {
    match station {
        StationRef::Id(id) => Ok(*id),
        StationRef::Code(code) => db
            .stations()
            .get_by_code(code)
            .await?
            .map(|s| s.id)
            .ok_or_else(|| CliError::UnknownStation(code.clone())),
    }
}
