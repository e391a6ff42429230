use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use apex_data::api::{build_router, state::AppState};
use apex_data::config::AppConfig;
use apex_data::fetch::Fetcher;
use apex_data::jolpica::{JolpicaClient, SeasonRef};
use apex_data::models::EntityKind;
use apex_data::seed::{verify_season, SeedTarget, Seeder, DEFAULT_MAX_ROUND};
use apex_data::standings::{compute_standings, season_records};
use apex_data::storage::{F1Store, StorageConfig};

#[derive(Parser)]
#[command(name = "apex-data")]
#[command(about = "Formula 1 statistics: seed, store and rank championship data")]
#[command(version)]
struct Cli {
    /// Path to configuration file (optional)
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Seed the data lake from Jolpica
    Seed {
        /// calendar, results, sprint, qualifying or all
        target: SeedTarget,

        #[arg(long)]
        season: u16,

        /// Last round probed for qualifying
        #[arg(long, default_value_t = DEFAULT_MAX_ROUND)]
        max_round: u32,

        /// Fetch and convert but don't store
        #[arg(long)]
        dry_run: bool,
    },

    /// Print championship standings computed from stored results
    Standings {
        /// Year, or "current" for the latest stored season
        #[arg(long, default_value = "current")]
        season: String,

        /// driver or constructor
        #[arg(long, default_value = "driver")]
        entity: EntityKind,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Report stored coverage of a season
    Verify {
        #[arg(long)]
        season: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting apex-data v{}", env!("CARGO_PKG_VERSION"));

    let storage = StorageConfig::new(config.data_dir.clone());
    let store = Arc::new(F1Store::new(storage.clone()));

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;

            let state = AppState {
                store,
                source: Arc::new(jolpica_client(&config, &storage)?),
                cors_origin: config.server.cors_origin.clone(),
            };
            let app = build_router(state);
            let addr = format!("{}:{}", config.server.host, config.server.port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("binding {}", addr))?;
            tracing::info!("API listening on http://{}", addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        Commands::Seed {
            target,
            season,
            max_round,
            dry_run,
        } => {
            let source = Arc::new(jolpica_client(&config, &storage)?);
            let seeder = Seeder::new(source, store).with_dry_run(dry_run);
            if dry_run {
                tracing::info!("Dry run: nothing will be written");
            }

            let reports = seeder.seed(target, season, max_round).await?;
            for report in &reports {
                println!(
                    "{} {}: fetched {}, inserted {}, skipped {} ({:.1}s)",
                    report.season,
                    report.target,
                    report.fetched,
                    report.inserted,
                    report.skipped,
                    report.duration.as_secs_f64()
                );
                if report.repaired_circuits > 0 {
                    println!("  repaired {} placeholder circuits", report.repaired_circuits);
                }
                if !report.missing_rounds.is_empty() {
                    println!("  no data for rounds {:?}", report.missing_rounds);
                }
                for error in &report.errors {
                    println!("  error: {}", error);
                }
            }
        }
        Commands::Standings {
            season,
            entity,
            json,
        } => {
            let season = match season.parse::<SeasonRef>().map_err(anyhow::Error::msg)? {
                SeasonRef::Year(year) => year,
                SeasonRef::Current => match store.latest_season()? {
                    Some(year) => year,
                    None => bail!("no stored results; run `apex-data seed results` first"),
                },
            };

            let results = store.results(season)?;
            let table = compute_standings(&season_records(&results), entity);

            if json {
                println!("{}", serde_json::to_string_pretty(&table)?);
            } else if table.is_empty() {
                println!("No stored results for {}", season);
            } else {
                println!("{} {} standings", season, entity);
                for row in &table {
                    println!(
                        "{:>3}  {:<28} {:<20} {:>7} {:>4}",
                        row.position,
                        row.name,
                        row.constructor.as_deref().unwrap_or(""),
                        row.points.to_string(),
                        row.wins
                    );
                }
            }
        }
        Commands::Verify { season } => {
            let report = verify_season(&store, season)?;

            println!("Season {}: {} results stored", report.season, report.total_results);
            for round in &report.rounds {
                println!(
                    "  R{:<2} {:<32} results {:>3}  qualifying {:>3}",
                    round.round, round.name, round.results, round.qualifying
                );
            }
            if report.missing_results.is_empty() {
                println!("All {} rounds have results", report.rounds.len());
            } else {
                println!("Rounds without results: {:?}", report.missing_results);
            }
        }
    }

    Ok(())
}

fn jolpica_client(config: &AppConfig, storage: &StorageConfig) -> Result<JolpicaClient> {
    let fetcher = Fetcher::new(config.jolpica.fetcher_config(storage.raw_dir()))?;
    Ok(JolpicaClient::new(
        fetcher,
        &config.jolpica.base_url,
        config.jolpica.page_size,
    ))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
