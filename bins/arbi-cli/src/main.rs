//! arbi-cli: inspect the Arbibots auction and replay command logs.
//!
//! Parameters come from the layered [`NodeConfig`] (defaults, TOML file,
//! `ARBI_*` environment); `--log-level` and `--log-format` override it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arbi_cases::Allowlist;
use arbi_core::pricing::PricingEngine;
use arbi_core::types::units;
use arbi_core::MemoryPayouts;
use arbi_node_lib::{parse_log, Applier, Command, NodeConfig, Outcome};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Arbibots descending-auction collection.
#[derive(Parser, Debug)]
#[command(name = "arbi-cli", version, about = "Arbibots auction and revenue tools")]
struct Cli {
    /// Config file (default: <config dir>/arbi/arbi.toml, if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format ("text" or "json").
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the effective collection parameters as JSON.
    Params,
    /// Price for a given time into a pool's auction.
    Price(PriceArgs),
    /// Price table from the start of a pool until the floor.
    Schedule(ScheduleArgs),
    /// Apply a command log, printing every event as a JSON line.
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
struct PriceArgs {
    /// Seconds since the pool opened.
    #[arg(long)]
    elapsed: u64,
}

#[derive(Args, Debug)]
struct ScheduleArgs {
    /// Seconds between rows.
    #[arg(long, default_value_t = 3600)]
    step: u64,
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// JSON-lines command log.
    #[arg(long)]
    log: PathBuf,

    /// CSV allowlist for companion issuance (overrides the config file).
    #[arg(long)]
    allowlist: Option<PathBuf>,

    /// Opening time of the first pool (default: `now` of the first purchase).
    #[arg(long)]
    opened_at: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = NodeConfig::load(cli.config.as_deref())
        .context("Failed to load config")?
        .with_overrides(cli.log_level, cli.log_format)
        .context("Invalid command-line overrides")?;
    init_logging(&config.log_level, &config.log_format);

    match cli.command {
        Commands::Params => print_params(&config),
        Commands::Price(args) => print_price(&config, args),
        Commands::Schedule(args) => print_schedule(&config, args),
        Commands::Replay(args) => replay(config, args).await,
    }
}

fn print_params(config: &NodeConfig) -> Result<()> {
    let mut params = serde_json::to_value(&config.collection)?;
    params["tokens_per_pool"] = json!(config.collection.tokens_per_pool());
    println!("{}", serde_json::to_string_pretty(&params)?);
    Ok(())
}

fn print_price(config: &NodeConfig, args: PriceArgs) -> Result<()> {
    let engine = PricingEngine::from_params(&config.collection);
    println!("{}", units::format(engine.current_price(args.elapsed)));
    Ok(())
}

fn print_schedule(config: &NodeConfig, args: ScheduleArgs) -> Result<()> {
    anyhow::ensure!(args.step > 0, "--step must be positive");
    let engine = PricingEngine::from_params(&config.collection);
    println!("{:>10}  {:>24}", "elapsed", "price");
    for (elapsed, price) in engine.schedule(args.step) {
        println!("{:>10}  {:>24}", elapsed, units::format(price));
    }
    Ok(())
}

async fn replay(config: NodeConfig, args: ReplayArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.log)
        .with_context(|| format!("Failed to read command log: {}", args.log.display()))?;
    let commands = parse_log(&text).context("Invalid command log")?;

    let allowlist = match args.allowlist.or_else(|| config.allowlist_path.clone()) {
        Some(path) => {
            let csv = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read allowlist: {}", path.display()))?;
            Allowlist::parse_csv(&csv).context("Invalid allowlist")?
        }
        None => Allowlist::default(),
    };

    let opened_at = args.opened_at.unwrap_or_else(|| {
        commands
            .iter()
            .find_map(|cmd| match cmd {
                Command::Purchase { now, .. } => Some(*now),
                _ => None,
            })
            .unwrap_or(0)
    });

    let payouts = Arc::new(MemoryPayouts::new());
    let applier = Applier::from_config(&config, allowlist, opened_at, payouts.clone())
        .context("Failed to open collection")?;
    info!(commands = commands.len(), opened_at, "replaying command log");

    let printer = tokio::spawn(print_events(applier.subscribe()));

    let outcomes = applier.replay(&commands);
    for (idx, outcome) in outcomes.iter().enumerate() {
        if let Outcome::Rejected { error } = outcome {
            warn!(command = idx + 1, %error, "command rejected");
        }
    }

    let summary = applier.with_market(|m| {
        json!({
            "commands": outcomes.len(),
            "rejected": outcomes.iter().filter(|o| o.is_rejected()).count(),
            "issued": m.collection.supply().total_issued(),
            "phase": serde_json::to_value(m.collection.phase()).unwrap_or_default(),
            "total_collected": units::format(m.collection.total_collected()),
            "total_claimed": units::format(m.collection.total_claimed()),
            "balance": units::format(m.collection.balance()),
            "paid_out": units::format(payouts.total_paid()),
            "companions": m.cases.companion_supply(),
        })
    });
    drop(applier);
    printer.await.context("Event printer failed")?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn print_events(mut rx: broadcast::Receiver<arbi_core::Event>) {
    loop {
        match rx.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!("failed to encode event: {e}"),
            },
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("event printer lagged, skipped {n} events");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// Pass `format = "json"` for structured JSON output. Any other value
/// defaults to human-readable text. `RUST_LOG` takes precedence over `level`.
fn init_logging(level: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr so stdout stays machine-readable.
    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
