//! Spot Rebalancer - Main Entry Point
//!
//! Runs a single rebalancing cycle and exits. Scheduling is left to the
//! caller (cron, systemd timer, serverless scheduler).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use spot_rebalancer::config::Config;
use spot_rebalancer::exchange::FtxClient;
use spot_rebalancer::strategy::{CycleOutcome, RebalanceCycle};
use spot_rebalancer::utils::to_percent;
use std::process::ExitCode;
use tracing::{error, info, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::EnvFilter;

/// Spot Rebalancer CLI
#[derive(Parser)]
#[command(name = "spot-rebalancer")]
#[command(version, about = "Keep one currency's allocation inside a band on a spot-margin pair")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file name, extension optional
    #[arg(short, long, default_value = "config", global = true)]
    config: String,

    /// Decide without cancelling or placing any order
    #[arg(long, global = true)]
    dry_run: bool,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, global = true)]
    log_dir: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one rebalancing cycle (default)
    Run,

    /// Load and validate configuration without touching the network
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let _guard = init_logging(cli.log_dir.as_deref())?;

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_cycle(&cli.config, cli.dry_run).await,
        Commands::CheckConfig => load_config(&cli.config).map(|_| ()),
    };

    Ok(exit_code(result))
}

/// Log a failed command once and map it to a non-zero exit status.
fn exit_code(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load, validate and log configuration.
fn load_config(name: &str) -> Result<Config> {
    let config = Config::load_from(name)?;
    config.validate().context("Invalid configuration")?;
    log_config(&config);
    Ok(config)
}

async fn run_cycle(config_name: &str, dry_run: bool) -> Result<()> {
    info!(
        "Spot Rebalancer v{} - {} cycle",
        env!("CARGO_PKG_VERSION"),
        if dry_run { "dry-run" } else { "live" }
    );

    let config = load_config(config_name)?;
    let client = FtxClient::new(&config.exchange)?;

    let outcome = RebalanceCycle::new(&client, config.rebalance.clone())
        .dry_run(dry_run)
        .run()
        .await
        .context("Rebalancing cycle failed")?;

    match outcome {
        CycleOutcome::Hold => info!("Cycle complete: no trade"),
        CycleOutcome::DustSkipped {
            side,
            size,
            min_size,
        } => info!(
            "Cycle complete: {} of {} skipped, below minimum size {}",
            side, size, min_size
        ),
        CycleOutcome::OrderPlaced(order) => info!(
            "Cycle complete: {} order {} placed for {} {}",
            order.side, order.id, order.size, order.market
        ),
        CycleOutcome::WouldPlace(intent) => warn!(
            "Cycle complete (dry run): would {} {} {} at {}",
            intent.side, intent.size, intent.market, intent.price
        ),
    }

    Ok(())
}

/// Initialize logging to stderr and, optionally, a daily rolling file.
///
/// The returned guard flushes the file writer when dropped.
fn init_logging(log_dir: Option<&str>) -> Result<Option<WorkerGuard>> {
    let (writer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {dir}"))?;
            let file_appender = tracing_appender::rolling::daily(dir, "spot-rebalancer.log");
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            (
                BoxMakeWriter::new(std::io::stderr.and(file_writer)),
                Some(guard),
            )
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("spot_rebalancer=debug".parse()?)
                .add_directive(Level::INFO.into()),
        )
        .with_writer(writer)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .init();

    Ok(guard)
}

/// Log configuration on startup. Secrets are never printed.
fn log_config(config: &Config) {
    let rebalance = &config.rebalance;
    info!("Configuration:");
    info!("   Market: {} (tracking {})", rebalance.target_market, rebalance.currency);
    info!(
        "   Allocation band: {}% - {}%",
        to_percent(rebalance.lowest_balance),
        to_percent(rebalance.highest_balance)
    );
    info!("   Step per trade: {}%", to_percent(rebalance.offset_balance));
    info!(
        "   Price trigger: +/-{}% from last fill",
        to_percent(rebalance.offset_price_percent)
    );
    info!(
        "   Exchange: {} (sub-account {})",
        config.exchange.base_url, config.exchange.subaccount
    );
}
