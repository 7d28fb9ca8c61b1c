//! Goldrate Dashboard
//!
//! Shows Thai gold prices next to the CNY/THB rate a money-changer would
//! quote, and values gold holdings against them.

use std::time::Duration;

use clap::{Parser, Subcommand};
use goldrate_fx::RateSource;
use goldrate_gold::{GoldKind, Holding, WeightUnit};
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod controller;
mod metrics;

use config::DashboardConfig;
use controller::DashboardController;

/// Goldrate CLI
#[derive(Parser, Debug)]
#[command(name = "goldrate")]
#[command(about = "Thai gold prices and the CNY/THB street rate")]
struct Args {
    /// Emit JSON logs
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the CNY/THB rate once
    Rate,

    /// Record a rate read off a counter board
    Calibrate {
        /// Observed buy rate (THB per CNY); ignored with --reset
        #[arg(required_unless_present = "reset")]
        observed: Option<Decimal>,

        /// Reset the offset to zero instead
        #[arg(long)]
        reset: bool,
    },

    /// Fetch the latest gold prices
    Prices,

    /// Value a gold holding at today's prices
    Value {
        /// Weight held
        #[arg(long)]
        weight: Decimal,

        /// Weight unit: baht or gram
        #[arg(long, default_value = "baht")]
        unit: WeightUnit,

        /// Gold kind: bullion or ornament
        #[arg(long, default_value = "bullion")]
        kind: GoldKind,

        /// Total purchase cost in THB
        #[arg(long)]
        cost: Decimal,
    },

    /// Refresh rate and prices on an interval
    Watch {
        /// Refresh interval in seconds (defaults to the configured one)
        #[arg(long)]
        interval: Option<u64>,

        /// Run duration in seconds (0 = until Ctrl+C)
        #[arg(long, default_value = "0")]
        duration: u64,
    },
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.json);

    let mut config = DashboardConfig::from_env();
    if let Command::Watch {
        interval: Some(secs),
        ..
    } = &args.command
    {
        config.refresh_secs = *secs;
    }
    config.validate().map_err(anyhow::Error::msg)?;

    let controller = DashboardController::new(&config)?;

    match args.command {
        Command::Rate => {
            let rate = controller.current_rate().await.0;
            println!("CNY/THB {}  ({})", rate.rate(), rate.source.label());
            println!("  sell {}  offset {}  base {}", rate.sell(), rate.offset, rate.base.buy);
        }
        Command::Calibrate { reset: true, .. } => {
            controller.clear_calibration().await?;
            println!("Calibration reset");
        }
        Command::Calibrate {
            observed: Some(observed),
            ..
        } => {
            let offset = controller.calibrate(observed).await?;
            println!("Calibration offset: {offset}");
        }
        Command::Calibrate { observed: None, .. } => {
            anyhow::bail!("an observed rate is required unless --reset is given");
        }
        Command::Prices => match controller.prices().await {
            Some(p) => println!("{}", serde_json::to_string_pretty(&p)?),
            None => anyhow::bail!("gold prices unavailable"),
        },
        Command::Value {
            weight,
            unit,
            kind,
            cost,
        } => {
            let holding = Holding::new(weight, unit, cost).with_kind(kind);
            let valuation = controller.value(&holding).await?;
            println!("{}", serde_json::to_string_pretty(&valuation)?);
        }
        Command::Watch { duration, .. } => {
            info!(sources = ?controller.source_names(), "Watching");

            let duration = (duration > 0).then(|| Duration::from_secs(duration));
            controller.run(config.refresh_interval(), duration).await?;

            let metrics = controller.get_metrics().await;
            info!(
                refreshes = metrics.refreshes,
                cache_hits = metrics.cache_hits,
                degraded = metrics.degraded,
                gold_failures = metrics.gold_failures,
                degraded_ratio = metrics.degraded_ratio(),
                primary = metrics.count_for(RateSource::PrimaryScrape),
                secondary = metrics.count_for(RateSource::SecondaryScrape),
                tertiary = metrics.count_for(RateSource::TertiaryApi),
                last_rate = ?metrics.last_rate,
                "Watch complete"
            );
        }
    }

    Ok(())
}
