//! # Goldline Autopilot Runner
//!
//! Loads the order book from disk and runs the collections autopilot.
//!
//! ## Usage
//! ```bash
//! # Run continuously (interval from config, default hourly)
//! cargo run -p goldline-autopilot
//!
//! # One cycle, then exit
//! cargo run -p goldline-autopilot -- --once
//!
//! # Decide and log, but write nothing back
//! cargo run -p goldline-autopilot -- --once --dry-run
//!
//! # Custom config file
//! cargo run -p goldline-autopilot -- --config ./autopilot.toml
//! ```
//!
//! Messages are logged through the dry-run transport; a real gateway plugs
//! in through `MessageTransport`.

use chrono::Utc;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use goldline_autopilot::{
    load_orders, Autopilot, AutopilotConfig, DryRunTransport, JsonFileSink, MessageLog,
    NullSink, OrderBook, OrderSink, TracingEmitter,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut config_path: Option<PathBuf> = None;
    let mut once = false;
    let mut dry_run = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--once" => once = true,
            "--dry-run" => dry_run = true,
            "--help" | "-h" => {
                println!("Goldline Collections Autopilot");
                println!();
                println!("Usage: goldline-autopilot [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("      --once           Run a single cycle and exit");
                println!("      --dry-run        Do not write orders or the message log");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            other => {
                warn!("Ignoring unknown argument: {}", other);
            }
        }
        i += 1;
    }

    let config = AutopilotConfig::load(config_path)?;
    let orders_dir = config.orders_dir()?;
    let orders = load_orders(&orders_dir).await?;
    info!(count = orders.len(), dir = ?orders_dir, "Orders loaded");

    // A dry run still spaces messages against the real log; it just never
    // writes to it.
    let messages_path = config.messages_path()?;
    let history = if dry_run {
        MessageLog::open_read_only(messages_path).await?
    } else {
        MessageLog::open(messages_path).await?
    };
    let sink: Arc<dyn OrderSink> = if dry_run {
        Arc::new(NullSink)
    } else {
        Arc::new(JsonFileSink::new(orders_dir))
    };

    let book = OrderBook::new(orders, config.settings.clone());
    let autopilot = Autopilot::with_emitter(
        book,
        Arc::new(DryRunTransport::new()),
        Arc::new(history),
        sink,
        Arc::new(TracingEmitter),
    );

    if once || config.autopilot.run_once {
        let report = autopilot.run_cycle(Utc::now()).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let handle = autopilot.spawn(config.cycle_interval());
    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received, stopping autopilot");
    handle.shutdown().await?;

    Ok(())
}

/// Initializes tracing with `RUST_LOG` support.
///
/// Default: INFO, with debug output from the goldline crates.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,goldline_autopilot=debug"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
