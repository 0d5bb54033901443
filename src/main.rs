//! Ordergate - security layer for the order-fulfillment API
//!
//! Loads the security configuration, assembles the authentication handlers
//! and authorization policies fail-fast, and reports what is enabled. The
//! hosting pipeline embeds the same stack via the library crate.

use clap::Parser;
use ordergate::auth::certificate::unavailable_resolver;
use ordergate::clock::SystemClock;
use ordergate::{Config, SecurityStack};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Ordergate - authentication/authorization layer for order fulfillment
#[derive(Parser, Debug)]
#[command(name = "ordergate")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Ordergate v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::load(&args.config)?;
    info!("Loaded configuration from {:?}", args.config);

    // Assemble the security stack; an enabled handler with an invalid
    // configuration stops the process here rather than serving traffic.
    let stack = SecurityStack::build(
        &config.security,
        Arc::new(SystemClock),
        unavailable_resolver(),
    )?;

    for handler in stack.handlers() {
        info!(
            handler = %handler.handler_type(),
            enabled = handler.enabled(),
            strength = ?handler.strength(),
            challenge_capable = handler.can_generate_challenge(),
            "Registered authentication handler"
        );
    }

    for policy in stack.policies() {
        info!(
            policy = %policy.policy(),
            enabled = policy.enabled(),
            priority = ?policy.priority(),
            "Registered authorization policy"
        );
    }

    info!("Security stack is valid");

    Ok(())
}
