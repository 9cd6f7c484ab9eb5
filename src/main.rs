use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ratewarden::config::{LoggingConfig, WardenConfig};
use ratewarden::ratelimit::{RateLimitPolicy, RateLimiter, SystemClock, Tier};

/// In-process request rate limiting.
#[derive(Debug, Parser)]
#[command(name = "ratewarden", version, about)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load the configuration and print the effective tier table
    Validate,
    /// Run a burst of checks against a fresh limiter and print each decision
    Replay(ReplayArgs),
    /// Start the limiter with its janitor and run until interrupted
    Serve,
}

#[derive(Debug, Args)]
struct ReplayArgs {
    /// Caller identifier
    #[arg(long, default_value = "127.0.0.1")]
    identifier: String,

    /// Check against a tier policy
    #[arg(long, conflicts_with_all = ["window", "sliding_ms"])]
    tier: Option<String>,

    /// Fixed window length, e.g. "1m"
    #[arg(long, requires = "max", conflicts_with = "sliding_ms")]
    window: Option<String>,

    /// Sliding window length in milliseconds
    #[arg(long, requires = "max")]
    sliding_ms: Option<u64>,

    /// Request ceiling for --window or --sliding-ms
    #[arg(long)]
    max: Option<u64>,

    /// Number of checks to run
    #[arg(long, default_value_t = 1)]
    requests: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => WardenConfig::from_file(path)?,
        None => WardenConfig::default(),
    };

    init_tracing(&config.logging);

    match cli.command {
        Command::Validate => validate(&config),
        Command::Replay(args) => replay(&config, args),
        Command::Serve => serve(config).await,
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ratewarden={}", logging.level)));

    // Decisions go to stdout; logs go to stderr.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn validate(config: &WardenConfig) -> anyhow::Result<()> {
    info!("Configuration is valid");
    println!(
        "janitor_interval_secs: {}",
        config.ratelimit.janitor_interval_secs
    );
    println!("{}", serde_yaml::to_string(&config.ratelimit.tiers)?);
    Ok(())
}

fn replay(config: &WardenConfig, args: ReplayArgs) -> anyhow::Result<()> {
    let limiter = RateLimiter::with_clock(Arc::new(SystemClock), config.ratelimit.tiers);

    let fixed_policy = match (&args.window, args.max) {
        (Some(window), Some(max)) => Some(RateLimitPolicy::new(window, max)?),
        _ => None,
    };
    let tier: Option<Tier> = args.tier.as_deref().map(str::parse::<Tier>).transpose()?;

    for _ in 0..args.requests {
        let decision = if let Some(policy) = &fixed_policy {
            limiter.check_fixed_window(&args.identifier, policy)
        } else if let (Some(window_ms), Some(max)) = (args.sliding_ms, args.max) {
            limiter.check_sliding_window(&args.identifier, window_ms, max)?
        } else {
            limiter.check_tier(&args.identifier, tier.unwrap_or(Tier::Free))
        };
        println!("{}", serde_json::to_string(&decision)?);
    }

    Ok(())
}

async fn serve(config: WardenConfig) -> anyhow::Result<()> {
    info!("Starting Ratewarden");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let limiter = RateLimiter::start(&config.ratelimit);

    shutdown_signal().await;

    limiter.shutdown().await;
    info!("Ratewarden stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
