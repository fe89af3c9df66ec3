//! Regard HealthCheck - end-to-end ingestion pipeline probe
//!
//! Sends one signed probe event to the tracking endpoint and waits until the
//! pipeline has written it to table storage.
//!
//! # Usage
//! ```sh
//! EndPointUrl=https://api.withregard.io ... cargo run -- --max-attempts 60
//! ```
//!
//! # Exit codes
//! - `0` event observed in storage
//! - `2` configuration error
//! - `3` ingestion endpoint unreachable
//! - `4` table storage unavailable
//! - `5` event not observed within the poll bounds
//! - `130` interrupted

use clap::Parser;
use regard_healthcheck::application::Prober;
use regard_healthcheck::config::{Config, ProbeSettings};
use regard_healthcheck::domain::ProbeError;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::prelude::*;

const INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(author, version, about = "End-to-end health check for the event ingestion pipeline", long_about = None)]
struct Cli {
    /// Maximum number of storage queries while waiting for the event
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Delay between storage queries, in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Give up waiting for the event after this many seconds
    #[arg(long)]
    max_duration_secs: Option<u64>,

    /// Skip the synthetic session event sent after a successful probe
    #[arg(long)]
    no_session_event: bool,
}

impl Cli {
    fn apply(&self, settings: &mut ProbeSettings) -> Result<(), ProbeError> {
        if let Some(max_attempts) = self.max_attempts {
            settings.max_attempts = max_attempts;
        }
        if let Some(ms) = self.poll_interval_ms {
            settings.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = self.max_duration_secs {
            settings.max_duration = Duration::from_secs(secs);
        }
        if self.no_session_event {
            settings.send_session_event = false;
        }
        settings.validate()
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("Regard HealthCheck {} starting...", env!("CARGO_PKG_VERSION"));

    tokio::select! {
        result = probe(&cli) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("HealthCheck: failed: {}", e);
                ExitCode::from(e.exit_code())
            }
        },
        _ = tokio::signal::ctrl_c() => {
            warn!("HealthCheck: interrupted before the event was observed");
            ExitCode::from(INTERRUPTED)
        }
    }
}

async fn probe(cli: &Cli) -> Result<(), ProbeError> {
    let mut config = Config::from_env()?;
    cli.apply(&mut config.probe)?;
    info!(
        "Configuration loaded: endpoint={}, table={}, partition={}, max_attempts={}, interval={:?}",
        config.endpoint_url,
        config.storage_table_name,
        config.partition_key,
        config.probe.max_attempts,
        config.probe.poll_interval
    );

    let prober = Prober::build(&config)?;
    let report = prober.run().await?;

    info!(
        "HealthCheck: {} observed after {} queries in {:?}",
        report.rowkey, report.poll_attempts, report.elapsed
    );
    Ok(())
}
