use std::{path::PathBuf, time::Duration};

use clap::Parser;
use eyre::Result;
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

use tron_tx_extract::config::{Mode, RunConfig, TimeWindow, DEFAULT_BASE_URL};
use tron_tx_extract::extract;

#[derive(Parser, Debug)]
#[command(name = "tron-tx-extract", version)]
struct Cli {
    /// TronGrid API key, sent as TRON-PRO-API-KEY
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    api_key: String,

    /// CSV with an `addressName` column
    #[arg(long, env = "INPUT_CSV", default_value = "tron_address_withdraw.csv")]
    input: PathBuf,

    /// Output CSV path
    #[arg(long, env = "OUTPUT_CSV", default_value = "tron_txs.csv")]
    output: PathBuf,

    /// Window start, UTC (YYYY-MM-DD[ HH:MM[:SS]])
    #[arg(long, env = "START_TIME", default_value = "2025-08-09 00:00:00")]
    start: String,

    /// Window end, UTC, inclusive
    #[arg(long, env = "END_TIME", default_value = "2025-08-12 00:00:00")]
    end: String,

    /// Records per page (TronGrid maximum is 200)
    #[arg(long, env = "PAGE_SIZE", default_value_t = 200)]
    page_size: u32,

    /// Native TRX transfers or TRC-20 token transfers
    #[arg(long, env = "MODE", value_enum, default_value_t = Mode::Trc20)]
    mode: Mode,

    /// TronGrid API base URL
    #[arg(long, env = "TRONGRID_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Pause between page requests, in milliseconds
    #[arg(long, env = "PAGE_DELAY_MS", default_value_t = 200)]
    page_delay_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,
}

impl Cli {
    fn into_config(self) -> Result<RunConfig> {
        let config = RunConfig {
            window: TimeWindow::parse(&self.start, &self.end)?,
            api_key: self.api_key,
            base_url: self.base_url,
            input: self.input,
            output: self.output,
            page_size: self.page_size,
            mode: self.mode,
            page_delay: Duration::from_millis(self.page_delay_ms),
            request_timeout: Duration::from_secs(self.timeout_secs),
        };
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    Subscriber::builder().with_env_filter(filter).init();

    let config = Cli::parse().into_config()?;
    tracing::info!(
        mode = config.mode.label(),
        min_timestamp = config.window.min_timestamp,
        max_timestamp = config.window.max_timestamp,
        page_size = config.page_size,
        "Starting extraction"
    );

    let summary = extract::run_from_config(&config).await?;

    tracing::info!(
        addresses = summary.addresses,
        rows = summary.rows,
        skipped_records = summary.skipped_records,
        failed_addresses = summary.failed_addresses,
        "Done! All {} transactions saved in {}",
        config.mode.label(),
        config.output.display()
    );
    Ok(())
}
