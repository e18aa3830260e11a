//! Outreach worker: processes one campaign end-to-end and exits.
//!
//! Invoked by the queue layer with a campaign identifier. Exit codes:
//! 0 for completed or cleanly paused runs, 1 for failed campaigns, 2 for
//! configuration errors raised before any session was acquired.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use outreach_core::config::AppConfig;
use outreach_core::error::{OutreachError, OutreachResult};
use outreach_driver::ChromeDriver;
use outreach_orchestrator::{CampaignRunner, RunOutcome, RunnerConfig};
use outreach_store::SqliteStore;

#[derive(Parser, Debug)]
#[command(name = "outreach-worker")]
#[command(about = "Runs one outreach campaign end-to-end")]
#[command(version)]
struct Cli {
    /// Campaign to process
    #[arg(long, env = "OUTREACH__CAMPAIGN_ID")]
    campaign_id: String,

    /// Database location (overrides config)
    #[arg(long, env = "OUTREACH__DATABASE_URL")]
    database_url: Option<String>,

    /// Run the browser with a visible window for debugging
    #[arg(long, default_value_t = false)]
    headful: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "outreach_worker=info,outreach=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(outcome) => {
            info!(outcome = outcome.as_str(), "worker finished");
            ExitCode::from(outcome.exit_code())
        }
        Err(error) => {
            let code = if error.is_configuration() { 2 } else { 1 };
            error!(error = %error, "worker failed");
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli) -> OutreachResult<RunOutcome> {
    let campaign_id = Uuid::parse_str(&cli.campaign_id).map_err(|e| {
        OutreachError::Config(format!("invalid campaign id {:?}: {e}", cli.campaign_id))
    })?;

    let mut config = AppConfig::load()
        .map_err(|e| OutreachError::Config(format!("failed to load configuration: {e}")))?;
    if let Some(url) = cli.database_url {
        config.database_url = Some(url);
    }
    if cli.headful {
        config.browser.headless = false;
    }
    let database_url = config.database_url.clone().ok_or_else(|| {
        OutreachError::Config("no database URL configured (set DATABASE_URL)".to_string())
    })?;

    info!(campaign_id = %campaign_id, "worker starting");

    let store = Arc::new(SqliteStore::open(&database_url)?);
    let driver = ChromeDriver::new(config.browser.clone());
    let mut runner = CampaignRunner::new(driver, Arc::clone(&store), store)
        .with_config(RunnerConfig::from_app(&config));

    runner.run(campaign_id).await
}
