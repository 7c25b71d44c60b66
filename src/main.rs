//! # Reddit Insights
//!
//! A scheduled batch job that scans idea-hunting subreddits for business
//! opportunities. Recent posts are pulled from the PullPush search API, an
//! OpenAI model extracts structured insights from them, and the combined list
//! is written as one timestamped JSON object to S3.
//!
//! ## Usage
//!
//! ```sh
//! OUTPUT_BUCKET=my-bucket OPENAI_API_KEY=sk-... reddit_insights
//! ```
//!
//! ## Architecture
//!
//! One run is strictly sequential:
//! 1. **Configuration**: `OUTPUT_BUCKET` and `OPENAI_API_KEY` must resolve, or the run stops
//! 2. **Scraping**: up to 20 posts from the last 7 days per subreddit
//! 3. **Analysis**: one structured completion per subreddit that had posts
//! 4. **Output**: a single `reddit_insights_<YYYYMMDD_HHMMSS>.json` object
//!
//! The process prints the `{statusCode, body}` response and exits non-zero
//! when the run failed.

use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod handler;
mod models;
mod outputs;
mod pipeline;
mod prompts;
mod scrapers;
mod secrets;
mod utils;

use cli::Cli;
use config::Settings;
use error::AppError;
use handler::InvocationContext;
use pipeline::Pipeline;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("reddit_insights starting up");

    if let Ok(path) = dotenvy::dotenv() {
        debug!(path = %path.display(), "Loaded .env");
    }

    let args = Cli::parse();
    debug!(?args.config, ?args.local_output_dir, ?args.event, "Parsed CLI arguments");

    let settings = match Settings::load(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Could not load settings");
            return ExitCode::FAILURE;
        }
    };

    let event = match read_event(args.event.as_deref()) {
        Ok(event) => event,
        Err(e) => {
            error!(error = %e, "Could not read trigger payload");
            return ExitCode::FAILURE;
        }
    };

    let ctx = InvocationContext::with_budget(Duration::from_millis(args.time_budget_ms));
    let inputs = args.config_inputs();
    let response = handler::handle(&event, &ctx, &inputs, |config| {
        Pipeline::connect(config, &settings)
    })
    .await;

    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{json}"),
        Err(e) => error!(error = %e, "Failed to print response"),
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        status = response.status_code,
        "Execution complete"
    );

    if response.status_code == 200 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Trigger payload from `path`, or an empty object.
fn read_event(path: Option<&Path>) -> Result<serde_json::Value, AppError> {
    let Some(path) = path else {
        return Ok(serde_json::json!({}));
    };

    let describe = |reason: String| AppError::Event {
        path: path.display().to_string(),
        reason,
    };
    let raw = std::fs::read_to_string(path).map_err(|e| describe(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| describe(e.to_string()))
}
