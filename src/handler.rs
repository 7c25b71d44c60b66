//! Invocation entry point.
//!
//! [`handle`] takes a trigger payload and an [`InvocationContext`], checks
//! configuration, lets the caller build the clients, runs the pipeline and
//! shapes the outcome into a [`HandlerResponse`]. A configuration error stops
//! the run before any client exists; any other error that escapes becomes a
//! generic `"Error: ..."` failure.

use crate::api::InsightGenerator;
use crate::config::{self, ConfigInputs, RunConfig};
use crate::error::AppError;
use crate::models::{HandlerResponse, RunResult};
use crate::outputs::ResultSink;
use crate::pipeline::Pipeline;
use crate::scrapers::PostSource;
use chrono::Utc;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument};

/// Runtime information about the current invocation.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    deadline: Instant,
}

impl InvocationContext {
    /// Context for an invocation allowed to run for `budget`.
    pub fn with_budget(budget: Duration) -> Self {
        Self {
            deadline: Instant::now() + budget,
        }
    }

    pub fn remaining_time(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// Run one invocation.
///
/// `connect` is only called once configuration is valid.
///
/// # Arguments
///
/// * `event` - Trigger payload; logged, otherwise unused
/// * `ctx` - Invocation context carrying the remaining time budget
/// * `inputs` - Raw configuration values from flags and environment
/// * `connect` - Builds the pipeline from a validated [`RunConfig`]
///
/// # Returns
///
/// The `{statusCode, body}` response: 200 with the run summary, or 500 with
/// the configuration message, the storage failure, or `"Error: ..."` for
/// anything else.
#[instrument(level = "info", skip_all)]
pub async fn handle<S, G, K, F, Fut>(
    event: &serde_json::Value,
    ctx: &InvocationContext,
    inputs: &ConfigInputs,
    connect: F,
) -> HandlerResponse
where
    S: PostSource,
    G: InsightGenerator,
    K: ResultSink,
    F: FnOnce(RunConfig) -> Fut,
    Fut: Future<Output = Result<Pipeline<S, G, K>, AppError>>,
{
    debug!(
        ?event,
        remaining_ms = ctx.remaining_time().as_millis() as u64,
        "Invocation received"
    );

    let result = match run(inputs, connect).await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "Run aborted");
            RunResult::failure(format!("Error: {e}"))
        }
    };

    info!(
        status = result.status_code,
        count = result.count,
        message = %result.message,
        "Invocation finished"
    );
    result.into()
}

async fn run<S, G, K, F, Fut>(inputs: &ConfigInputs, connect: F) -> Result<RunResult, AppError>
where
    S: PostSource,
    G: InsightGenerator,
    K: ResultSink,
    F: FnOnce(RunConfig) -> Fut,
    Fut: Future<Output = Result<Pipeline<S, G, K>, AppError>>,
{
    let config = match config::resolve(inputs).await {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Configuration incomplete");
            return Ok(RunResult::failure(e.to_string()));
        }
    };
    debug!(?config, "Configuration resolved");

    let pipeline = connect(config).await?;
    Ok(pipeline.run(Utc::now()).await)
}
