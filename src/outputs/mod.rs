//! Persisting the run artifact.
//!
//! Each run writes exactly one object: a JSON array of every insight found,
//! indented with four spaces, keyed by the run's start time.
//!
//! # Backends
//!
//! - [`s3`]: `PutObject` into the configured bucket (the production path)
//! - [`local`]: a file under a local directory, for runs away from AWS
//!
//! ```text
//! s3://<bucket>/reddit_insights_20250506_143000.json
//! file://<dir>/<bucket>/reddit_insights_20250506_143000.json
//! ```

use crate::error::SinkError;
use crate::models::Insight;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::{info, instrument};

pub mod local;
pub mod s3;

pub const CONTENT_TYPE: &str = "application/json";

/// A store that accepts one JSON object per run.
pub trait ResultSink {
    /// Short backend name used in failure messages.
    fn backend(&self) -> &'static str;

    /// Write `body` under `key` and return the object's location URI.
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<String, SinkError>;
}

/// Object key for a run started at `started_at`.
pub fn artifact_key(started_at: DateTime<Utc>) -> String {
    format!("reddit_insights_{}.json", started_at.format("%Y%m%d_%H%M%S"))
}

/// Serialize insights as a four-space indented JSON array.
pub fn render_artifact(insights: &[Insight]) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    insights.serialize(&mut ser)?;
    Ok(buf)
}

/// Render `insights` and write them through `sink`.
///
/// # Arguments
///
/// * `sink` - Destination backend
/// * `key` - Object key, usually from [`artifact_key`]
/// * `insights` - Insights to store; an empty slice still writes `[]`
///
/// # Returns
///
/// The location reported by the sink, or a [`SinkError`] if rendering or
/// the write failed.
#[instrument(level = "info", skip_all, fields(backend = sink.backend(), %key, count = insights.len()))]
pub async fn store_insights<K: ResultSink>(
    sink: &K,
    key: &str,
    insights: &[Insight],
) -> Result<String, SinkError> {
    let body = render_artifact(insights)?;
    let bytes = body.len();
    let location = sink.put_object(key, body).await?;
    info!(%location, bytes, "Stored insights artifact");
    Ok(location)
}

/// The sink chosen at startup.
#[derive(Debug)]
pub enum Sink {
    S3(s3::S3Sink),
    Local(local::LocalSink),
}

impl ResultSink for Sink {
    fn backend(&self) -> &'static str {
        match self {
            Sink::S3(sink) => sink.backend(),
            Sink::Local(sink) => sink.backend(),
        }
    }

    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<String, SinkError> {
        match self {
            Sink::S3(sink) => sink.put_object(key, body).await,
            Sink::Local(sink) => sink.put_object(key, body).await,
        }
    }
}
