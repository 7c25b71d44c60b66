//! Data models shared by the scraper, the model client and the sinks.
//!
//! - [`Post`]: a normalized submission scraped from a subreddit
//! - [`Insight`]: one business opportunity extracted by the model
//! - [`InsightBatch`]: the object the model returns for one subreddit
//! - [`RunResult`] / [`HandlerResponse`]: the outcome of a run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A submission scraped from a subreddit.
///
/// Serialized field names match what the model is told about posts
/// (`subreddit`, `date`), not the Rust field names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub title: String,
    /// Self-text of the submission; empty for link posts.
    pub text: String,
    #[serde(rename = "subreddit")]
    pub source_name: String,
    #[serde(rename = "date")]
    pub posted_at: DateTime<Utc>,
    pub score: i64,
}

/// A business opportunity extracted from a batch of posts.
///
/// `validation` and `mvp_scope` hold newline-separated points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    /// Clear one-sentence problem statement.
    pub problem: String,
    /// Who needs this.
    pub target_users: String,
    /// Supporting evidence from the posts.
    pub validation: String,
    /// Core features for a minimum viable solution.
    pub mvp_scope: String,
    /// How to quickly test market interest.
    pub verification_method: String,
}

/// The structured response requested from the model.
#[derive(Debug, Default, Deserialize)]
pub struct InsightBatch {
    #[serde(default)]
    pub insights: Vec<Insight>,
}

/// Outcome of one run, before it is shaped into a [`HandlerResponse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub status_code: u16,
    pub message: String,
    pub output_location: Option<String>,
    pub count: usize,
}

impl RunResult {
    pub const SUCCESS_MESSAGE: &'static str = "Analysis completed successfully";

    pub fn success(output_location: String, count: usize) -> Self {
        Self {
            status_code: 200,
            message: Self::SUCCESS_MESSAGE.to_string(),
            output_location: Some(output_location),
            count,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status_code: 500,
            message: message.into(),
            output_location: None,
            count: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Response returned by the handler: a status code plus a JSON-encoded body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl From<RunResult> for HandlerResponse {
    fn from(result: RunResult) -> Self {
        // Failures carry a bare JSON string; success carries the summary object.
        let body = match (result.is_success(), result.output_location) {
            (true, Some(location)) => serde_json::json!({
                "message": result.message,
                "output_location": location,
                "count": result.count,
            })
            .to_string(),
            _ => serde_json::Value::String(result.message).to_string(),
        };

        Self {
            status_code: result.status_code,
            body,
        }
    }
}
