//! PullPush submission search scraper.
//!
//! PullPush mirrors the Reddit submission archive behind a public JSON API:
//!
//! ```text
//! GET https://api.pullpush.io/reddit/search/submission/
//!     ?subreddit=AppIdeas&size=20&after=<unix secs>&sort_type=score
//! ```
//!
//! The response is `{"data": [ {submission}, ... ]}`. Only a handful of
//! fields are used; anything missing or mistyped falls back to an empty
//! value, except the creation time, without which a submission is dropped.

use super::{PostSource, SEARCH_PAGE_SIZE, SEARCH_WINDOW_DAYS};
use crate::error::{AppError, ScrapeError};
use crate::models::Post;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration as StdDuration, Instant};
use tracing::{debug, info, instrument};
use url::Url;

pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.pullpush.io/reddit/search/submission/";

// Items stay untyped so one odd submission cannot fail the whole page.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: Vec<Value>,
}

#[derive(Debug, Default)]
struct RawSubmission {
    title: Option<String>,
    selftext: Option<String>,
    subreddit: Option<String>,
    created_utc: Option<f64>,
    ups: Option<i64>,
}

impl RawSubmission {
    /// Pick the known fields out of one item; wrong types read as absent.
    fn from_value(item: &Value) -> Self {
        let text = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            title: text("title"),
            selftext: text("selftext"),
            subreddit: text("subreddit"),
            created_utc: item.get("created_utc").and_then(Value::as_f64),
            ups: item.get("ups").and_then(|v| {
                v.as_i64().or_else(|| v.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            }),
        }
    }
}

/// HTTP client for the PullPush search endpoint.
#[derive(Debug, Clone)]
pub struct PullPushClient {
    http: Client,
    endpoint: Url,
}

impl PullPushClient {
    /// Build a client for the search endpoint.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Absolute URL of the submission search route
    /// * `timeout` - Per-request timeout covering connect, send and body read
    ///
    /// # Returns
    ///
    /// The client, or an [`AppError`] if the endpoint is not a valid URL or
    /// the HTTP client cannot be built.
    pub fn new(endpoint: &str, timeout: StdDuration) -> Result<Self, AppError> {
        let http = Client::builder().timeout(timeout).build()?;
        let endpoint = Url::parse(endpoint)?;
        Ok(Self { http, endpoint })
    }

    /// Search URL for the posts of `subreddit` made in the window ending at `now`.
    pub fn search_url(&self, subreddit: &str, now: DateTime<Utc>) -> Url {
        let after = (now - Duration::days(SEARCH_WINDOW_DAYS)).timestamp();
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("subreddit", subreddit)
            .append_pair("size", &SEARCH_PAGE_SIZE.to_string())
            .append_pair("after", &after.to_string())
            .append_pair("sort_type", "score");
        url
    }
}

impl PostSource for PullPushClient {
    #[instrument(level = "info", skip(self, now))]
    async fn fetch_posts(
        &self,
        subreddit: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Post>, ScrapeError> {
        let url = self.search_url(subreddit, now);
        debug!(%url, "Searching submissions");

        let t0 = Instant::now();
        let body = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let posts = parse_search_response(&body, subreddit)?;
        info!(
            count = posts.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched submissions"
        );
        Ok(posts)
    }
}

/// Decode a search response body into at most [`SEARCH_PAGE_SIZE`] posts.
///
/// Only a body that is not JSON, or lacks the `data` array, is an error.
/// Individual submissions without a usable timestamp are skipped.
fn parse_search_response(body: &str, subreddit: &str) -> Result<Vec<Post>, ScrapeError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    let total = response.data.len();

    let posts: Vec<Post> = response
        .data
        .into_iter()
        .filter_map(|item| normalize(RawSubmission::from_value(&item), subreddit))
        .take(SEARCH_PAGE_SIZE)
        .collect();

    if posts.len() < total.min(SEARCH_PAGE_SIZE) {
        debug!(
            kept = posts.len(),
            received = total,
            "Dropped submissions without a usable timestamp"
        );
    }
    Ok(posts)
}

fn normalize(raw: RawSubmission, subreddit: &str) -> Option<Post> {
    let created = raw.created_utc.filter(|t| t.is_finite())?;
    let secs = created.trunc() as i64;
    let nanos = (created.fract() * 1e9) as u32;
    let posted_at = DateTime::from_timestamp(secs, nanos)?;

    Some(Post {
        title: raw.title.unwrap_or_default(),
        text: raw.selftext.unwrap_or_default(),
        source_name: raw.subreddit.unwrap_or_else(|| subreddit.to_string()),
        posted_at,
        score: raw.ups.unwrap_or_default(),
    })
}
