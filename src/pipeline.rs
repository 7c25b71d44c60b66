//! The per-run loop: scrape each subreddit, ask for insights, store once.
//!
//! Sources are processed strictly one after another. A source that fails to
//! scrape, or whose completion fails, contributes nothing and the loop moves
//! on; only the final store decides whether the run succeeded.

use crate::api::{InsightGenerator, OpenAiClient};
use crate::config::{RunConfig, Settings, sdk_config};
use crate::error::AppError;
use crate::models::{Insight, Post, RunResult};
use crate::outputs::local::LocalSink;
use crate::outputs::s3::S3Sink;
use crate::outputs::{ResultSink, Sink, artifact_key, store_insights};
use crate::scrapers::PostSource;
use crate::scrapers::pullpush::PullPushClient;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument, warn};

/// Clients for one process, reused for every run.
#[derive(Debug)]
pub struct Pipeline<S, G, K> {
    scraper: S,
    generator: G,
    sink: K,
    sources: Vec<String>,
}

impl Pipeline<PullPushClient, OpenAiClient, Sink> {
    /// Build the production clients from validated configuration.
    pub async fn connect(config: RunConfig, settings: &Settings) -> Result<Self, AppError> {
        let scraper = PullPushClient::new(&settings.search_endpoint, settings.scrape_timeout())?;
        let generator = OpenAiClient::new(
            &settings.openai_base_url,
            config.openai_api_key,
            settings.model.clone(),
        )?;

        let sink = match config.local_output_dir {
            Some(dir) => {
                info!(dir = %dir.display(), "Writing artifact to local directory");
                Sink::Local(LocalSink::new(dir, &config.output_bucket))
            }
            None => {
                let sdk = sdk_config(&config.aws_region).await;
                Sink::S3(S3Sink::new(aws_sdk_s3::Client::new(&sdk), config.output_bucket))
            }
        };

        Ok(Self::new(scraper, generator, sink, settings.sources.clone()))
    }
}

impl<S, G, K> Pipeline<S, G, K>
where
    S: PostSource,
    G: InsightGenerator,
    K: ResultSink,
{
    pub fn new(scraper: S, generator: G, sink: K, sources: Vec<String>) -> Self {
        Self {
            scraper,
            generator,
            sink,
            sources,
        }
    }

    /// Process every source and store the collected insights under a key
    /// derived from `started_at`.
    ///
    /// Scrape and generation failures are logged and count as empty results.
    ///
    /// # Arguments
    ///
    /// * `started_at` - Run start time that names the artifact
    ///
    /// # Returns
    ///
    /// A success [`RunResult`] with the artifact location and insight count,
    /// or a failure if the artifact could not be stored.
    #[instrument(level = "info", skip(self), fields(sources = self.sources.len()))]
    pub async fn run(&self, started_at: DateTime<Utc>) -> RunResult {
        let mut collected: Vec<Insight> = Vec::new();

        for source in &self.sources {
            info!(%source, "Processing subreddit");

            let posts: Vec<Post> = match self.scraper.fetch_posts(source, started_at).await {
                Ok(posts) => posts,
                Err(e) => {
                    warn!(%source, error = %e, "Scrape failed; treating subreddit as empty");
                    Vec::new()
                }
            };

            if posts.is_empty() {
                debug!(%source, "No posts; skipping insight generation");
                continue;
            }

            match self.generator.generate(&posts).await {
                Ok(insights) => {
                    info!(%source, posts = posts.len(), insights = insights.len(), "Generated insights");
                    collected.extend(insights);
                }
                Err(e) => {
                    warn!(%source, error = %e, "Insight generation failed; no insights from subreddit");
                }
            }
        }

        let key = artifact_key(started_at);
        match store_insights(&self.sink, &key, &collected).await {
            Ok(location) => RunResult::success(location, collected.len()),
            Err(e) => {
                error!(%key, error = %e, "Failed to store insights");
                RunResult::failure(format!("Failed to save results to {}", self.sink.backend()))
            }
        }
    }
}
