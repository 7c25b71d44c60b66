//! Error types for each stage of a run.
//!
//! Every component boundary returns its own error enum so the pipeline can
//! decide, at the call site, whether a failure degrades to an empty result
//! (scraping, generation) or fails the run (configuration, storage).

use thiserror::Error;

/// Failure while fetching or decoding posts for one subreddit.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("search response was not understood: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure while asking the model for insights.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("failed to encode posts for the prompt: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("completion API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("completion response had no message content")]
    EmptyResponse,

    #[error("model output did not match the insights schema: {0}")]
    Schema(#[from] serde_json::Error),
}

/// Failure while persisting the run artifact.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to serialize insights: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("object upload failed: {0}")]
    Upload(String),

    #[error("failed to write artifact: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while reading a secret from the secret store.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("failed to fetch secret {name}: {reason}")]
    Fetch { name: String, reason: String },

    #[error("secret {name} is not a JSON object: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Missing or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Secret(#[from] SecretError),
}

/// Anything else that stops a run before it can finish.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid endpoint URL: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("failed to read trigger payload {path}: {reason}")]
    Event { path: String, reason: String },
}
