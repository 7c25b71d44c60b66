//! Run configuration.
//!
//! Two layers:
//!
//! - [`Settings`]: optional YAML file with the model, endpoints and source
//!   list. Every field has a built-in default, so the file may be absent.
//! - [`RunConfig`]: the values a run cannot start without (`OUTPUT_BUCKET`
//!   and `OPENAI_API_KEY`), taken from flags/environment first and, when a
//!   secret name is given, from AWS Secrets Manager.

use crate::api::{DEFAULT_MODEL, DEFAULT_OPENAI_BASE_URL};
use crate::error::ConfigError;
use crate::scrapers::SUBREDDITS;
use crate::scrapers::pullpush::DEFAULT_SEARCH_ENDPOINT;
use crate::secrets::{self, SecretMap, secret_str};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, instrument};

pub const OUTPUT_BUCKET: &str = "OUTPUT_BUCKET";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Tunables loaded from the optional settings file.
///
/// ```yaml
/// model: gpt-4o
/// scrape_timeout_secs: 10
/// sources:
///   - SideProject
///   - AppIdeas
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub model: String,
    pub openai_base_url: String,
    pub search_endpoint: String,
    pub scrape_timeout_secs: u64,
    pub sources: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            search_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            scrape_timeout_secs: 10,
            sources: SUBREDDITS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or the defaults when no path is given.
    ///
    /// # Arguments
    ///
    /// * `path` - Optional YAML settings file; missing keys keep their defaults
    ///
    /// # Returns
    ///
    /// The settings, or a [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            debug!("No settings file; using defaults");
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let settings = Self::from_yaml(path, &raw)?;
        info!(path, sources = settings.sources.len(), model = %settings.model, "Loaded settings");
        Ok(settings)
    }

    fn from_yaml(path: &str, raw: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_secs(self.scrape_timeout_secs)
    }
}

/// Raw configuration as handed over by the entry point.
#[derive(Debug, Clone, Default)]
pub struct ConfigInputs {
    pub output_bucket: Option<String>,
    pub openai_api_key: Option<String>,
    pub aws_region: Option<String>,
    pub secret_name: Option<String>,
    pub local_output_dir: Option<PathBuf>,
}

impl ConfigInputs {
    pub fn region(&self) -> &str {
        self.aws_region
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_AWS_REGION)
    }
}

/// Validated configuration for one run.
#[derive(Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub output_bucket: String,
    pub openai_api_key: String,
    pub aws_region: String,
    pub local_output_dir: Option<PathBuf>,
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("output_bucket", &self.output_bucket)
            .field("openai_api_key", &"<redacted>")
            .field("aws_region", &self.aws_region)
            .field("local_output_dir", &self.local_output_dir)
            .finish()
    }
}

impl RunConfig {
    /// Validate `inputs`, filling gaps from `secret` when one was loaded.
    ///
    /// `OUTPUT_BUCKET` is checked before `OPENAI_API_KEY`; empty strings
    /// count as missing.
    pub fn from_inputs(inputs: &ConfigInputs, secret: Option<&SecretMap>) -> Result<Self, ConfigError> {
        let lookup = |value: &Option<String>, key: &'static str| {
            value
                .clone()
                .filter(|v| !v.is_empty())
                .or_else(|| secret.and_then(|map| secret_str(map, key)))
                .ok_or(ConfigError::Missing(key))
        };

        let output_bucket = lookup(&inputs.output_bucket, OUTPUT_BUCKET)?;
        let openai_api_key = lookup(&inputs.openai_api_key, OPENAI_API_KEY)?;

        Ok(Self {
            output_bucket,
            openai_api_key,
            aws_region: inputs.region().to_string(),
            local_output_dir: inputs.local_output_dir.clone(),
        })
    }
}

/// Resolve the run configuration, consulting the secret store only when a
/// secret name is set and a required value is still missing.
#[instrument(level = "info", skip_all)]
pub async fn resolve(inputs: &ConfigInputs) -> Result<RunConfig, ConfigError> {
    let missing = |v: &Option<String>| v.as_deref().is_none_or(str::is_empty);
    let needs_secret = missing(&inputs.output_bucket) || missing(&inputs.openai_api_key);

    let secret = match inputs.secret_name.as_deref() {
        Some(name) if needs_secret => {
            let sdk = sdk_config(inputs.region()).await;
            secrets::get_secret(&sdk, name).await?
        }
        _ => None,
    };

    RunConfig::from_inputs(inputs, secret.as_ref())
}

/// Shared AWS SDK configuration for `region`.
pub async fn sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(bucket: Option<&str>, key: Option<&str>) -> ConfigInputs {
        ConfigInputs {
            output_bucket: bucket.map(str::to_string),
            openai_api_key: key.map(str::to_string),
            ..ConfigInputs::default()
        }
    }

    #[test]
    fn test_from_inputs_accepts_complete_config() {
        let config = RunConfig::from_inputs(&inputs(Some("insights-bucket"), Some("sk-test")), None).unwrap();
        assert_eq!(config.output_bucket, "insights-bucket");
        assert_eq!(config.openai_api_key, "sk-test");
        assert_eq!(config.aws_region, DEFAULT_AWS_REGION);
    }

    #[test]
    fn test_missing_bucket_is_reported_first() {
        let err = RunConfig::from_inputs(&inputs(None, None), None).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(OUTPUT_BUCKET)));
    }

    #[test]
    fn test_missing_api_key() {
        let err = RunConfig::from_inputs(&inputs(Some("insights-bucket"), None), None).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(OPENAI_API_KEY)));
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        let err = RunConfig::from_inputs(&inputs(Some(""), Some("sk-test")), None).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(OUTPUT_BUCKET)));
    }

    #[test]
    fn test_secret_fills_missing_values() {
        let secret = secrets::parse_secret(
            "insights/prod",
            r#"{"OUTPUT_BUCKET": "from-secret", "OPENAI_API_KEY": "sk-secret"}"#,
        )
        .unwrap();

        let config = RunConfig::from_inputs(&inputs(Some("from-env"), None), Some(&secret)).unwrap();
        assert_eq!(config.output_bucket, "from-env");
        assert_eq!(config.openai_api_key, "sk-secret");
    }

    #[test]
    fn test_region_defaults_when_empty() {
        let mut inputs = inputs(None, None);
        inputs.aws_region = Some(String::new());
        assert_eq!(inputs.region(), "us-east-1");
        inputs.aws_region = Some("eu-west-1".to_string());
        assert_eq!(inputs.region(), "eu-west-1");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = RunConfig::from_inputs(&inputs(Some("b"), Some("sk-very-secret")), None).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_resolve_skips_secret_store_when_complete() {
        let mut inputs = inputs(Some("insights-bucket"), Some("sk-test"));
        inputs.secret_name = Some("insights/prod".to_string());

        let config = resolve(&inputs).await.unwrap();
        assert_eq!(config.output_bucket, "insights-bucket");
    }

    #[tokio::test]
    async fn test_resolve_without_secret_name_reports_missing() {
        let err = resolve(&inputs(Some("insights-bucket"), None)).await.unwrap_err();
        assert_eq!(err.to_string(), "OPENAI_API_KEY environment variable not set");
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.sources.len(), 19);
        assert_eq!(settings.sources[0], "SomebodyMakeThis");
        assert_eq!(settings.scrape_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_settings_partial_yaml_keeps_defaults() {
        let settings = Settings::from_yaml("settings.yaml", "model: gpt-4o-mini\nsources: [AppIdeas]\n").unwrap();
        assert_eq!(settings.model, "gpt-4o-mini");
        assert_eq!(settings.sources, vec!["AppIdeas".to_string()]);
        assert_eq!(settings.search_endpoint, DEFAULT_SEARCH_ENDPOINT);
    }

    #[test]
    fn test_settings_invalid_yaml() {
        let err = Settings::from_yaml("settings.yaml", "scrape_timeout_secs: soon").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_settings_missing_file() {
        let err = Settings::load(Some("/nonexistent/reddit_insights.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
