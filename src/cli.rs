//! Command-line interface definitions.
//!
//! Every required value can come from a flag or from the environment (a
//! `.env` file is loaded first), which is how the scheduled job is
//! configured in practice.

use crate::config::{ConfigInputs, DEFAULT_AWS_REGION};
use clap::Parser;
use std::path::PathBuf;

/// Scrape idea-hunting subreddits and store the business opportunities an
/// LLM finds in them.
///
/// # Examples
///
/// ```sh
/// # Production run: credentials from the environment, artifact to S3
/// OUTPUT_BUCKET=my-bucket OPENAI_API_KEY=sk-... reddit_insights
///
/// # Credentials from Secrets Manager
/// OUTPUT_BUCKET=my-bucket reddit_insights --secret-name reddit-insights/prod
///
/// # Local run writing ./out/my-bucket/reddit_insights_<ts>.json
/// reddit_insights -l ./out -c settings.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Bucket the insights artifact is written to
    #[arg(long, env = "OUTPUT_BUCKET")]
    pub output_bucket: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Region for S3 and Secrets Manager
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_AWS_REGION)]
    pub aws_region: String,

    /// Secrets Manager secret to read missing OUTPUT_BUCKET / OPENAI_API_KEY from
    #[arg(long, env = "SECRET_NAME")]
    pub secret_name: Option<String>,

    /// Optional path to a YAML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Write the artifact under this directory instead of uploading to S3
    #[arg(short, long)]
    pub local_output_dir: Option<PathBuf>,

    /// JSON file with the trigger payload handed to the handler
    #[arg(short, long)]
    pub event: Option<PathBuf>,

    /// Time budget of the invocation, in milliseconds
    #[arg(long, default_value_t = 900_000)]
    pub time_budget_ms: u64,
}

impl Cli {
    pub fn config_inputs(&self) -> ConfigInputs {
        ConfigInputs {
            output_bucket: self.output_bucket.clone(),
            openai_api_key: self.openai_api_key.clone(),
            aws_region: Some(self.aws_region.clone()),
            secret_name: self.secret_name.clone(),
            local_output_dir: self.local_output_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "reddit_insights",
            "--output-bucket",
            "insights-bucket",
            "--openai-api-key",
            "sk-test",
            "--aws-region",
            "eu-west-1",
        ]);

        let inputs = cli.config_inputs();
        assert_eq!(inputs.output_bucket.as_deref(), Some("insights-bucket"));
        assert_eq!(inputs.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(inputs.region(), "eu-west-1");
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "reddit_insights",
            "-l",
            "/tmp/out",
            "-c",
            "settings.yaml",
            "-e",
            "event.json",
        ]);

        assert_eq!(cli.local_output_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(cli.config.as_deref(), Some("settings.yaml"));
        assert_eq!(cli.event, Some(PathBuf::from("event.json")));
    }

    #[test]
    fn test_cli_time_budget_default() {
        let cli = Cli::parse_from(["reddit_insights"]);
        assert_eq!(cli.time_budget_ms, 900_000);
    }
}
