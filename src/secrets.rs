//! AWS Secrets Manager lookup.
//!
//! A secret's `SecretString` is expected to hold a flat JSON object, e.g.
//! `{"OUTPUT_BUCKET": "...", "OPENAI_API_KEY": "..."}`.

use crate::error::SecretError;
use aws_config::SdkConfig;
use aws_sdk_secretsmanager::Client;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

pub type SecretMap = Map<String, Value>;

/// Fetch `name` and decode its string value.
///
/// # Arguments
///
/// * `sdk` - Shared AWS configuration (region and credentials)
/// * `name` - Secret name or ARN
///
/// # Returns
///
/// The secret's JSON object, `Ok(None)` when the secret only has a binary
/// value, or a [`SecretError`] if the fetch failed or the string is not a
/// JSON object.
#[instrument(level = "info", skip(sdk))]
pub async fn get_secret(sdk: &SdkConfig, name: &str) -> Result<Option<SecretMap>, SecretError> {
    let client = Client::new(sdk);
    let output = client
        .get_secret_value()
        .secret_id(name)
        .send()
        .await
        .map_err(|e| SecretError::Fetch {
            name: name.to_string(),
            reason: DisplayErrorContext(&e).to_string(),
        })?;

    match output.secret_string() {
        Some(raw) => {
            let map = parse_secret(name, raw)?;
            info!(keys = map.len(), "Loaded secret");
            Ok(Some(map))
        }
        None => {
            warn!("Secret has no string value");
            Ok(None)
        }
    }
}

pub fn parse_secret(name: &str, raw: &str) -> Result<SecretMap, SecretError> {
    serde_json::from_str(raw).map_err(|source| SecretError::Parse {
        name: name.to_string(),
        source,
    })
}

/// Non-empty string value stored under `key`.
pub fn secret_str(map: &SecretMap, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
