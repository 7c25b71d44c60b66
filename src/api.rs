//! OpenAI chat-completions interaction.
//!
//! One request is made per subreddit: the analysis prompt goes in the
//! `developer` turn, the scraped posts (as JSON text) in the `user` turn, and
//! the response is constrained to [`prompts::insights_schema`].
//!
//! # Architecture
//!
//! - [`InsightGenerator`]: trait the pipeline calls, so tests can stand in a fake
//! - [`OpenAiClient`]: the HTTP implementation
//!
//! There is no retry. A failed or non-conforming completion comes back as a
//! [`GenerateError`] and the pipeline records zero insights for that source.

use crate::error::{AppError, GenerateError};
use crate::models::{Insight, InsightBatch, Post};
use crate::prompts;
use crate::scrapers::SEARCH_WINDOW_DAYS;
use crate::utils::{looks_truncated, truncate_for_log};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, instrument, warn};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Anything that can turn a batch of posts into insights.
pub trait InsightGenerator {
    /// Ask for the insights found in `posts`.
    async fn generate(&self, posts: &[Post]) -> Result<Vec<Insight>, GenerateError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: &'static str,
    schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

/// Chat-completions client holding the bearer credential and the rendered prompt.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    instructions: String,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: String, model: String) -> Result<Self, AppError> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            instructions: prompts::analysis_prompt(&format!("{SEARCH_WINDOW_DAYS} days")),
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request(&self, posts: &[Post]) -> Result<ChatRequest<'_>, GenerateError> {
        Ok(ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "developer",
                    content: self.instructions.clone(),
                },
                ChatMessage {
                    role: "user",
                    content: serde_json::to_string(posts).map_err(GenerateError::Encode)?,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: prompts::SCHEMA_NAME,
                    schema: prompts::insights_schema(),
                },
            },
        })
    }
}

impl InsightGenerator for OpenAiClient {
    #[instrument(level = "info", skip_all, fields(posts = posts.len(), model = %self.model))]
    async fn generate(&self, posts: &[Post]) -> Result<Vec<Insight>, GenerateError> {
        let t0 = Instant::now();
        let request = self.build_request(posts)?;

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let insights = read_completion(status, &body)?;
        info!(
            count = insights.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Completion parsed"
        );
        Ok(insights)
    }
}

/// Turn an HTTP status and body from the completions route into insights.
///
/// A non-success status becomes [`GenerateError::Api`] carrying a shortened
/// copy of the body; anything else goes through [`parse_completion`].
fn read_completion(status: StatusCode, body: &str) -> Result<Vec<Insight>, GenerateError> {
    if !status.is_success() {
        return Err(GenerateError::Api {
            status: status.as_u16(),
            body: truncate_for_log(body, 300),
        });
    }
    parse_completion(body)
}

/// Pull the insight list out of a chat-completions response body.
fn parse_completion(body: &str) -> Result<Vec<Insight>, GenerateError> {
    let response: ChatResponse = serde_json::from_str(body)?;
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(GenerateError::EmptyResponse)?;

    match serde_json::from_str::<InsightBatch>(&content) {
        Ok(batch) => Ok(batch.insights),
        Err(e) => {
            if looks_truncated(&e) {
                warn!(error = %e, "Model output ended early");
            } else {
                warn!(
                    error = %e,
                    response_preview = %truncate_for_log(&content, 300),
                    "Model returned non-conforming JSON"
                );
            }
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::http_stub;
    use chrono::{TimeZone, Utc};

    fn client() -> OpenAiClient {
        OpenAiClient::new(
            "https://api.openai.com/v1/",
            "sk-test".to_string(),
            DEFAULT_MODEL.to_string(),
        )
        .unwrap()
    }

    fn completion(content: &str) -> String {
        serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
        })
        .to_string()
    }

    #[test]
    fn test_completions_url_strips_trailing_slash() {
        assert_eq!(
            client().completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_shape() {
        let posts = vec![Post {
            title: "Need a tool to track warranties".to_string(),
            text: "Receipts keep getting lost".to_string(),
            source_name: "SomebodyMakeThis".to_string(),
            posted_at: Utc.with_ymd_and_hms(2025, 5, 6, 9, 0, 0).unwrap(),
            score: 8,
        }];

        let client = client();
        let request = serde_json::to_value(client.build_request(&posts).unwrap()).unwrap();

        assert_eq!(request["model"], "gpt-4o");
        assert_eq!(request["messages"][0]["role"], "developer");
        assert!(
            request["messages"][0]["content"]
                .as_str()
                .unwrap()
                .contains("multiple similar posts within 7 days")
        );
        assert_eq!(request["messages"][1]["role"], "user");

        let user: serde_json::Value =
            serde_json::from_str(request["messages"][1]["content"].as_str().unwrap()).unwrap();
        assert_eq!(user[0]["title"], "Need a tool to track warranties");
        assert_eq!(user[0]["subreddit"], "SomebodyMakeThis");

        assert_eq!(request["response_format"]["type"], "json_schema");
        assert_eq!(
            request["response_format"]["json_schema"]["name"],
            "insights_schema"
        );
        assert_eq!(
            request["response_format"]["json_schema"]["schema"],
            prompts::insights_schema()
        );
    }

    #[test]
    fn test_parse_completion_returns_insights_in_order() {
        let content = r#"{"insights": [
            {"problem": "first", "target_users": "a", "validation": "v", "mvp_scope": "m", "verification_method": "x"},
            {"problem": "second", "target_users": "b", "validation": "v", "mvp_scope": "m", "verification_method": "y"}
        ]}"#;

        let insights = parse_completion(&completion(content)).unwrap();
        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].problem, "first");
        assert_eq!(insights[1].problem, "second");
    }

    #[test]
    fn test_parse_completion_without_insights_key_is_empty() {
        let insights = parse_completion(&completion("{}")).unwrap();
        assert!(insights.is_empty());
    }

    #[test]
    fn test_parse_completion_rejects_missing_choices() {
        let err = parse_completion(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, GenerateError::EmptyResponse));
    }

    #[test]
    fn test_parse_completion_rejects_null_content() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        let err = parse_completion(body).unwrap_err();
        assert!(matches!(err, GenerateError::EmptyResponse));
    }

    #[test]
    fn test_parse_completion_rejects_truncated_content() {
        let err = parse_completion(&completion(r#"{"insights": [{"problem": "cut"#)).unwrap_err();
        assert!(matches!(err, GenerateError::Schema(_)));
    }

    #[test]
    fn test_parse_completion_rejects_schema_mismatch() {
        let err = parse_completion(&completion(r#"{"insights": [{"problem": 3}]}"#)).unwrap_err();
        assert!(matches!(err, GenerateError::Schema(_)));
    }

    #[test]
    fn test_parse_completion_rejects_non_json_body() {
        let err = parse_completion("upstream connect error").unwrap_err();
        assert!(matches!(err, GenerateError::Schema(_)));
    }

    #[test]
    fn test_rate_limited_status_is_api_error() {
        let body = r#"{"error": {"message": "Rate limit reached", "type": "requests"}}"#;
        let err = read_completion(StatusCode::TOO_MANY_REQUESTS, body).unwrap_err();

        match err {
            GenerateError::Api { status, body: logged } => {
                assert_eq!(status, 429);
                assert_eq!(logged, body);
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_server_error_body_is_shortened() {
        let body = "x".repeat(1000);
        let err = read_completion(StatusCode::INTERNAL_SERVER_ERROR, &body).unwrap_err();

        match err {
            GenerateError::Api { status, body: logged } => {
                assert_eq!(status, 500);
                assert!(logged.starts_with(&"x".repeat(300)));
                assert!(logged.ends_with("…(+700 bytes)"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_error_status_wins_over_parseable_body() {
        let body = completion(r#"{"insights": []}"#);
        let err = read_completion(StatusCode::BAD_GATEWAY, &body).unwrap_err();
        assert!(matches!(err, GenerateError::Api { status: 502, .. }));
    }

    #[test]
    fn test_success_status_parses_body() {
        let body = completion(r#"{"insights": []}"#);
        assert!(read_completion(StatusCode::OK, &body).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_reports_rate_limit_from_server() {
        let base = http_stub::serve_once(
            "429 Too Many Requests",
            r#"{"error": {"message": "Rate limit reached"}}"#,
        )
        .await;
        let client = OpenAiClient::new(&base, "sk-test".to_string(), DEFAULT_MODEL.to_string())
            .unwrap();

        let err = client.generate(&[]).await.unwrap_err();
        assert!(matches!(err, GenerateError::Api { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_generate_parses_successful_response() {
        let content = r#"{"insights": [{"problem": "p", "target_users": "t", "validation": "v", "mvp_scope": "m", "verification_method": "x"}]}"#;
        let base = http_stub::serve_once("200 OK", &completion(content)).await;
        let client = OpenAiClient::new(&base, "sk-test".to_string(), DEFAULT_MODEL.to_string())
            .unwrap();

        let insights = client.generate(&[]).await.unwrap();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].problem, "p");
    }
}
