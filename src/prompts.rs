//! The fixed analysis prompt and the JSON schema the model must answer with.

use serde_json::{Value, json};

/// Name the schema is registered under in the `response_format` block.
pub const SCHEMA_NAME: &str = "insights_schema";

const ANALYSIS_PROMPT: &str = r#"
For the provided Reddit data, analyze and extract business opportunities using these filters:

MARKET CRITERIA:
- Posts with score > 5 OR multiple similar posts within {timeframe}
- Contains phrases indicating active search ("looking for", "alternative to", "need", "want", "wish")
- Has specific use case or workflow description

FEASIBILITY FILTERS:
- Solution can be prototyped within 2 months
- Uses standard technology stack (no specialized hardware/infrastructure)
- Clear core functionality that solves one specific problem
- No dependencies on large-scale data or complex integrations

VALIDATION SIGNALS:
- Multiple users expressing similar needs
- Mentions of failed attempts to find existing solutions
- Users describing current workarounds
- Detailed description of pain points

For each matching opportunity, format the output as:

PROBLEM:
[Clear 1-sentence problem statement]

TARGET USERS:
[Specific description of who needs this]

VALIDATION:
[List of supporting evidence from posts]

MVP SCOPE:
[Core features for minimum viable solution]

VERIFICATION METHOD:
[How to quickly test market interest]

Sort results by: (Post Score * Number of Similar Posts)
"#;

/// Render the system instruction for a scrape window such as `"7 days"`.
pub fn analysis_prompt(timeframe: &str) -> String {
    ANALYSIS_PROMPT.replace("{timeframe}", timeframe)
}

/// JSON schema for [`crate::models::InsightBatch`].
pub fn insights_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "insights": {
                "description": "Generated insights items. Multiple items are allowed.",
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "problem": {
                            "type": "string",
                            "description": "Clear 1-sentence problem statement"
                        },
                        "target_users": {
                            "type": "string",
                            "description": "Specific description of who needs this"
                        },
                        "validation": {
                            "type": "string",
                            "description": "Supporting evidence from posts. Split points with newlines."
                        },
                        "mvp_scope": {
                            "type": "string",
                            "description": "Core features for minimum viable solution. Split points with newlines."
                        },
                        "verification_method": {
                            "type": "string",
                            "description": "How to quickly test market interest"
                        }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_renders_timeframe() {
        let prompt = analysis_prompt("7 days");
        assert!(prompt.contains("multiple similar posts within 7 days"));
        assert!(!prompt.contains("{timeframe}"));
    }

    #[test]
    fn test_schema_lists_every_insight_field() {
        let schema = insights_schema();
        let fields = schema["properties"]["insights"]["items"]["properties"]
            .as_object()
            .unwrap();

        for name in [
            "problem",
            "target_users",
            "validation",
            "mvp_scope",
            "verification_method",
        ] {
            assert_eq!(fields[name]["type"], "string", "field {name}");
        }
        assert_eq!(fields.len(), 5);
    }
}
