// gemini.rs — GeminiGateway: step suggestions from the Gemini generateContent API.
//
// The request pins the response to JSON with a schema of
// `{steps: [{title: string}]}`; the model's answer arrives as text in the
// first candidate's first part and is parsed as that JSON.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::SuggestionConfig;
use crate::suggestion::{build_prompt, parse_steps, StepSuggestion, SuggestionError, SuggestionGateway};

/// Suggestion gateway backed by Google's generative language API.
pub struct GeminiGateway {
    config: SuggestionConfig,
    http: reqwest::Client,
}

impl GeminiGateway {
    pub fn new(config: SuggestionConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Whether a credential is configured.
    pub fn is_available(&self) -> bool {
        self.config.api_key().is_some()
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

/// Request payload with the structured-output schema.
fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "response_mime_type": "application/json",
            "response_schema": {
                "type": "OBJECT",
                "properties": {
                    "steps": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "title": {
                                    "type": "STRING",
                                    "description": "A single, actionable step towards the goal."
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: Option<String>,
}

/// Extract the model's text answer from a generateContent response.
fn answer_text(response: GenerateResponse) -> Result<String, SuggestionError> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| SuggestionError::Failed("response contained no candidates".to_string()))
}

#[async_trait]
impl SuggestionGateway for GeminiGateway {
    async fn suggest_steps(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Result<Vec<StepSuggestion>, SuggestionError> {
        let api_key = self.config.api_key().ok_or(SuggestionError::Unavailable)?;
        let prompt = build_prompt(title, description);

        tracing::debug!(model = %self.config.model, title, "requesting step suggestions");
        let response = self
            .http
            .post(self.url())
            .query(&[("key", api_key)])
            .json(&request_body(&prompt))
            .send()
            .await
            .map_err(|e| SuggestionError::Failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            tracing::error!(%status, message = %message, "suggestion API error");
            return Err(SuggestionError::Failed(message));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| SuggestionError::Failed(format!("invalid response: {}", e)))?;
        let steps = parse_steps(&answer_text(parsed)?)?;
        tracing::debug!(count = steps.len(), "received step suggestions");
        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        // The endpoint is unroutable; reaching the network would produce Failed.
        let config = SuggestionConfig {
            api_key: None,
            endpoint: "http://127.0.0.1:9".to_string(),
            ..SuggestionConfig::default()
        };
        let gateway = GeminiGateway::new(config);
        assert!(!gateway.is_available());
        assert_eq!(
            gateway.suggest_steps("Run 5k", None).await,
            Err(SuggestionError::Unavailable)
        );
    }

    #[test]
    fn url_targets_model_generate_content() {
        let gateway = GeminiGateway::new(SuggestionConfig::with_api_key("k"));
        assert_eq!(
            gateway.url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn request_body_asks_for_json() {
        let body = request_body("hello");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(
            body["generationConfig"]["response_mime_type"],
            "application/json"
        );
    }

    #[test]
    fn answer_text_reads_first_candidate() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"steps\":[{\"title\":\"Stretch\"}]}" }] }
            }]
        }))
        .unwrap();
        let steps = parse_steps(&answer_text(response).unwrap()).unwrap();
        assert_eq!(steps, vec![StepSuggestion::new("Stretch")]);
    }

    #[test]
    fn empty_candidates_is_a_failure() {
        let response: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            answer_text(response),
            Err(SuggestionError::Failed(_))
        ));
    }
}
