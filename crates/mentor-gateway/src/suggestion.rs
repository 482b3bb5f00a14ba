// suggestion.rs — Step suggestions: the contract and a canned implementation.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One proposed step for a goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepSuggestion {
    pub title: String,
}

impl StepSuggestion {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

/// Why suggestions could not be produced.
///
/// `Unavailable` means nothing was attempted; `Failed` means the call ran.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SuggestionError {
    #[error("step suggestions are unavailable: no API key configured")]
    Unavailable,

    #[error("AI suggestion failed: {0}")]
    Failed(String),
}

/// Generates actionable steps for a goal.
#[async_trait]
pub trait SuggestionGateway: Send + Sync {
    async fn suggest_steps(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Result<Vec<StepSuggestion>, SuggestionError>;
}

/// Prompt sent to the model for a goal.
pub fn build_prompt(title: &str, description: Option<&str>) -> String {
    let mut prompt = String::from(
        "Based on the following goal, break it down into a list of small, actionable steps.\n\n",
    );
    prompt.push_str(&format!("Goal Title: \"{}\"\n", title));
    if let Some(description) = description.filter(|d| !d.trim().is_empty()) {
        prompt.push_str(&format!("Goal Description: \"{}\"\n", description));
    }
    prompt.push_str("\nProvide only the list of steps.");
    prompt
}

#[derive(Debug, Deserialize)]
struct StepList {
    #[serde(default)]
    steps: Vec<StepSuggestion>,
}

/// Parse the model's `{"steps": [{"title": ...}]}` payload.
pub fn parse_steps(text: &str) -> Result<Vec<StepSuggestion>, SuggestionError> {
    let list: StepList = serde_json::from_str(text.trim())
        .map_err(|e| SuggestionError::Failed(format!("unparseable suggestion payload: {}", e)))?;
    Ok(list.steps)
}

enum Canned {
    Steps(Vec<StepSuggestion>),
    Failure(SuggestionError),
}

/// Suggestion source that returns a fixed answer. Used offline and in tests.
pub struct StaticSuggestions {
    outcome: Canned,
    calls: AtomicUsize,
}

impl StaticSuggestions {
    pub fn new(steps: Vec<StepSuggestion>) -> Self {
        Self {
            outcome: Canned::Steps(steps),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn titles<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(titles.into_iter().map(StepSuggestion::new).collect())
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Canned::Failure(SuggestionError::Failed(message.into())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Behaves like a gateway with no credential configured.
    pub fn unavailable() -> Self {
        Self {
            outcome: Canned::Failure(SuggestionError::Unavailable),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `suggest_steps` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SuggestionGateway for StaticSuggestions {
    async fn suggest_steps(
        &self,
        _title: &str,
        _description: Option<&str>,
    ) -> Result<Vec<StepSuggestion>, SuggestionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Canned::Steps(steps) => Ok(steps.clone()),
            Canned::Failure(error) => Err(error.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_includes_description_only_when_present() {
        let with = build_prompt("Run 5k", Some("by summer"));
        assert!(with.contains("Goal Title: \"Run 5k\""));
        assert!(with.contains("Goal Description: \"by summer\""));

        let without = build_prompt("Run 5k", Some("  "));
        assert!(!without.contains("Goal Description"));
    }

    #[test]
    fn parse_steps_reads_step_titles() {
        let steps =
            parse_steps(r#"{"steps":[{"title":"Research options"},{"title":"Draft a plan"}]}"#)
                .unwrap();
        assert_eq!(
            steps,
            vec![
                StepSuggestion::new("Research options"),
                StepSuggestion::new("Draft a plan")
            ]
        );
    }

    #[test]
    fn parse_steps_without_steps_key_is_empty() {
        assert!(parse_steps("{}").unwrap().is_empty());
    }

    #[test]
    fn parse_steps_rejects_non_json() {
        assert!(matches!(
            parse_steps("1. Research\n2. Plan"),
            Err(SuggestionError::Failed(_))
        ));
    }

    #[tokio::test]
    async fn static_suggestions_count_calls() {
        let source = StaticSuggestions::unavailable();
        assert_eq!(
            source.suggest_steps("x", None).await,
            Err(SuggestionError::Unavailable)
        );
        assert_eq!(source.calls(), 1);
    }
}
