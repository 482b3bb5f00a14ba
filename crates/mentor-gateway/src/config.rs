// config.rs — Connection settings for the data and suggestion gateways.

use serde::{Deserialize, Serialize};

/// Where the backend lives and the public (anonymous) key used to reach it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Base URL of the backend project (e.g., "https://abc.supabase.co").
    pub url: String,

    /// Public anonymous key, sent as `apikey` on every request.
    pub anon_key: String,
}

impl GatewayConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
        }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// Settings for the generative step-suggestion service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuggestionConfig {
    /// API key. `None` disables suggestions without failing startup.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            endpoint: default_endpoint(),
        }
    }
}

impl SuggestionConfig {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// The configured key, ignoring blank values.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_strips_trailing_slash() {
        let config = GatewayConfig::new("https://abc.supabase.co/", "anon");
        assert_eq!(config.base_url(), "https://abc.supabase.co");
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let config = SuggestionConfig::with_api_key("   ");
        assert!(config.api_key().is_none());
        assert_eq!(SuggestionConfig::default().model, "gemini-2.0-flash");
    }
}
