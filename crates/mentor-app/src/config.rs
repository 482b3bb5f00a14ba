// config.rs — Application configuration.
//
// Settings come from an optional `mentor.toml` and are then overridden by
// environment variables. The backend URL and anonymous key are required; a
// missing suggestion key only disables step suggestions.

use std::path::{Path, PathBuf};

use mentor_gateway::{GatewayConfig, SuggestionConfig};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_GEMINI_MODEL: &str = "GEMINI_MODEL";
pub const ENV_ACTIVITY_LOG: &str = "MENTOR_ACTIVITY_LOG";

/// Top-level configuration from `mentor.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub supabase: SupabaseSettings,

    #[serde(default)]
    pub gemini: SuggestionConfig,

    /// Append goal activity as JSONL to this file.
    #[serde(default)]
    pub activity_log: Option<PathBuf>,
}

/// Backend connection settings. Both are required before startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupabaseSettings {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub anon_key: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl AppConfig {
    /// `<config dir>/mentor/mentor.toml`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mentor").join("mentor.toml"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load `path` if it exists, else start from defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading config file");
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply overrides from a variable lookup (normally the process env).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_SUPABASE_URL) {
            self.supabase.url = Some(url);
        }
        if let Some(key) = lookup(ENV_SUPABASE_ANON_KEY) {
            self.supabase.anon_key = Some(key);
        }
        if let Some(key) = lookup(ENV_GEMINI_API_KEY) {
            self.gemini.api_key = Some(key);
        }
        if let Some(model) = lookup(ENV_GEMINI_MODEL).filter(|m| !m.trim().is_empty()) {
            self.gemini.model = model;
        }
        if let Some(path) = lookup(ENV_ACTIVITY_LOG).filter(|p| !p.trim().is_empty()) {
            self.activity_log = Some(PathBuf::from(path));
        }
    }

    /// File (when present), then environment, then validation.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_or_default(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = non_blank(self.supabase.url.as_deref())
            .ok_or(ConfigError::Missing("supabase.url", ENV_SUPABASE_URL))?;
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::Invalid {
                key: "supabase.url",
                reason: format!("'{}' is not an http(s) URL", url),
            });
        }
        non_blank(self.supabase.anon_key.as_deref())
            .ok_or(ConfigError::Missing("supabase.anon_key", ENV_SUPABASE_ANON_KEY))?;
        Ok(())
    }

    pub fn gateway_config(&self) -> Result<GatewayConfig, ConfigError> {
        self.validate()?;
        let url = non_blank(self.supabase.url.as_deref()).unwrap_or_default();
        let key = non_blank(self.supabase.anon_key.as_deref()).unwrap_or_default();
        Ok(GatewayConfig::new(url, key))
    }

    pub fn suggestion_config(&self) -> SuggestionConfig {
        self.gemini.clone()
    }

    pub fn suggestions_enabled(&self) -> bool {
        self.gemini.api_key().is_some()
    }
}
