//! Focus Flow configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main Focus Flow configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
///
/// `model`, `api-key-env` and `base-url` fall back to the chosen provider's
/// defaults when left unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("gemini" or "anthropic")
    pub provider: String,

    /// Model identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env", skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// API base URL
    #[serde(rename = "base-url", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Let the model ground answers with web search (Gemini only)
    ///
    /// Gemini refuses a JSON response mime type when tools are enabled, so
    /// with grounding on the JSON is pulled out of free text instead.
    #[serde(rename = "search-grounding")]
    pub search_grounding: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: None,
            api_key_env: None,
            base_url: None,
            max_tokens: 8192,
            timeout_ms: 60_000,
            search_grounding: true,
        }
    }
}

/// Built-in (model, api key variable, base url) per provider
fn provider_defaults(provider: &str) -> (&'static str, &'static str, &'static str) {
    match provider {
        "anthropic" => ("claude-sonnet-4-20250514", "ANTHROPIC_API_KEY", "https://api.anthropic.com"),
        _ => (
            "gemini-3-pro-preview",
            "GEMINI_API_KEY",
            "https://generativelanguage.googleapis.com",
        ),
    }
}

impl LlmConfig {
    /// Configured model, or the provider's default
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(provider_defaults(&self.provider).0)
    }

    /// Configured key variable, or the provider's default
    pub fn api_key_env(&self) -> &str {
        self.api_key_env.as_deref().unwrap_or(provider_defaults(&self.provider).1)
    }

    /// Configured base URL without a trailing slash, or the provider's default
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(provider_defaults(&self.provider).2)
            .trim_end_matches('/')
    }

    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        let var = self.api_key_env();
        std::env::var(var).context(format!("Environment variable {} is not set", var))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Garden pacing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GardenConfig {
    /// Delay between completing a task and its XP landing in the garden
    #[serde(rename = "deposit-delay-ms")]
    pub deposit_delay_ms: u64,
}

impl Default for GardenConfig {
    fn default() -> Self {
        Self { deposit_delay_ms: 600 }
    }
}

impl GardenConfig {
    pub fn deposit_delay(&self) -> Duration {
        Duration::from_millis(self.deposit_delay_ms)
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the key-value store
    #[serde(rename = "store-dir")]
    pub store_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_dir: kvstore::config::default_store_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.garden.deposit_delay_ms, 600);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_llm_config_defaults() {
        let config = LlmConfig::default();

        assert!(config.model().starts_with("gemini"));
        assert_eq!(config.api_key_env(), "GEMINI_API_KEY");
        assert_eq!(config.base_url(), "https://generativelanguage.googleapis.com");
        assert!(config.search_grounding);
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
llm:
  provider: anthropic
  model: claude-sonnet-4-20250514
  api-key-env: MY_API_KEY
  base-url: https://api.example.com
  max-tokens: 4096
  timeout-ms: 30000
  search-grounding: false

garden:
  deposit-delay-ms: 0

storage:
  store-dir: /tmp/focusflow-test

log-level: debug
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.llm.api_key_env(), "MY_API_KEY");
        assert_eq!(config.llm.base_url(), "https://api.example.com");
        assert_eq!(config.llm.model(), "claude-sonnet-4-20250514");
        assert_eq!(config.llm.max_tokens, 4096);
        assert!(!config.llm.search_grounding);
        assert_eq!(config.garden.deposit_delay(), Duration::ZERO);
        assert_eq!(config.storage.store_dir, PathBuf::from("/tmp/focusflow-test"));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
llm:
  model: gemini-2.5-flash
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        // Specified value
        assert_eq!(config.llm.model(), "gemini-2.5-flash");

        // Defaults for unspecified
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.llm.api_key_env(), "GEMINI_API_KEY");
        assert_eq!(config.garden.deposit_delay_ms, 600);
    }

    #[test]
    fn test_provider_alone_selects_its_defaults() {
        let yaml = r#"
llm:
  provider: anthropic
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.base_url(), "https://api.anthropic.com");
        assert_eq!(config.llm.api_key_env(), "ANTHROPIC_API_KEY");
        assert!(config.llm.model().starts_with("claude"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = LlmConfig {
            base_url: Some("http://localhost:8080/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_load_explicit_path_and_log_level() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("ff.yml");
        fs::write(&path, "log-level: TRACE\ngarden:\n  deposit-delay-ms: 5\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.garden.deposit_delay_ms, 5);
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("TRACE"));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let missing = PathBuf::from("/nonexistent/focusflow.yml");
        assert!(Config::load(Some(&missing)).is_err());
        assert!(Config::load_log_level(Some(&missing)).is_none());
    }

    #[test]
    #[serial]
    fn test_validate_checks_api_key_env() {
        let mut config = Config::default();
        config.llm.api_key_env = Some("FOCUSFLOW_TEST_KEY_VALIDATE".to_string());

        // SAFETY: serialized test, no other thread reads this variable
        unsafe { std::env::remove_var("FOCUSFLOW_TEST_KEY_VALIDATE") };
        assert!(config.validate().is_err());

        unsafe { std::env::set_var("FOCUSFLOW_TEST_KEY_VALIDATE", "secret") };
        assert!(config.validate().is_ok());
        assert_eq!(config.llm.get_api_key().unwrap(), "secret");

        unsafe { std::env::remove_var("FOCUSFLOW_TEST_KEY_VALIDATE") };
    }
}
