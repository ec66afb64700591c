//! Configuration for the Fable engine, loadable from `fable.toml`.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FableConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Memory retention and retrieval settings.
    #[serde(default)]
    pub memory: MemorySettings,
    /// Generative backend settings.
    #[serde(default)]
    pub llm: LlmSettings,
    /// Definition record directories.
    #[serde(default)]
    pub paths: PathsConfig,
}

impl FableConfig {
    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::CoreError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Memory retention and retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySettings {
    /// Maximum short-term memories retained per character after
    /// consolidation.
    #[serde(default = "default_retention")]
    pub retention_limit: usize,
    /// Memories retrieved per character interaction.
    #[serde(default = "default_top_k")]
    pub relevance_top_k: usize,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            retention_limit: 100,
            relevance_top_k: 5,
        }
    }
}

/// Generative backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Provider: "openai" (any OpenAI-compatible API) or "none".
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Base URL of the API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature for character responses.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Minimum delay between any two backend calls, process-wide.
    #[serde(default = "default_min_interval")]
    pub min_call_interval_ms: u64,
    /// Hard timeout for any backend call.
    #[serde(default = "default_timeout")]
    pub request_timeout_ms: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            min_call_interval_ms: 500,
            request_timeout_ms: 15_000,
        }
    }
}

/// Definition record directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory of character definition records.
    #[serde(default = "default_characters_dir")]
    pub characters_dir: String,
    /// Directory of world definition records.
    #[serde(default = "default_worlds_dir")]
    pub worlds_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            characters_dir: "data/characters".to_string(),
            worlds_dir: "data/worlds".to_string(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_retention() -> usize {
    100
}
fn default_top_k() -> usize {
    5
}
fn default_provider() -> String {
    "openai".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_min_interval() -> u64 {
    500
}
fn default_timeout() -> u64 {
    15_000
}
fn default_characters_dir() -> String {
    "data/characters".to_string()
}
fn default_worlds_dir() -> String {
    "data/worlds".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let config = FableConfig::from_toml("").expect("empty config parses");
        assert_eq!(config.memory.retention_limit, 100);
        assert_eq!(config.llm.min_call_interval_ms, 500);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = FableConfig::from_toml(
            r#"
            [memory]
            retention_limit = 50

            [llm]
            provider = "none"
            "#,
        )
        .expect("parses");
        assert_eq!(config.memory.retention_limit, 50);
        assert_eq!(config.memory.relevance_top_k, 5);
        assert_eq!(config.llm.provider, "none");
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        assert!(FableConfig::from_toml("[llm\nbroken").is_err());
    }
}
