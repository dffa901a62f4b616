use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::KestrelError;

/// Top-level configuration loaded from `.kestrel.toml`.
///
/// Supports layered resolution: CLI flags > env vars > local config > defaults.
///
/// # Examples
///
/// ```
/// use kestrel_core::KestrelConfig;
///
/// let config = KestrelConfig::default();
/// assert_eq!(config.review.context_lines, 3);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KestrelConfig {
    /// Completion service settings.
    #[serde(default)]
    pub completion: CompletionConfig,
    /// Review behavior settings.
    #[serde(default)]
    pub review: ReviewConfig,
    /// Vector similarity store settings.
    #[serde(default)]
    pub vector: VectorConfig,
}

impl KestrelConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Io`] if the file cannot be read, or
    /// [`KestrelError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use kestrel_core::KestrelConfig;
    /// use std::path::Path;
    ///
    /// let config = KestrelConfig::from_file(Path::new(".kestrel.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, KestrelError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`KestrelError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use kestrel_core::KestrelConfig;
    ///
    /// let toml = r#"
    /// [review]
    /// context_lines = 5
    /// "#;
    /// let config = KestrelConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.review.context_lines, 5);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, KestrelError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Completion service configuration.
///
/// # Examples
///
/// ```
/// use kestrel_core::CompletionConfig;
///
/// let config = CompletionConfig::default();
/// assert_eq!(config.model, "llama3-70b-8192");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Provider name (e.g. `"groq"`, `"openai"`, `"ollama"`).
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key for the provider.
    pub api_key: Option<String>,
    /// Custom base URL for API requests.
    pub base_url: Option<String>,
}

fn default_provider() -> String {
    "groq".into()
}

fn default_model() -> String {
    "llama3-70b-8192".into()
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            base_url: None,
        }
    }
}

/// Review behavior configuration.
///
/// # Examples
///
/// ```
/// use kestrel_core::ReviewConfig;
///
/// let config = ReviewConfig::default();
/// assert_eq!(config.context_lines, 3);
/// assert_eq!(config.top_k, 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Unchanged lines of surrounding context added around each hunk when
    /// full file contents are available (default: 3).
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
    /// Number of similarity matches to retrieve as prompt context (default: 5).
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_context_lines() -> usize {
    3
}

fn default_top_k() -> usize {
    5
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            context_lines: default_context_lines(),
            top_k: default_top_k(),
        }
    }
}

/// Vector similarity store configuration.
///
/// # Examples
///
/// ```
/// use kestrel_core::VectorConfig;
///
/// let config = VectorConfig::default();
/// assert_eq!(config.namespace, "code-context");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    /// Index host URL, e.g. `https://my-index-abc123.svc.pinecone.io`.
    pub base_url: Option<String>,
    /// API key for the store.
    pub api_key: Option<String>,
    /// Default namespace for upserts and queries (default: `"code-context"`).
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_namespace() -> String {
    "code-context".into()
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            namespace: default_namespace(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = KestrelConfig::default();
        assert_eq!(config.completion.provider, "groq");
        assert_eq!(config.completion.model, "llama3-70b-8192");
        assert!(config.completion.api_key.is_none());
        assert_eq!(config.review.context_lines, 3);
        assert_eq!(config.review.top_k, 5);
        assert_eq!(config.vector.namespace, "code-context");
    }

    #[test]
    fn parse_minimal_toml() {
        let toml = r#"
[review]
context_lines = 8
"#;
        let config = KestrelConfig::from_toml(toml).unwrap();
        assert_eq!(config.review.context_lines, 8);
        assert_eq!(config.review.top_k, 5);
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[completion]
provider = "openai"
model = "gpt-4o"
base_url = "https://api.openai.com"

[review]
context_lines = 2
top_k = 3

[vector]
base_url = "https://idx.svc.example.io"
namespace = "repo-main"
"#;
        let config = KestrelConfig::from_toml(toml).unwrap();
        assert_eq!(config.completion.provider, "openai");
        assert_eq!(config.completion.model, "gpt-4o");
        assert_eq!(config.review.context_lines, 2);
        assert_eq!(config.review.top_k, 3);
        assert_eq!(config.vector.namespace, "repo-main");
        assert_eq!(
            config.vector.base_url.as_deref(),
            Some("https://idx.svc.example.io")
        );
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = KestrelConfig::from_toml("").unwrap();
        assert_eq!(config.completion.model, "llama3-70b-8192");
        assert_eq!(config.review.context_lines, 3);
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = KestrelConfig::from_toml("{{invalid}}");
        assert!(result.is_err());
    }
}
