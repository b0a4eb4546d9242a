use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FlowError, Result};

/// Top-level Instaflow configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub instagram: Option<InstagramConfig>,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Instagram Graph API credentials and endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstagramConfig {
    pub access_token: String,
    /// Instagram professional account id that owns the flows.
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String { "https://graph.instagram.com".to_string() }
fn default_api_version() -> String { "v21.0".to_string() }
fn default_timeout_secs() -> u64 { 30 }

/// Outbound HTTP settings for the `api_call` action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_user_agent() -> String {
    format!("instaflow/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound on node visits per run.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// What to do with `{name}` tokens that have no matching variable.
    #[serde(default)]
    pub unresolved_tokens: UnresolvedTokens,
}

fn default_max_steps() -> usize { 100 }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            unresolved_tokens: UnresolvedTokens::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedTokens {
    /// Leave the `{name}` token in the text.
    #[default]
    Keep,
    /// Replace the token with an empty string.
    Empty,
}

impl AppConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| FlowError::ConfigNotFound(path.display().to_string()))?;

        Self::parse(&content)
    }

    /// Parse config from TOML text, expanding `${ENV_VAR}` references first.
    pub fn parse(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content);

        toml::from_str(&expanded).map_err(|e| FlowError::Config(e.to_string()))
    }

    /// The configured Instagram section, or a config error naming it.
    pub fn instagram(&self) -> Result<&InstagramConfig> {
        self.instagram
            .as_ref()
            .ok_or_else(|| FlowError::Config("missing [instagram] section".into()))
    }
}

/// Replace each `${NAME}` with the value of env var `NAME`.
///
/// Unset variables and an unterminated `${` are left as written.
fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(len) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..len];
        match std::env::var(name) {
            Ok(value) => out.push_str(&value),
            Err(_) => out.push_str(&rest[start..start + 3 + len]),
        }
        rest = &after[len + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("TEST_INSTAFLOW_VAR", "hello");
        let result = expand_env_vars("key = \"${TEST_INSTAFLOW_VAR}\"");
        assert_eq!(result, "key = \"hello\"");
        std::env::remove_var("TEST_INSTAFLOW_VAR");
    }

    #[test]
    fn test_expand_env_vars_missing() {
        let result = expand_env_vars("key = \"${NONEXISTENT_INSTAFLOW_VAR}\"");
        assert_eq!(result, "key = \"${NONEXISTENT_INSTAFLOW_VAR}\"");
    }

    #[test]
    fn test_expand_env_vars_unterminated() {
        std::env::set_var("TEST_INSTAFLOW_TAIL", "x");
        let result = expand_env_vars("a = \"${TEST_INSTAFLOW_TAIL}\"\nb = \"${OPEN");
        assert_eq!(result, "a = \"x\"\nb = \"${OPEN");
        std::env::remove_var("TEST_INSTAFLOW_TAIL");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert!(config.instagram.is_none());
        assert_eq!(config.http.timeout_secs, 30);
        assert!(config.http.user_agent.starts_with("instaflow/"));
        assert_eq!(config.engine.max_steps, 100);
        assert_eq!(config.engine.unresolved_tokens, UnresolvedTokens::Keep);
    }

    #[test]
    fn test_instagram_defaults() {
        let config = AppConfig::parse(
            r#"
[instagram]
access_token = "IGQV-test"
"#,
        )
        .unwrap();
        let ig = config.instagram().unwrap();
        assert_eq!(ig.api_base, "https://graph.instagram.com");
        assert_eq!(ig.api_version, "v21.0");
        assert!(ig.account_id.is_none());
    }

    #[test]
    fn test_missing_instagram_section() {
        let config = AppConfig::default();
        let err = config.instagram().unwrap_err();
        assert!(err.to_string().contains("[instagram]"));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = AppConfig::parse("[engine\nmax_steps = ").unwrap_err();
        assert!(matches!(err, FlowError::Config(_)));
    }
}
