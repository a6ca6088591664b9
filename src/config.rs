//! TOML configuration parsing.
//!
//! The `[remote]` section is optional. Without it the content store runs in
//! sample mode and never touches the network.
//!
//! ```toml
//! [remote]
//! owner = "acme"
//! repo = "website"
//! branch = "main"
//! content_root = "content"
//! token_env = "GITHUB_TOKEN"
//!
//! [content]
//! extension = "md"
//! excerpt_chars = 150
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
    #[serde(default)]
    pub content: ContentConfig,
}

/// Location of the content tree in a hosted repository.
#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    pub owner: String,
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_content_root")]
    pub content_root: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Audience passed to the identity provider when requesting a token.
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_branch() -> String {
    "main".to_string()
}
fn default_content_root() -> String {
    "content".to_string()
}
fn default_api_base() -> String {
    "https://api.github.com".to_string()
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl RemoteConfig {
    /// Minimal configuration for `owner/repo`, other fields defaulted.
    pub fn new(owner: &str, repo: &str) -> Self {
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: default_branch(),
            content_root: default_content_root(),
            api_base: default_api_base(),
            token_env: default_token_env(),
            audience: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    /// Extension (without dot) of files treated as documents.
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            excerpt_chars: default_excerpt_chars(),
        }
    }
}

fn default_extension() -> String {
    "md".to_string()
}
fn default_excerpt_chars() -> usize {
    crate::codec::DEFAULT_EXCERPT_CHARS
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if let Some(remote) = &config.remote {
        for (field, value) in [
            ("owner", &remote.owner),
            ("repo", &remote.repo),
            ("branch", &remote.branch),
            ("token_env", &remote.token_env),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("remote.{} must not be empty", field);
            }
        }
        if !remote.api_base.starts_with("http://") && !remote.api_base.starts_with("https://") {
            anyhow::bail!("remote.api_base must be an http(s) URL");
        }
        if remote.timeout_secs == 0 {
            anyhow::bail!("remote.timeout_secs must be > 0");
        }
    }

    if config.content.excerpt_chars == 0 {
        anyhow::bail!("content.excerpt_chars must be > 0");
    }
    let ext = &config.content.extension;
    if ext.is_empty() || ext.starts_with('.') {
        anyhow::bail!("content.extension must be non-empty and given without a leading dot");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_sample_mode() {
        let config = parse_config("").unwrap();
        assert!(config.remote.is_none());
        assert_eq!(config.content.extension, "md");
        assert_eq!(config.content.excerpt_chars, 150);
    }

    #[test]
    fn test_remote_defaults() {
        let config = parse_config("[remote]\nowner = \"acme\"\nrepo = \"site\"\n").unwrap();
        let remote = config.remote.unwrap();
        assert_eq!(remote.branch, "main");
        assert_eq!(remote.content_root, "content");
        assert_eq!(remote.api_base, "https://api.github.com");
        assert_eq!(remote.token_env, "GITHUB_TOKEN");
        assert_eq!(remote.timeout_secs, 30);
        assert!(remote.audience.is_none());
    }

    #[test]
    fn test_rejects_empty_owner() {
        let err = parse_config("[remote]\nowner = \"\"\nrepo = \"site\"\n").unwrap_err();
        assert!(err.to_string().contains("remote.owner"));
    }

    #[test]
    fn test_rejects_dotted_extension() {
        assert!(parse_config("[content]\nextension = \".md\"\n").is_err());
        assert!(parse_config("[content]\nexcerpt_chars = 0\n").is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gitcms.toml");
        std::fs::write(
            &path,
            "[remote]\nowner = \"acme\"\nrepo = \"site\"\nbranch = \"home\"\n",
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.remote.unwrap().branch, "home");
        assert!(load_config(&dir.path().join("missing.toml")).is_err());
    }
}
