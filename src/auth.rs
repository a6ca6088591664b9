//! Bearer credentials for the remote store.
//!
//! Login itself lives outside this crate. The remote client only needs
//! something that can hand out a token for an audience, which is what
//! [`TokenProvider`] describes.

use anyhow::{Context, Result};
use async_trait::async_trait;

/// Supplies bearer tokens for outgoing remote requests.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a token valid for `audience` (provider-specific when `None`).
    async fn token(&self, audience: Option<&str>) -> Result<String>;
}

/// A fixed token, e.g. a personal access token.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self, _audience: Option<&str>) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Reads the token from an environment variable on every request.
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Whether the variable is currently set to a non-empty value.
    pub fn is_present(&self) -> bool {
        std::env::var(&self.var).is_ok_and(|v| !v.trim().is_empty())
    }
}

#[async_trait]
impl TokenProvider for EnvToken {
    async fn token(&self, _audience: Option<&str>) -> Result<String> {
        let token = std::env::var(&self.var)
            .with_context(|| format!("{} environment variable not set", self.var))?;
        if token.trim().is_empty() {
            anyhow::bail!("{} environment variable is empty", self.var);
        }
        Ok(token.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token() {
        let provider = StaticToken::new("abc");
        assert_eq!(provider.token(Some("api")).await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_env_token_missing() {
        let provider = EnvToken::new("GITCMS_TEST_TOKEN_THAT_IS_NEVER_SET");
        assert!(!provider.is_present());
        assert!(provider.token(None).await.is_err());
    }
}
