use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

pub const TOKEN_ENV: &str = "CLOUDFLARE_API_TOKEN";

#[derive(Clone, Deserialize)]
pub struct CloudflareConfig {
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl fmt::Debug for CloudflareConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudflareConfig")
            .field("api_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("user_agent", &self.user_agent)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_api_base() -> String {
    "https://api.cloudflare.com/client/v4".to_string()
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

impl CloudflareConfig {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            api_base: default_api_base(),
            user_agent: default_user_agent(),
            timeout_secs: None,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parses a config, falling back to `CLOUDFLARE_API_TOKEN` when no token is set.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CloudflareConfig = toml::from_str(content)?;
        config.resolve_token(std::env::var(TOKEN_ENV).ok())
    }

    fn resolve_token(mut self, env_token: Option<String>) -> Result<Self> {
        if self.api_token.is_empty() {
            self.api_token = env_token.unwrap_or_default();
        }
        if self.api_token.is_empty() {
            anyhow::bail!("api_token is not set and {} is empty", TOKEN_ENV);
        }
        Ok(self)
    }
}
