use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the language-model endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Base URL of an OpenAI-compatible API, e.g. "http://localhost:5001/v1".
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    /// Upper bound on one chat-completion round trip.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: AppConfig = serde_yaml::from_str(&text)
            .with_context(|| format!("decoding config {}", path.display()))?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_defaults_when_absent() {
        let cfg: AppConfig = serde_yaml::from_str(
            "api_base: \"http://localhost:5001/v1\"\napi_key: \"k\"\nmodel: \"m\"\n",
        )
        .unwrap();
        assert_eq!(cfg.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn timeout_is_configurable() {
        let cfg: AppConfig = serde_yaml::from_str(
            "api_base: \"http://localhost:5001/v1\"\napi_key: \"k\"\nmodel: \"m\"\ntimeout_secs: 5\n",
        )
        .unwrap();
        assert_eq!(cfg.timeout_secs, 5);
    }
}
