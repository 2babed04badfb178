use std::time::Duration;

use reqwest::Url;

use crate::core::config::{ConfigError, Credentials, Platform, PlatformConfig};

/// Everything an outbound call needs that does not change between calls.
///
/// Built once at startup and shared read-only by all concurrent tool calls.
/// Credentials are never refreshed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub platform: Platform,
    pub base_url: Url,
    pub credentials: Credentials,
    pub timeout: Duration,
    pub verify_ssl: bool,
    pub api_version: Option<String>,
    /// Headers sent on every request to this platform.
    pub default_headers: Vec<(String, String)>,
}

impl CallContext {
    /// Build the context from the loaded platform configuration.
    pub fn from_config(config: &PlatformConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| ConfigError::Invalid {
            key: "base_url".to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            platform: config.platform,
            base_url,
            credentials: config.credentials.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
            verify_ssl: config.verify_ssl,
            api_version: config.api_version.clone(),
            default_headers: default_headers(config.platform),
        })
    }

    /// The configured API version, or `fallback` when the platform has none.
    pub fn api_version_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.api_version.as_deref().unwrap_or(fallback)
    }
}

fn default_headers(platform: Platform) -> Vec<(String, String)> {
    let pairs: &[(&str, &str)] = match platform {
        Platform::Github => &[
            ("Accept", "application/vnd.github+json"),
            ("X-GitHub-Api-Version", "2022-11-28"),
        ],
        Platform::Jenkins | Platform::Nexus | Platform::Datadog | Platform::Elasticsearch => {
            &[("Accept", "application/json")]
        }
        Platform::Gitlab | Platform::Docker => &[],
    };
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
impl CallContext {
    /// Context pointing at `base_url` with no credentials.
    pub fn for_tests(platform: Platform, base_url: &str) -> Self {
        Self {
            platform,
            base_url: Url::parse(base_url).unwrap(),
            credentials: Credentials::None,
            timeout: Duration::from_secs(5),
            verify_ssl: true,
            api_version: None,
            default_headers: default_headers(platform),
        }
    }
}
