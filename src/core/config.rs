//! Configuration management for the MCP server.
//!
//! Configuration is read once at startup from the process environment (and
//! an optional `.env` file). Every platform has a fixed set of required keys;
//! a missing one is a [`ConfigError`] and the process refuses to start.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::transport::TransportConfig;

/// Default per-call timeout for outbound requests, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors raised while loading configuration. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required key is absent or empty.
    #[error("missing required environment variable {0}")]
    Missing(String),

    /// A key is present but its value cannot be used.
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },

    /// The env file could not be read.
    #[error("failed to read env file {path}: {reason}")]
    EnvFile { path: PathBuf, reason: String },
}

impl ConfigError {
    fn missing(key: &str) -> Self {
        Self::Missing(key.to_string())
    }

    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// The platform this process adapts, with its endpoint and credentials.
    pub platform: PlatformConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// The DevOps platforms this server can front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Jenkins,
    Github,
    Gitlab,
    Nexus,
    Docker,
    Datadog,
    Elasticsearch,
}

impl Platform {
    /// Every supported platform, in display order.
    pub const ALL: [Platform; 7] = [
        Platform::Jenkins,
        Platform::Github,
        Platform::Gitlab,
        Platform::Nexus,
        Platform::Docker,
        Platform::Datadog,
        Platform::Elasticsearch,
    ];

    /// The lowercase identifier used in `MCP_PLATFORM`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jenkins => "jenkins",
            Self::Github => "github",
            Self::Gitlab => "gitlab",
            Self::Nexus => "nexus",
            Self::Docker => "docker",
            Self::Datadog => "datadog",
            Self::Elasticsearch => "elasticsearch",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|p| p.as_str()).collect();
                format!("unknown platform '{}', expected one of: {}", s, known.join(", "))
            })
    }
}

/// How outbound requests authenticate. Exactly one scheme per process.
///
/// Deliberately not serializable; the only textual form is the redacting
/// `Debug` below.
#[derive(Clone)]
pub enum Credentials {
    /// No authentication (e.g. a local Docker daemon).
    None,
    /// `Authorization: Bearer <token>`.
    Bearer { token: String },
    /// HTTP Basic authentication.
    Basic { username: String, password: String },
    /// Static API-key headers sent verbatim.
    Headers { headers: Vec<(String, String)> },
}

/// Custom Debug implementation to redact secrets from logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"[REDACTED]")
                .finish(),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            Self::Headers { headers } => {
                let names: Vec<_> = headers
                    .iter()
                    .map(|(name, _)| (name.as_str(), "[REDACTED]"))
                    .collect();
                f.debug_struct("Headers").field("headers", &names).finish()
            }
        }
    }
}

impl Credentials {
    /// Short scheme name for logging.
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bearer { .. } => "bearer",
            Self::Basic { .. } => "basic",
            Self::Headers { .. } => "api-key headers",
        }
    }
}

/// Endpoint, credentials and request policy for the selected platform.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub platform: Platform,

    /// Absolute http(s) base URL every request path is joined onto.
    pub base_url: String,

    pub credentials: Credentials,

    /// Verify TLS certificates of the remote API.
    pub verify_ssl: bool,

    /// Default API version string, for platforms that put it in the path.
    pub api_version: Option<String>,

    /// Per outbound call timeout, in seconds.
    pub request_timeout_secs: u64,
}

/// Read-only view over a key lookup, with the parsing rules shared by every key.
struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key).ok_or_else(|| ConfigError::missing(key))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.optional(key) {
            None => Ok(default),
            Some(v) => parse_flag(key, &v),
        }
    }

    fn base_url(&self, key: &str, value: String) -> Result<String, ConfigError> {
        let parsed = reqwest::Url::parse(&value)
            .map_err(|e| ConfigError::invalid(key, format!("'{value}' is not a URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(
                key,
                format!("scheme '{}' is not http or https", parsed.scheme()),
            ));
        }
        Ok(value.trim_end_matches('/').to_string())
    }
}

/// Boolean setting: `1/true/yes/on` or `0/false/no/off`, case-insensitive.
pub(crate) fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, format!("'{value}' is not a boolean"))),
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Values from `.env` (or the file named by `MCP_ENV_FILE`) fill in keys
    /// the process environment does not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let file_vars = match std::env::var("MCP_ENV_FILE") {
            Ok(path) => read_env_file(Path::new(&path))?,
            Err(_) => read_env_file(Path::new(".env")).unwrap_or_else(|e| {
                debug!("No .env file loaded: {}", e);
                HashMap::new()
            }),
        };

        Self::from_lookup(|key| {
            std::env::var(key)
                .ok()
                .or_else(|| file_vars.get(key).cloned())
        })
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let server = ServerConfig {
            name: env.or_default("MCP_SERVER_NAME", "devops-mcp-server"),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };

        let logging = LoggingConfig {
            level: env.or_default("MCP_LOG_LEVEL", "info"),
        };

        let transport = TransportConfig::from_lookup(&env.lookup)?;

        let platform: Platform = env
            .required("MCP_PLATFORM")?
            .parse()
            .map_err(|e: String| ConfigError::invalid("MCP_PLATFORM", e))?;

        let request_timeout_secs = match env.optional("MCP_REQUEST_TIMEOUT_SECS") {
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
            Some(v) => match v.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::invalid(
                        "MCP_REQUEST_TIMEOUT_SECS",
                        format!("'{v}' is not a positive number of seconds"),
                    ));
                }
            },
        };

        let platform = PlatformConfig::load(platform, &env, request_timeout_secs)?;

        Ok(Self {
            server,
            logging,
            transport,
            platform,
        })
    }
}

impl PlatformConfig {
    /// One-line startup summary. Names the auth scheme, never the secret.
    pub fn summary(&self) -> String {
        format!(
            "Configured platform {} at {} (auth: {})",
            self.platform,
            self.base_url,
            self.credentials.scheme()
        )
    }

    /// Warning to log at startup when certificate checks are off.
    pub fn tls_warning(&self) -> Option<String> {
        (!self.verify_ssl)
            .then(|| format!("TLS certificate verification is disabled for {}", self.platform))
    }

    fn load<F>(
        platform: Platform,
        env: &Env<F>,
        request_timeout_secs: u64,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut verify_ssl = true;
        let mut api_version = None;

        let (base_url, credentials) = match platform {
            Platform::Jenkins => {
                let url = env.base_url("JENKINS_URL", env.required("JENKINS_URL")?)?;
                let credentials = Credentials::Basic {
                    username: env.required("JENKINS_USER")?,
                    password: env.required("JENKINS_API_TOKEN")?,
                };
                verify_ssl = env.flag("JENKINS_VERIFY_SSL", true)?;
                (url, credentials)
            }
            Platform::Github => {
                let url = env.base_url(
                    "GITHUB_API_URL",
                    env.or_default("GITHUB_API_URL", "https://api.github.com"),
                )?;
                let token = env.required("GITHUB_PERSONAL_ACCESS_TOKEN")?;
                (url, Credentials::Bearer { token })
            }
            Platform::Gitlab => {
                let url = env.base_url(
                    "GITLAB_API_URL",
                    env.or_default("GITLAB_API_URL", "https://gitlab.com/api/v4"),
                )?;
                let token = env.required("GITLAB_PERSONAL_ACCESS_TOKEN")?;
                let credentials = Credentials::Headers {
                    headers: vec![("PRIVATE-TOKEN".to_string(), token)],
                };
                (url, credentials)
            }
            Platform::Nexus => {
                let root = env.base_url("NEXUS_URL", env.required("NEXUS_URL")?)?;
                let credentials = Credentials::Basic {
                    username: env.or_default("NEXUS_USERNAME", "admin"),
                    password: env.required("NEXUS_PASSWORD")?,
                };
                verify_ssl = env.flag("NEXUS_VERIFY_SSL", true)?;
                (format!("{root}/service/rest"), credentials)
            }
            Platform::Docker => {
                let url = env.base_url(
                    "DOCKER_HOST_URL",
                    env.or_default("DOCKER_HOST_URL", "http://localhost:2375"),
                )?;
                api_version = Some(env.or_default("DOCKER_API_VERSION", "v1.43"));
                (url, Credentials::None)
            }
            Platform::Datadog => {
                let site = env.or_default("DATADOG_SITE", "datadoghq.com");
                let url = env.base_url("DATADOG_SITE", format!("https://api.{site}"))?;
                let credentials = Credentials::Headers {
                    headers: vec![
                        ("DD-API-KEY".to_string(), env.required("DATADOG_API_KEY")?),
                        (
                            "DD-APPLICATION-KEY".to_string(),
                            env.required("DATADOG_APP_KEY")?,
                        ),
                    ],
                };
                (url, credentials)
            }
            Platform::Elasticsearch => {
                let url = env.base_url(
                    "ELASTICSEARCH_BASE_URL",
                    env.required("ELASTICSEARCH_BASE_URL")?,
                )?;
                let credentials = match env.optional("ELASTICSEARCH_TOKEN") {
                    Some(token) => Credentials::Headers {
                        headers: vec![("Authorization".to_string(), format!("ApiKey {token}"))],
                    },
                    None => match env.optional("ELASTICSEARCH_USERNAME") {
                        Some(username) => Credentials::Basic {
                            username,
                            password: env.required("ELASTICSEARCH_PASSWORD")?,
                        },
                        None => return Err(ConfigError::missing("ELASTICSEARCH_TOKEN")),
                    },
                };
                (url, credentials)
            }
        };

        Ok(Self {
            platform,
            base_url,
            credentials,
            verify_ssl,
            api_version,
            request_timeout_secs,
        })
    }
}

/// Read `KEY=value` pairs from an env file without touching the process environment.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let env_file_error = |reason: String| ConfigError::EnvFile {
        path: path.to_path_buf(),
        reason,
    };

    let mut vars = HashMap::new();
    for item in dotenvy::from_path_iter(path).map_err(|e| env_file_error(e.to_string()))? {
        let (key, value) = item.map_err(|e| env_file_error(e.to_string()))?;
        vars.insert(key, value);
    }
    Ok(vars)
}
