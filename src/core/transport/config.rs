//! Transport configuration types.

use crate::core::config::ConfigError;

/// Transports compiled into this binary, as `MCP_TRANSPORT` names them.
const ENABLED_TRANSPORTS: &[&str] = &[
    #[cfg(feature = "stdio")]
    "stdio",
    #[cfg(feature = "tcp")]
    "tcp",
    #[cfg(feature = "http")]
    "http",
];

/// Transport configuration options.
#[derive(Debug, Clone)]
pub enum TransportConfig {
    /// Standard input/output transport (default for MCP).
    #[cfg(feature = "stdio")]
    Stdio,

    /// TCP socket transport with JSON-RPC messages.
    #[cfg(feature = "tcp")]
    Tcp(TcpConfig),

    /// HTTP transport with JSON-RPC over POST.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

/// TCP transport configuration.
#[cfg(feature = "tcp")]
#[derive(Debug, Clone)]
pub struct TcpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    pub host: String,
}

/// HTTP transport configuration.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    pub host: String,

    /// Path for JSON-RPC endpoint.
    pub rpc_path: String,

    /// Enable CORS for browser clients.
    pub enable_cors: bool,
}

#[cfg(any(feature = "tcp", feature = "http"))]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[cfg(feature = "http")]
fn default_rpc_path() -> String {
    "/mcp".to_string()
}

#[cfg(feature = "http")]
fn default_cors() -> bool {
    true
}

#[cfg(any(feature = "tcp", feature = "http"))]
fn parse_port(key: &str, value: Option<String>, default: u16) -> Result<u16, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v.parse::<u16>().map_err(|_| {
            ConfigError::invalid(key, format!("'{v}' is not a port number (1-65535)"))
        }),
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        {
            return Self::Stdio;
        }

        #[cfg(all(not(feature = "stdio"), feature = "tcp"))]
        {
            return Self::Tcp(TcpConfig::default());
        }

        #[cfg(all(not(feature = "stdio"), not(feature = "tcp"), feature = "http"))]
        {
            return Self::Http(HttpConfig::default());
        }

        #[cfg(not(any(feature = "stdio", feature = "tcp", feature = "http")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio, tcp, or http");
        }
    }
}

#[cfg(feature = "tcp")]
impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: default_host(),
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: default_host(),
            rpc_path: default_rpc_path(),
            enable_cors: default_cors(),
        }
    }
}

impl TransportConfig {
    /// Load transport config from an arbitrary key lookup.
    ///
    /// An unset or blank `MCP_TRANSPORT` selects the default transport. A
    /// name that is unknown or not compiled in is an error, as is any
    /// listener setting that does not parse.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let Some(transport) = value("MCP_TRANSPORT") else {
            return Ok(Self::default());
        };

        match transport.to_lowercase().as_str() {
            #[cfg(feature = "stdio")]
            "stdio" => Ok(Self::Stdio),
            #[cfg(feature = "tcp")]
            "tcp" => Ok(Self::Tcp(TcpConfig {
                port: parse_port("MCP_TCP_PORT", value("MCP_TCP_PORT"), 3000)?,
                host: value("MCP_TCP_HOST").unwrap_or_else(default_host),
            })),
            #[cfg(feature = "http")]
            "http" => {
                let enable_cors = match value("MCP_HTTP_CORS") {
                    Some(v) => crate::core::config::parse_flag("MCP_HTTP_CORS", &v)?,
                    None => default_cors(),
                };
                Ok(Self::Http(HttpConfig {
                    port: parse_port("MCP_HTTP_PORT", value("MCP_HTTP_PORT"), 8080)?,
                    host: value("MCP_HTTP_HOST").unwrap_or_else(default_host),
                    rpc_path: value("MCP_HTTP_PATH").unwrap_or_else(default_rpc_path),
                    enable_cors,
                }))
            }
            _ => Err(ConfigError::invalid(
                "MCP_TRANSPORT",
                format!(
                    "'{transport}' is not an enabled transport, expected one of: {}",
                    ENABLED_TRANSPORTS.join(", ")
                ),
            )),
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
            #[cfg(feature = "tcp")]
            Self::Tcp(cfg) => format!("TCP on {}:{}", cfg.host, cfg.port),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!("HTTP on {}:{}{}", cfg.host, cfg.port, cfg.rpc_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    fn invalid_key(err: ConfigError) -> String {
        match err {
            ConfigError::Invalid { key, .. } => key,
            other => panic!("expected an invalid value error, got {other}"),
        }
    }

    #[test]
    fn test_unset_or_blank_transport_uses_default() {
        let default = TransportConfig::default().description();
        let unset = TransportConfig::from_lookup(&lookup(&[])).unwrap();
        assert_eq!(unset.description(), default);

        let blank = TransportConfig::from_lookup(&lookup(&[("MCP_TRANSPORT", "  ")])).unwrap();
        assert_eq!(blank.description(), default);
    }

    #[test]
    fn test_misspelled_transport_rejected() {
        let err = TransportConfig::from_lookup(&lookup(&[("MCP_TRANSPORT", "htpp")])).unwrap_err();
        assert!(err.to_string().contains("'htpp' is not an enabled transport"), "{err}");
        assert_eq!(invalid_key(err), "MCP_TRANSPORT");
    }

    #[cfg(feature = "stdio")]
    #[test]
    fn test_explicit_stdio() {
        let config = TransportConfig::from_lookup(&lookup(&[("MCP_TRANSPORT", "STDIO")])).unwrap();
        assert!(matches!(config, TransportConfig::Stdio));
    }

    #[cfg(not(feature = "tcp"))]
    #[test]
    fn test_transport_not_compiled_in_rejected() {
        let err = TransportConfig::from_lookup(&lookup(&[("MCP_TRANSPORT", "tcp")])).unwrap_err();
        assert_eq!(invalid_key(err), "MCP_TRANSPORT");
    }

    #[cfg(feature = "tcp")]
    #[test]
    fn test_tcp_port_must_parse() {
        let err = TransportConfig::from_lookup(&lookup(&[
            ("MCP_TRANSPORT", "tcp"),
            ("MCP_TCP_PORT", "70000"),
        ]))
        .unwrap_err();
        assert_eq!(invalid_key(err), "MCP_TCP_PORT");
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_transport_from_lookup() {
        let config = TransportConfig::from_lookup(&lookup(&[
            ("MCP_TRANSPORT", "HTTP"),
            ("MCP_HTTP_PORT", "9090"),
            ("MCP_HTTP_CORS", "false"),
        ]))
        .unwrap();
        match config {
            TransportConfig::Http(cfg) => {
                assert_eq!(cfg.port, 9090);
                assert_eq!(cfg.host, "127.0.0.1");
                assert_eq!(cfg.rpc_path, "/mcp");
                assert!(!cfg.enable_cors);
            }
            other => panic!("expected http transport, got {}", other.description()),
        }
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_rejects_bad_port_and_cors_flag() {
        let err = TransportConfig::from_lookup(&lookup(&[
            ("MCP_TRANSPORT", "http"),
            ("MCP_HTTP_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert_eq!(invalid_key(err), "MCP_HTTP_PORT");

        let err = TransportConfig::from_lookup(&lookup(&[
            ("MCP_TRANSPORT", "http"),
            ("MCP_HTTP_CORS", "sometimes"),
        ]))
        .unwrap_err();
        assert_eq!(invalid_key(err), "MCP_HTTP_CORS");
    }
}
