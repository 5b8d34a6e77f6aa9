//! HTTP service configuration.
//!
//! Built once at startup from defaults, an optional JSON file and
//! environment overrides, then handed to [`crate::build_router`] by value.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_HOST: &str = "COUNTRY_API_HOST";
pub const ENV_PORT: &str = "COUNTRY_API_PORT";
pub const ENV_DATABASE_PATH: &str = "COUNTRY_API_DATABASE_PATH";
pub const ENV_API_PREFIX: &str = "COUNTRY_API_PREFIX";
pub const ENV_CORS_ORIGINS: &str = "COUNTRY_API_CORS_ORIGINS";

/// HTTP service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 8000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// SQLite database file (default: "./country_app.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Prefix the country routes are mounted under (default: "/api/v1")
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// CORS allowed origins
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./country_app.db")
}

fn default_api_prefix() -> String {
    "/api/v1".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
        "http://localhost:8080".to_string(),
    ]
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_path: default_database_path(),
            api_prefix: default_api_prefix(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl ApiConfig {
    /// Defaults with the process environment applied on top.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Reads a JSON config file; absent keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `COUNTRY_API_*` overrides resolved through `lookup`.
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(host) = lookup(ENV_HOST) {
            self.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_PORT,
                value: port.clone(),
                reason: "expected a port number",
            })?;
        }
        if let Some(path) = lookup(ENV_DATABASE_PATH) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(prefix) = lookup(ENV_API_PREFIX) {
            self.api_prefix = prefix;
        }
        if let Some(origins) = lookup(ENV_CORS_ORIGINS) {
            self.cors_origins = parse_origin_list(&origins);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "host",
                value: self.host.clone(),
                reason: "host cannot be empty",
            });
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "database_path",
                value: String::new(),
                reason: "database path cannot be empty",
            });
        }
        if self.api_prefix.contains(['{', '}', '*']) {
            return Err(ConfigError::InvalidValue {
                key: "api_prefix",
                value: self.api_prefix.clone(),
                reason: "prefix cannot contain route captures",
            });
        }
        Ok(())
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Prefix as a route path: leading `/`, no trailing `/`, empty for root.
    pub fn normalized_prefix(&self) -> String {
        let trimmed = self.api_prefix.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }
}

/// Accepts a comma-separated list or a JSON array of origins.
fn parse_origin_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        if let Ok(origins) = serde_json::from_str::<Vec<String>>(trimmed) {
            return origins;
        }
    }
    trimmed
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid value `{value}` for `{key}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::InvalidValue { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.socket_addr(), "0.0.0.0:8000");
        assert_eq!(config.normalized_prefix(), "/api/v1");
        assert_eq!(config.cors_origins.len(), 3);
    }

    #[test]
    fn test_env_overrides() {
        let config = ApiConfig::default()
            .with_env_overrides(lookup_from(&[
                (ENV_PORT, "9001"),
                (ENV_DATABASE_PATH, "/tmp/countries.db"),
                (ENV_CORS_ORIGINS, "http://a.test, http://b.test"),
            ]))
            .unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.database_path, PathBuf::from("/tmp/countries.db"));
        assert_eq!(config.cors_origins, ["http://a.test", "http://b.test"]);

        let json_list = ApiConfig::default()
            .with_env_overrides(lookup_from(&[(ENV_CORS_ORIGINS, r#"["http://c.test"]"#)]))
            .unwrap();
        assert_eq!(json_list.cors_origins, ["http://c.test"]);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = ApiConfig::default()
            .with_env_overrides(lookup_from(&[(ENV_PORT, "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: ENV_PORT, .. }));
    }

    #[test]
    fn test_prefix_normalization() {
        let mut config = ApiConfig::default();
        config.api_prefix = "api/v2/".to_string();
        assert_eq!(config.normalized_prefix(), "/api/v2");
        config.api_prefix = "/".to_string();
        assert_eq!(config.normalized_prefix(), "");
    }

    #[test]
    fn test_json_file_uses_defaults_for_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.json");
        std::fs::write(&path, r#"{"port": 8080, "api_prefix": "/v1"}"#).unwrap();

        let config = ApiConfig::from_json_file(&path).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.api_prefix, "/v1");
        assert_eq!(config.host, "0.0.0.0");

        let missing = ApiConfig::from_json_file(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
