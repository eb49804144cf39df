//! Client settings
//!
//! YAML settings for the command line driver and for applications that
//! prefer a file over the builder:
//!
//! ```yaml
//! base_url: https://api.example.com
//! timeout_seconds: 30
//! refresh_timeout_seconds: 10
//! login_path: /auth/login
//! refresh_path: /auth/reissue
//! token_file: .session-http/tokens.json
//! headers:
//!   X-Client: cli
//! ```

use crate::error::{Error, Result};
use crate::http::HttpClientConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Settings loaded from YAML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// API base URL
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Refresh call timeout in seconds
    #[serde(default = "default_refresh_timeout")]
    pub refresh_timeout_seconds: u64,

    /// Login endpoint path
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Refresh endpoint path
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,

    /// Where the file token store keeps its tokens
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_timeout() -> u64 {
    30
}

fn default_refresh_timeout() -> u64 {
    10
}

fn default_login_path() -> String {
    "/auth/login".to_string()
}

fn default_refresh_path() -> String {
    "/auth/reissue".to_string()
}

fn default_token_file() -> PathBuf {
    PathBuf::from(".session-http/tokens.json")
}

impl ClientSettings {
    /// Settings with defaults for everything but the base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_seconds: default_timeout(),
            refresh_timeout_seconds: default_refresh_timeout(),
            login_path: default_login_path(),
            refresh_path: default_refresh_path(),
            token_file: default_token_file(),
            user_agent: None,
            headers: HashMap::new(),
        }
    }

    /// Parse and validate settings from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let settings: Self = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read settings file {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Check the values that serde cannot
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_value(
                "base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(Error::invalid_value("timeout_seconds", "must be positive"));
        }
        if self.refresh_timeout_seconds == 0 {
            return Err(Error::invalid_value(
                "refresh_timeout_seconds",
                "must be positive",
            ));
        }
        for (field, value) in [
            ("login_path", &self.login_path),
            ("refresh_path", &self.refresh_path),
        ] {
            if value.is_empty() {
                return Err(Error::invalid_value(field, "must not be empty"));
            }
        }
        Ok(())
    }

    /// Build the HTTP client configuration
    pub fn to_http_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .base_url(&self.base_url)
            .timeout(Duration::from_secs(self.timeout_seconds))
            .refresh_timeout(Duration::from_secs(self.refresh_timeout_seconds))
            .login_path(&self.login_path)
            .refresh_path(&self.refresh_path);

        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_minimal_settings_use_defaults() {
        let settings = ClientSettings::from_yaml_str("base_url: https://api.example.com").unwrap();
        assert_eq!(settings, ClientSettings::new("https://api.example.com"));
    }

    #[test]
    fn test_full_settings() {
        let yaml = r"
base_url: http://localhost:8080/api
timeout_seconds: 5
refresh_timeout_seconds: 2
login_path: /v2/auth/login
refresh_path: /v2/auth/reissue
token_file: /tmp/tokens.json
user_agent: jobs-cli/1.0
headers:
  X-Client: cli
";
        let settings = ClientSettings::from_yaml_str(yaml).unwrap();
        let config = settings.to_http_config();

        assert_eq!(
            config.base_url.as_deref(),
            Some("http://localhost:8080/api")
        );
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.refresh_timeout, Duration::from_secs(2));
        assert_eq!(config.login_path, "/v2/auth/login");
        assert_eq!(config.refresh_path, "/v2/auth/reissue");
        assert_eq!(config.user_agent, "jobs-cli/1.0");
        assert_eq!(config.default_headers.get("X-Client").unwrap(), "cli");
        assert_eq!(settings.token_file, PathBuf::from("/tmp/tokens.json"));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = ClientSettings::from_yaml_str("base_url: not a url").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));

        let err = ClientSettings::from_yaml_str("base_url: ftp://example.com").unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_zero_refresh_timeout_rejected() {
        let yaml = "base_url: https://api.example.com\nrefresh_timeout_seconds: 0";
        let err = ClientSettings::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("refresh_timeout_seconds"));
    }

    #[test]
    fn test_missing_base_url() {
        let err = ClientSettings::from_yaml_str("timeout_seconds: 5").unwrap_err();
        assert!(matches!(err, Error::YamlParse(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.yaml");
        std::fs::write(&path, "base_url: https://api.example.com\n").unwrap();

        let settings = ClientSettings::from_file(&path).unwrap();
        assert_eq!(settings.base_url, "https://api.example.com");

        let err = ClientSettings::from_file(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
