//! Configuration types for akita-hyper

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use hyper::Version;

use crate::{AkitaError, Result};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HAR file the instrumented client writes to
    #[serde(default = "default_har_file_path")]
    pub har_file_path: PathBuf,
    /// Prefix prepended to every request path
    #[serde(default)]
    pub url_prefix: String,
    /// HTTP version reported for captured exchanges
    #[serde(default = "default_http_version")]
    pub http_version: String,
    /// Headers sent with every request
    #[serde(default)]
    pub default_headers: Vec<HeaderConfig>,
    /// Resource limits
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// A single default header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderConfig {
    /// Header name
    pub name: String,
    /// Header value
    pub value: String,
}

/// Resource limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum response body size in bytes
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 16 * 1024 * 1024, // 16 MB
        }
    }
}

fn default_har_file_path() -> PathBuf {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    PathBuf::from(format!("akita_trace_{secs}.har"))
}

fn default_http_version() -> String {
    "HTTP/1.1".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            har_file_path: default_har_file_path(),
            url_prefix: String::new(),
            http_version: default_http_version(),
            default_headers: Vec::new(),
            limits: LimitsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AkitaError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| AkitaError::ConfigError(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<()> {
        if self.har_file_path.as_os_str().is_empty() {
            return Err(AkitaError::ConfigError(
                "har_file_path cannot be empty".to_string(),
            ));
        }

        if !self.url_prefix.is_empty() && !self.url_prefix.starts_with('/') {
            return Err(AkitaError::ConfigError(format!(
                "url_prefix must start with '/': {}",
                self.url_prefix
            )));
        }

        self.version()?;
        self.default_header_map()?;

        if self.limits.max_body_size == 0 {
            return Err(AkitaError::ConfigError(
                "max_body_size must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// HTTP version sent with every request
    ///
    /// # Errors
    ///
    /// Returns error if `http_version` is not a known HTTP version
    pub fn version(&self) -> Result<Version> {
        parse_version(&self.http_version).ok_or_else(|| {
            AkitaError::ConfigError(format!("Unknown http_version: {}", self.http_version))
        })
    }

    /// Build the default header map
    ///
    /// # Errors
    ///
    /// Returns error if a header name or value is invalid
    pub fn default_header_map(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (i, header) in self.default_headers.iter().enumerate() {
            let name = HeaderName::from_bytes(header.name.as_bytes()).map_err(|e| {
                AkitaError::ConfigError(format!("Default header {i}: invalid name: {e}"))
            })?;
            let value = HeaderValue::from_str(&header.value).map_err(|e| {
                AkitaError::ConfigError(format!("Default header {i}: invalid value: {e}"))
            })?;
            headers.append(name, value);
        }
        Ok(headers)
    }
}

/// Parse an `HTTP/x.y` version string
pub fn parse_version(version: &str) -> Option<Version> {
    match version.trim().to_ascii_uppercase().as_str() {
        "HTTP/0.9" => Some(Version::HTTP_09),
        "HTTP/1.0" => Some(Version::HTTP_10),
        "HTTP/1.1" => Some(Version::HTTP_11),
        "HTTP/2" | "HTTP/2.0" => Some(Version::HTTP_2),
        "HTTP/3" | "HTTP/3.0" => Some(Version::HTTP_3),
        _ => None,
    }
}
