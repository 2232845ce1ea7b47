//! Configuration management for the JSON file server
//!
//! Settings are layered: built-in defaults, an optional TOML file, `JFS_*`
//! environment variables and finally command line flags (applied by the
//! binary). [`Config::validate`] runs once all layers are in.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Pagination settings shared by every collection route
    pub pagination: PaginationConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Served collections
    pub routes: Vec<RouteConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// TCP port to listen on (all interfaces)
    pub port: u16,

    /// Prefix prepended to every route path
    pub base_path: String,

    /// Artificial delay applied before answering each request
    #[serde(
        serialize_with = "serialize_duration",
        deserialize_with = "deserialize_duration"
    )]
    pub fake_load: Duration,
}

/// Where page parameters are read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestLocation {
    /// `?page=..&size=..`
    #[serde(rename = "query-param")]
    QueryParam,
    /// `page` and `size` request headers
    #[serde(rename = "header")]
    Header,
}

/// Where page metadata is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseLocation {
    /// A page object wrapping the content
    Body,
    /// `page-*` response headers with a bare content array
    Header,
}

/// Pagination configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Paginate list responses; when off, lists return the raw file
    pub enabled: bool,

    /// Source of the `page` and `size` parameters
    pub request_location: RequestLocation,

    /// Destination of the page metadata
    pub response_location: ResponseLocation,

    /// Page size used when the request carries none
    pub default_page_size: usize,

    /// Pages are numbered from 1 instead of 0
    pub one_indexed: bool,
}

/// A JSON file exposed as a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Route path, e.g. `/users`
    pub path: String,

    /// Backing JSON file
    pub file: PathBuf,

    /// Record key used as identity
    #[serde(default = "default_id_field")]
    pub id_field: String,

    /// Serve the file verbatim (no pagination, no item routes, no writes)
    #[serde(default)]
    pub raw: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            base_path: String::new(),
            fake_load: Duration::ZERO,
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            request_location: RequestLocation::QueryParam,
            response_location: ResponseLocation::Body,
            default_page_size: 20,
            one_indexed: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn default_id_field() -> String {
    "id".to_string()
}

impl RouteConfig {
    /// Collection route with the given identity field
    pub fn collection(path: impl Into<String>, file: impl Into<PathBuf>, id_field: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file: file.into(),
            id_field: id_field.into(),
            raw: false,
        }
    }

    /// Passthrough route serving the file verbatim
    pub fn raw(path: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: file.into(),
            id_field: default_id_field(),
            raw: true,
        }
    }
}

impl FromStr for RequestLocation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "query-param" => Ok(Self::QueryParam),
            "header" => Ok(Self::Header),
            other => Err(Error::config(format!(
                "Invalid page request location: {}. Valid options: query-param, header",
                other
            ))),
        }
    }
}

impl FromStr for ResponseLocation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "body" => Ok(Self::Body),
            "header" => Ok(Self::Header),
            other => Err(Error::config(format!(
                "Invalid page response location: {}. Valid options: body, header",
                other
            ))),
        }
    }
}

impl Config {
    /// Load configuration from an optional TOML file plus environment overrides
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        use std::env;

        if let Ok(port) = env::var("JFS_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| Error::config(format!("Invalid port: {}", e)))?;
        }

        if let Ok(base_path) = env::var("JFS_BASE_PATH") {
            self.server.base_path = base_path;
        }

        if let Ok(fake_load) = env::var("JFS_FAKE_LOAD") {
            self.server.fake_load = parse_duration(&fake_load)
                .map_err(|e| Error::config(format!("Invalid fake load: {}", e)))?;
        }

        if let Ok(size) = env::var("JFS_DEFAULT_PAGE_SIZE") {
            self.pagination.default_page_size = size
                .parse()
                .map_err(|e| Error::config(format!("Invalid default page size: {}", e)))?;
        }

        if let Ok(level) = env::var("JFS_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.pagination.default_page_size == 0 {
            return Err(Error::config("Default page size must be positive"));
        }

        if !self.server.base_path.is_empty() && !self.server.base_path.starts_with('/') {
            return Err(Error::config(format!(
                "Base path must start with '/': {}",
                self.server.base_path
            )));
        }

        if has_path_syntax(&self.server.base_path) {
            return Err(Error::config(format!(
                "Base path must not contain ':' or '*': {}",
                self.server.base_path
            )));
        }

        for (i, route) in self.routes.iter().enumerate() {
            if !route.path.starts_with('/') || route.path.len() < 2 {
                return Err(Error::config(format!("Invalid route path: '{}'", route.path)));
            }
            if has_path_syntax(&route.path) {
                return Err(Error::config(format!(
                    "Route path must not contain ':' or '*': {}",
                    route.path
                )));
            }
            if route.path.ends_with('/') {
                return Err(Error::config(format!(
                    "Route path must not end with '/': {}",
                    route.path
                )));
            }
            if route.id_field.is_empty() {
                return Err(Error::config(format!("Empty id field for route {}", route.path)));
            }
            if self.routes[..i].iter().any(|other| other.path == route.path) {
                return Err(Error::config(format!("Duplicate route path: {}", route.path)));
            }
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(Error::config("Invalid log level")),
        }

        Ok(())
    }

    /// Full path a route is mounted at
    pub fn mount_path(&self, route: &RouteConfig) -> String {
        format!("{}{}", self.server.base_path.trim_end_matches('/'), route.path)
    }
}

// Router captures and wildcards; routes are always literal
fn has_path_syntax(path: &str) -> bool {
    path.contains([':', '*'])
}

use serde::de::{self, Deserializer, Visitor};
use serde::Serializer;
use std::fmt;

// Durations are written as strings like "250ms" or "2s"
fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct DurationVisitor;

    impl<'de> Visitor<'de> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a duration string like '250ms', '2s' or '1m30s'")
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Duration, E>
        where
            E: de::Error,
        {
            parse_duration(value).map_err(E::custom)
        }

        fn visit_i64<E>(self, value: i64) -> std::result::Result<Duration, E>
        where
            E: de::Error,
        {
            u64::try_from(value)
                .map(Duration::from_secs)
                .map_err(|_| E::custom("duration must not be negative"))
        }
    }

    deserializer.deserialize_any(DurationVisitor)
}

fn serialize_duration<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("{}ms", duration.as_millis()))
}

/// Parse a duration such as `300ms`, `1.5s`, `2m` or `1h30m`.
///
/// Every number needs a unit; only `0` may stand alone. Recognised units
/// are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let invalid = || format!("invalid duration '{}'", s);
    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(invalid());
        }
        let value: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];

        let nanos = (value * nanos_per_unit).round();
        if !nanos.is_finite() || nanos >= u64::MAX as f64 {
            return Err(invalid());
        }
        let part = Duration::from_nanos(nanos as u64);
        total = total.checked_add(part).ok_or_else(invalid)?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.fake_load, Duration::ZERO);
        assert!(!config.pagination.enabled);
        assert_eq!(config.pagination.default_page_size, 20);
        assert_eq!(config.pagination.request_location, RequestLocation::QueryParam);
        assert_eq!(config.pagination.response_location, ResponseLocation::Body);
        assert!(config.routes.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 3000
            base_path = "/api"
            fake_load = "250ms"

            [pagination]
            enabled = true
            request_location = "header"
            response_location = "header"
            default_page_size = 5
            one_indexed = true

            [[routes]]
            path = "/users"
            file = "users.json"

            [[routes]]
            path = "/raw"
            file = "raw.json"
            id_field = "uuid"
            raw = true
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.fake_load, Duration::from_millis(250));
        assert!(config.pagination.enabled);
        assert!(config.pagination.one_indexed);
        assert_eq!(config.pagination.request_location, RequestLocation::Header);
        assert_eq!(config.pagination.response_location, ResponseLocation::Header);
        assert_eq!(config.routes[0], RouteConfig::collection("/users", "users.json", "id"));
        assert_eq!(config.routes[1].id_field, "uuid");
        assert!(config.routes[1].raw);
        assert_eq!(config.mount_path(&config.routes[0]), "/api/users");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_unknown_location_rejected() {
        let result = Config::from_toml("[pagination]\nrequest_location = \"cookie\"\n");
        assert!(matches!(result, Err(Error::Config(_))));
        assert!("cookie".parse::<RequestLocation>().is_err());
        assert_eq!("header".parse::<ResponseLocation>().unwrap(), ResponseLocation::Header);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.pagination.default_page_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.routes.push(RouteConfig::collection("users", "users.json", "id"));
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.routes.push(RouteConfig::collection("/users", "a.json", "id"));
        config.routes.push(RouteConfig::raw("/users", "b.json"));
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        for path in ["/files/*rest", "/users/:id", "/a:b"] {
            let mut config = Config::default();
            config.routes.push(RouteConfig::collection(path, "users.json", "id"));
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("':' or '*'"), "{}", err);
        }

        let mut config = Config::default();
        config.server.base_path = "/:tenant".to_string();
        config.routes.push(RouteConfig::collection("/users", "users.json", "id"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration("300ms").unwrap(), Duration::from_millis(300));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("10us").unwrap(), Duration::from_micros(10));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("fast").is_err());
        assert!(parse_duration("5x").is_err());
        assert!(parse_duration("5").is_err());
        assert!(parse_duration("1s5").is_err());
        assert!(parse_duration("-1s").is_err());
    }
}
