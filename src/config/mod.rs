//! Configuration management
//!
//! This module handles loading and parsing configuration for the La Trouvaille
//! content service. Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Query cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Public site information
    #[serde(default)]
    pub site: SiteConfig,
    /// Comment moderation
    #[serde(default)]
    pub comments: CommentsConfig,
    /// Outgoing mail (contact notifications)
    #[serde(default)]
    pub mail: MailConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (the website front end)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/latrouvaille.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Query cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Staleness window in seconds: how long a query result is served from cache
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of cached query results
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_ttl() -> u64 {
    60
}

fn default_max_capacity() -> u64 {
    10_000
}

/// Public site information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site name, used in notification subjects
    #[serde(default = "default_site_name")]
    pub name: String,
    /// Public URL of the website
    #[serde(default = "default_site_url")]
    pub url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            url: default_site_url(),
        }
    }
}

fn default_site_name() -> String {
    "La Trouvaille".to_string()
}

fn default_site_url() -> String {
    "http://localhost:3000".to_string()
}

/// Comment moderation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentsConfig {
    /// When true, new comments are stored as pending and hidden until approved
    #[serde(default)]
    pub require_approval: bool,
}

/// SMTP configuration for contact notifications
///
/// Notifications are disabled while `smtp_host` is unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    /// Sender address
    #[serde(default = "default_mail_from")]
    pub from: String,
    /// Recipient of contact form notifications
    #[serde(default)]
    pub notify_to: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            from: default_mail_from(),
            notify_to: None,
        }
    }
}

impl MailConfig {
    /// Whether contact notifications can be sent
    pub fn is_enabled(&self) -> bool {
        self.smtp_host.as_deref().map_or(false, |h| !h.trim().is_empty()) && self.notify_to.is_some()
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_mail_from() -> String {
    "no-reply@latrouvaille.local".to_string()
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - LATROUVAILLE_SERVER_HOST
    /// - LATROUVAILLE_SERVER_PORT
    /// - LATROUVAILLE_SERVER_CORS_ORIGIN
    /// - LATROUVAILLE_DATABASE_DRIVER
    /// - LATROUVAILLE_DATABASE_URL
    /// - LATROUVAILLE_CACHE_TTL_SECONDS
    /// - LATROUVAILLE_COMMENTS_REQUIRE_APPROVAL
    /// - LATROUVAILLE_MAIL_SMTP_HOST, _SMTP_PORT, _SMTP_USERNAME, _SMTP_PASSWORD, _FROM, _NOTIFY_TO
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("LATROUVAILLE_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("LATROUVAILLE_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("LATROUVAILLE_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Ok(driver) = std::env::var("LATROUVAILLE_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("LATROUVAILLE_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(ttl) = std::env::var("LATROUVAILLE_CACHE_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.cache.ttl_seconds = ttl;
            }
        }

        if let Ok(flag) = std::env::var("LATROUVAILLE_COMMENTS_REQUIRE_APPROVAL") {
            if let Ok(flag) = flag.parse::<bool>() {
                self.comments.require_approval = flag;
            }
        }

        if let Ok(host) = std::env::var("LATROUVAILLE_MAIL_SMTP_HOST") {
            self.mail.smtp_host = Some(host);
        }
        if let Ok(port) = std::env::var("LATROUVAILLE_MAIL_SMTP_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.mail.smtp_port = port;
            }
        }
        if let Ok(username) = std::env::var("LATROUVAILLE_MAIL_SMTP_USERNAME") {
            self.mail.smtp_username = Some(username);
        }
        if let Ok(password) = std::env::var("LATROUVAILLE_MAIL_SMTP_PASSWORD") {
            self.mail.smtp_password = Some(password);
        }
        if let Ok(from) = std::env::var("LATROUVAILLE_MAIL_FROM") {
            self.mail.from = from;
        }
        if let Ok(to) = std::env::var("LATROUVAILLE_MAIL_NOTIFY_TO") {
            self.mail.notify_to = Some(to);
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn config_strategy() -> impl Strategy<Value = Config> {
        (
            "[a-z0-9.]{1,20}",
            1u16..=65535,
            prop_oneof![Just(DatabaseDriver::Sqlite), Just(DatabaseDriver::Mysql)],
            "[a-z/]{1,30}\\.db",
            1u64..=86_400,
            any::<bool>(),
        )
            .prop_map(|(host, port, driver, url, ttl, require_approval)| Config {
                server: ServerConfig {
                    host,
                    port,
                    ..ServerConfig::default()
                },
                database: DatabaseConfig { driver, url },
                cache: CacheConfig {
                    ttl_seconds: ttl,
                    ..CacheConfig::default()
                },
                comments: CommentsConfig { require_approval },
                ..Config::default()
            })
    }

    proptest! {
        #[test]
        fn yaml_serialization_preserves_fields(config in config_strategy()) {
            let yaml = serde_yaml::to_string(&config).unwrap();
            let parsed: Config = serde_yaml::from_str(&yaml).unwrap();

            prop_assert_eq!(parsed.server.host, config.server.host);
            prop_assert_eq!(parsed.server.port, config.server.port);
            prop_assert_eq!(parsed.database.driver, config.database.driver);
            prop_assert_eq!(parsed.database.url, config.database.url);
            prop_assert_eq!(parsed.cache.ttl_seconds, config.cache.ttl_seconds);
            prop_assert_eq!(parsed.comments.require_approval, config.comments.require_approval);
        }
    }
}
