//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub redis: RedisConfig,
    pub relay: RelaySettings,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            _ => Err(()),
        }
    }
}

/// Redis connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_host")]
    pub host: String,
    #[serde(default = "default_redis_port")]
    pub port: u16,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: i64,
    /// Connect and wait timeout in milliseconds
    #[serde(default = "default_redis_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
    /// Full connection URL; takes precedence over host/port/password/database
    #[serde(default)]
    pub url: Option<String>,
}

impl RedisConfig {
    /// Connection URL, e.g. `redis://:secret@127.0.0.1:6379/0`
    ///
    /// The password is percent-encoded, so it may contain any character.
    #[must_use]
    pub fn url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }

        match self.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                urlencoding::encode(password),
                self.host,
                self.port,
                self.database
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.database),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: default_redis_host(),
            port: default_redis_port(),
            password: None,
            database: 0,
            timeout_ms: default_redis_timeout_ms(),
            max_connections: default_redis_max_connections(),
            url: None,
        }
    }
}

/// Receiver registry and transport settings
#[derive(Debug, Clone, Deserialize)]
pub struct RelaySettings {
    /// Emit a debug record for every received event
    #[serde(default)]
    pub debug: bool,
    /// Channels subscribed at startup
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            debug: false,
            channels: Vec::new(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "keyed-relay".to_string()
}

fn default_redis_host() -> String {
    "127.0.0.1".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_redis_timeout_ms() -> u64 {
    2000
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is set to a value that cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let vars = Vars(lookup);

        Ok(Self {
            app: AppSettings {
                name: vars.get("APP_NAME").unwrap_or_else(default_app_name),
                env: match vars.get("APP_ENV") {
                    Some(value) => value
                        .parse()
                        .map_err(|()| ConfigError::InvalidValue("APP_ENV", value))?,
                    None => Environment::default(),
                },
            },
            redis: RedisConfig {
                host: vars.get("REDIS_HOST").unwrap_or_else(default_redis_host),
                port: vars.parse_or("REDIS_PORT", default_redis_port())?,
                password: vars.get("REDIS_PASSWORD"),
                database: vars.parse_or("REDIS_DB", 0)?,
                timeout_ms: vars.parse_or("REDIS_TIMEOUT_MS", default_redis_timeout_ms())?,
                max_connections: vars
                    .parse_or("REDIS_MAX_CONNECTIONS", default_redis_max_connections())?,
                url: vars.get("REDIS_URL"),
            },
            relay: RelaySettings {
                debug: vars.flag("RELAY_DEBUG")?,
                channels: vars
                    .get("RELAY_CHANNELS")
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|c| !c.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default(),
                reconnect_delay_ms: vars
                    .parse_or("RELAY_RECONNECT_DELAY_MS", default_reconnect_delay_ms())?,
            },
        })
    }
}

/// Variable lookup with parsing helpers
struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&'static str) -> Option<String>,
{
    /// Non-empty value of a variable
    fn get(&self, name: &'static str) -> Option<String> {
        (self.0)(name).filter(|v| !v.trim().is_empty())
    }

    fn parse_or<T: FromStr>(&self, name: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(name) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(name, value)),
            None => Ok(default),
        }
    }

    fn flag(&self, name: &'static str) -> Result<bool, ConfigError> {
        match self.get(name) {
            Some(value) => match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidValue(name, value)),
            },
            None => Ok(false),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&'static str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<&'static str, String> =
            pairs.iter().map(|(k, v)| (*k, (*v).to_string())).collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_environment_is_production() {
        assert!(!Environment::Development.is_production());
        assert!(!Environment::Staging.is_production());
        assert!(Environment::Production.is_production());
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!("PRODUCTION".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!("staging".parse::<Environment>(), Ok(Environment::Staging));
        assert!("qa".parse::<Environment>().is_err());
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = load(&[]).unwrap();

        assert_eq!(config.app.name, "keyed-relay");
        assert!(config.app.env.is_development());
        assert_eq!(config.redis.host, "127.0.0.1");
        assert_eq!(config.redis.port, 6379);
        assert_eq!(config.redis.timeout_ms, 2000);
        assert_eq!(config.redis.max_connections, 10);
        assert!(!config.relay.debug);
        assert!(config.relay.channels.is_empty());
        assert_eq!(config.relay.reconnect_delay_ms, 1000);
    }

    #[test]
    fn test_values_from_lookup() {
        let config = load(&[
            ("APP_ENV", "production"),
            ("REDIS_HOST", "cache.internal"),
            ("REDIS_PORT", "6380"),
            ("REDIS_PASSWORD", "s3cret"),
            ("REDIS_DB", "2"),
            ("RELAY_DEBUG", "yes"),
            ("RELAY_CHANNELS", "chat, status,,alerts "),
        ])
        .unwrap();

        assert!(config.app.env.is_production());
        assert_eq!(config.redis.url(), "redis://:s3cret@cache.internal:6380/2");
        assert!(config.relay.debug);
        assert_eq!(config.relay.channels, vec!["chat", "status", "alerts"]);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let err = load(&[("REDIS_PORT", "sixty")]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for REDIS_PORT: sixty");

        let err = load(&[("RELAY_DEBUG", "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue("RELAY_DEBUG", _)));

        assert!(load(&[("APP_ENV", "qa")]).is_err());
    }

    #[test]
    fn test_redis_url() {
        let mut config = RedisConfig::default();
        assert_eq!(config.url(), "redis://127.0.0.1:6379/0");

        config.password = Some(String::new());
        assert_eq!(config.url(), "redis://127.0.0.1:6379/0");

        config.password = Some("p@ss/w#rd:%".to_string());
        assert_eq!(
            config.url(),
            "redis://:p%40ss%2Fw%23rd%3A%25@127.0.0.1:6379/0"
        );

        config.url = Some("redis://override:1234".to_string());
        assert_eq!(config.url(), "redis://override:1234");
    }
}
