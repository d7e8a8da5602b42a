//! Configuration loading for the Tournaments API.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `TOURNEY_`, producing a typed [`AppConfig`].

use std::{collections::BTreeMap, env, net::SocketAddr, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const ENV_PREFIX: &str = "TOURNEY_";
const REDACTED: &str = "[REDACTED]";

/// Application configuration derived from `TOURNEY_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_api_bind_addr")]
    pub api_bind_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_acquire_timeout_ms")]
    pub db_acquire_timeout_ms: u64,
    /// Upper bound on every record store call made while serving a request.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    #[serde(default = "default_list_default_limit")]
    pub list_default_limit: u64,
    #[serde(default = "default_list_max_limit")]
    pub list_max_limit: u64,
    /// Sessions issued by the identity provider, `token=user_id`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub session_tokens: Vec<SessionToken>,
}

/// A bearer token and the user it authenticates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: String,
    pub user_id: String,
}

impl FromStr for SessionToken {
    type Err = ConfigError;

    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidSessionToken {
            entry: redact_entry(entry),
        };
        let (token, user_id) = entry.split_once('=').ok_or_else(invalid)?;
        let (token, user_id) = (token.trim(), user_id.trim());
        if token.is_empty() || user_id.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            token: token.to_string(),
            user_id: user_id.to_string(),
        })
    }
}

/// Keeps only the user half of a `token=user` entry for error messages.
fn redact_entry(entry: &str) -> String {
    match entry.split_once('=') {
        Some((_, user)) => format!("{REDACTED}={}", user.trim()),
        None => REDACTED.to_string(),
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            api_bind_addr: default_api_bind_addr(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            database_url: default_database_url(),
            db_max_connections: default_db_max_connections(),
            db_acquire_timeout_ms: default_db_acquire_timeout_ms(),
            store_timeout_ms: default_store_timeout_ms(),
            list_default_limit: default_list_default_limit(),
            list_max_limit: default_list_max_limit(),
            session_tokens: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Returns the configured bind address as a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.api_bind_addr.parse()
    }

    /// Returns a redacted JSON representation (session tokens are masked).
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut config = self.clone();
        for session in &mut config.session_tokens {
            session.token = REDACTED.to_string();
        }
        serde_json::to_string_pretty(&config)
    }

    fn is_dev_profile(&self) -> bool {
        matches!(self.profile.as_str(), "local" | "test")
    }

    /// Validates the configuration, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::InvalidStoreTimeout);
        }

        if self.list_max_limit == 0 {
            return Err(ConfigError::InvalidListMaxLimit);
        }

        if self.list_default_limit == 0 || self.list_default_limit > self.list_max_limit {
            return Err(ConfigError::InvalidListDefaultLimit {
                value: self.list_default_limit,
                max: self.list_max_limit,
            });
        }

        if let Some(session) = self
            .session_tokens
            .iter()
            .find(|s| s.token.trim().is_empty() || s.user_id.trim().is_empty())
        {
            return Err(ConfigError::InvalidSessionToken {
                entry: format!("{REDACTED}={}", session.user_id),
            });
        }

        // Outside local/test nobody could ever authenticate.
        if !self.is_dev_profile() && self.session_tokens.is_empty() {
            return Err(ConfigError::MissingSessionTokens {
                profile: self.profile.clone(),
            });
        }

        Ok(())
    }
}

fn default_profile() -> String {
    "local".to_string()
}

fn default_api_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_database_url() -> String {
    "sqlite://tournaments.db?mode=rwc".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_acquire_timeout_ms() -> u64 {
    5000
}

fn default_store_timeout_ms() -> u64 {
    5000
}

fn default_list_default_limit() -> u64 {
    9
}

fn default_list_max_limit() -> u64 {
    100
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid api bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("{key} must be a non-negative integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
    #[error("store timeout must be greater than zero")]
    InvalidStoreTimeout,
    #[error("list max limit must be greater than zero")]
    InvalidListMaxLimit,
    #[error("list default limit must be between 1 and {max}, got {value}")]
    InvalidListDefaultLimit { value: u64, max: u64 },
    #[error("invalid session token entry '{entry}'; expected token=user_id")]
    InvalidSessionToken { entry: String },
    #[error("no session tokens configured for profile '{profile}'; set TOURNEY_SESSION_TOKENS")]
    MissingSessionTokens { profile: String },
}

/// Loads configuration using layered `.env` files and `TOURNEY_*` env vars.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads `.env`, `.env.local`, `.env.{profile}`, `.env.{profile}.local`,
    /// then the process environment, later sources winning.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        // Overlay process environment last so it wins.
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layered.insert(stripped.to_string(), value);
            }
        }

        let mut text = |key: &str, default: fn() -> String| {
            layered
                .remove(key)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(default)
        };

        let profile = text("PROFILE", String::new);
        let profile = if profile.is_empty() { profile_hint } else { profile };
        let api_bind_addr = text("API_BIND_ADDR", default_api_bind_addr);
        let log_level = text("LOG_LEVEL", default_log_level);
        let log_format = text("LOG_FORMAT", default_log_format);
        let database_url = text("DATABASE_URL", default_database_url);

        let db_max_connections = parse_number(
            &mut layered,
            "DB_MAX_CONNECTIONS",
            default_db_max_connections,
        )?;
        let db_acquire_timeout_ms = parse_number(
            &mut layered,
            "DB_ACQUIRE_TIMEOUT_MS",
            default_db_acquire_timeout_ms,
        )?;
        let store_timeout_ms =
            parse_number(&mut layered, "STORE_TIMEOUT_MS", default_store_timeout_ms)?;
        let list_default_limit = parse_number(
            &mut layered,
            "LIST_DEFAULT_LIMIT",
            default_list_default_limit,
        )?;
        let list_max_limit =
            parse_number(&mut layered, "LIST_MAX_LIMIT", default_list_max_limit)?;

        let session_tokens = layered
            .remove("SESSION_TOKENS")
            .map(|raw| parse_session_tokens(&raw))
            .transpose()?
            .unwrap_or_default();

        let config = AppConfig {
            profile,
            api_bind_addr,
            log_level,
            log_format,
            database_url,
            db_max_connections,
            db_acquire_timeout_ms,
            store_timeout_ms,
            list_default_limit,
            list_max_limit,
            session_tokens,
        };

        config.validate()?;

        match config.bind_addr() {
            Ok(_) => Ok(config),
            Err(source) => Err(ConfigError::InvalidBindAddr {
                value: config.api_bind_addr.clone(),
                source,
            }),
        }
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var(format!("{ENV_PREFIX}PROFILE"))
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_number<T: FromStr>(
    layered: &mut BTreeMap<String, String>,
    key: &'static str,
    default: fn() -> T,
) -> Result<T, ConfigError> {
    match layered.remove(key).map(|v| v.trim().to_string()) {
        Some(value) if !value.is_empty() => value
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        _ => Ok(default()),
    }
}

/// Parses `token=user,token=user`; blank entries are skipped.
pub fn parse_session_tokens(raw: &str) -> Result<Vec<SessionToken>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(SessionToken::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(token: &str, user: &str) -> SessionToken {
        SessionToken {
            token: token.to_string(),
            user_id: user.to_string(),
        }
    }

    #[test]
    fn defaults_are_valid_for_local_profile() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.list_default_limit, 9);
        assert_eq!(config.list_max_limit, 100);
        assert_eq!(config.store_timeout_ms, 5000);
        config.bind_addr().unwrap();
    }

    #[test]
    fn parses_session_token_list() {
        let tokens = parse_session_tokens(" abc=user-1 , ,def = user-2").unwrap();
        assert_eq!(tokens, vec![session("abc", "user-1"), session("def", "user-2")]);
    }

    #[test]
    fn malformed_session_token_is_rejected_without_leaking_it() {
        for raw in ["secret", "secret=", "=user-1"] {
            let err = parse_session_tokens(raw).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidSessionToken { .. }));
            assert!(!err.to_string().contains("secret"));
        }
    }

    #[test]
    fn zero_store_timeout_is_rejected() {
        let config = AppConfig {
            store_timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidStoreTimeout)
        ));
    }

    #[test]
    fn default_limit_must_fit_under_max() {
        for (default, max) in [(0, 100), (101, 100)] {
            let config = AppConfig {
                list_default_limit: default,
                list_max_limit: max,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidListDefaultLimit { .. })
            ));
        }
    }

    #[test]
    fn production_requires_session_tokens() {
        let mut config = AppConfig {
            profile: "prod".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingSessionTokens { .. })
        ));

        config.session_tokens = vec![session("abc", "user-1")];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn redacted_json_masks_tokens_but_keeps_users() {
        let config = AppConfig {
            session_tokens: vec![session("super-secret", "user-1")],
            ..Default::default()
        };
        let json = config.redacted_json().unwrap();

        assert!(!json.contains("super-secret"));
        assert!(json.contains("[REDACTED]"));
        assert!(json.contains("user-1"));
    }
}
