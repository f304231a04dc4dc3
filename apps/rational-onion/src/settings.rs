//! # Settings
//!
//! Application settings, loaded once at startup and immutable afterwards.
//!
//! Sources, later ones winning:
//! 1. built-in defaults
//! 2. an optional TOML file (`--config` / `ONION_CONFIG`)
//! 3. `ONION_*` environment variables
//!
//! ## Environment Variables
//!
//! - `ONION_HOST`, `ONION_PORT`: bind address
//! - `ONION_DATABASE`: redb file path
//! - `ONION_BACKEND`: `redb` or `memory`
//! - `ONION_API_KEYS`: comma-separated list of accepted API keys
//! - `ONION_RATE_LIMIT`: `N/second`, `N/minute`, `N/hour` or `off`
//! - `ONION_CORS_ORIGINS`: comma-separated origins, or `*`
//! - `ONION_POOL_SIZE`, `ONION_ACQUIRE_TIMEOUT_MS`: store pool bounds
//! - `ONION_MAX_CLAIM_LENGTH`, `ONION_MAX_GROUNDS_LENGTH`,
//!   `ONION_MAX_WARRANT_LENGTH`: engine field limits

use rational_onion_core::{EngineConfig, OnionError};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable naming the settings file.
pub const CONFIG_ENV: &str = "ONION_CONFIG";

// =============================================================================
// BACKEND
// =============================================================================

/// Which store the session runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Durable redb file.
    #[default]
    Redb,
    /// Volatile in-memory graph.
    Memory,
}

impl FromStr for Backend {
    type Err = OnionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redb" => Ok(Self::Redb),
            "memory" => Ok(Self::Memory),
            other => Err(OnionError::validation(
                "backend",
                format!("Unknown backend '{}': expected 'redb' or 'memory'", other),
            )),
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Redb => "redb",
            Self::Memory => "memory",
        })
    }
}

// =============================================================================
// RATE LIMIT
// =============================================================================

/// Window of a rate limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatePeriod {
    Second,
    Minute,
    Hour,
}

/// A parsed `N/period` rate limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub requests: NonZeroU32,
    pub period: RatePeriod,
}

impl std::fmt::Display for RateLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let period = match self.period {
            RatePeriod::Second => "second",
            RatePeriod::Minute => "minute",
            RatePeriod::Hour => "hour",
        };
        write!(f, "{}/{}", self.requests, period)
    }
}

/// Parse a rate limit string such as `"100/minute"`.
///
/// `"off"`, `"0"` and the empty string disable rate limiting.
pub fn parse_rate_limit(raw: &str) -> Result<Option<RateLimit>, OnionError> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("off") || raw == "0" {
        return Ok(None);
    }

    let invalid = || {
        OnionError::validation(
            "rate_limit",
            format!(
                "Invalid rate limit '{}': expected N/second, N/minute or N/hour",
                raw
            ),
        )
    };

    let (count, period) = raw.split_once('/').ok_or_else(invalid)?;
    let requests = count
        .trim()
        .parse::<u32>()
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or_else(invalid)?;
    let period = match period.trim().to_ascii_lowercase().as_str() {
        "second" | "s" => RatePeriod::Second,
        "minute" | "m" => RatePeriod::Minute,
        "hour" | "h" => RatePeriod::Hour,
        _ => return Err(invalid()),
    };

    Ok(Some(RateLimit { requests, period }))
}

// =============================================================================
// SETTINGS
// =============================================================================

/// Complete application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database: PathBuf,
    pub backend: Backend,
    /// Accepted API keys. Empty disables authentication.
    pub api_keys: Vec<String>,
    pub rate_limit: String,
    /// Allowed CORS origins. Empty means localhost only; `*` allows all.
    pub cors_origins: Vec<String>,
    /// Maximum concurrent store users.
    pub pool_size: usize,
    /// How long a request waits for the store before failing.
    pub acquire_timeout_ms: u64,
    pub engine: EngineConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            database: PathBuf::from("rational_onion.redb"),
            backend: Backend::default(),
            api_keys: Vec::new(),
            rate_limit: "100/minute".to_string(),
            cors_origins: Vec::new(),
            pool_size: 16,
            acquire_timeout_ms: 5000,
            engine: EngineConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from an optional file plus the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, OnionError> {
        let from_env = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let mut settings = match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse a TOML settings file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, OnionError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            OnionError::validation(
                "config",
                format!("Cannot read settings file '{}': {}", path.display(), e),
            )
        })?;
        Self::from_toml(&text)
    }

    /// Parse settings from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, OnionError> {
        toml::from_str(text)
            .map_err(|e| OnionError::validation("config", format!("Invalid settings: {}", e)))
    }

    /// Apply `ONION_*` overrides from `lookup`.
    ///
    /// Taking the lookup as a function keeps tests away from the real
    /// process environment.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), OnionError> {
        if let Some(v) = lookup("ONION_HOST") {
            self.host = v;
        }
        if let Some(v) = lookup("ONION_PORT") {
            self.port = parse_number("port", &v)?;
        }
        if let Some(v) = lookup("ONION_DATABASE") {
            self.database = PathBuf::from(v);
        }
        if let Some(v) = lookup("ONION_BACKEND") {
            self.backend = v.parse()?;
        }
        if let Some(v) = lookup("ONION_API_KEYS") {
            self.api_keys = split_list(&v);
        }
        if let Some(v) = lookup("ONION_RATE_LIMIT") {
            self.rate_limit = v;
        }
        if let Some(v) = lookup("ONION_CORS_ORIGINS") {
            self.cors_origins = split_list(&v);
        }
        if let Some(v) = lookup("ONION_POOL_SIZE") {
            self.pool_size = parse_number("pool_size", &v)?;
        }
        if let Some(v) = lookup("ONION_ACQUIRE_TIMEOUT_MS") {
            self.acquire_timeout_ms = parse_number("acquire_timeout_ms", &v)?;
        }
        if let Some(v) = lookup("ONION_MAX_CLAIM_LENGTH") {
            self.engine.max_claim_length = parse_number("max_claim_length", &v)?;
        }
        if let Some(v) = lookup("ONION_MAX_GROUNDS_LENGTH") {
            self.engine.max_grounds_length = parse_number("max_grounds_length", &v)?;
        }
        if let Some(v) = lookup("ONION_MAX_WARRANT_LENGTH") {
            self.engine.max_warrant_length = parse_number("max_warrant_length", &v)?;
        }
        Ok(())
    }

    /// Check every value that can be wrong after parsing.
    pub fn validate(&self) -> Result<(), OnionError> {
        self.engine.validate()?;
        parse_rate_limit(&self.rate_limit)?;
        if self.pool_size == 0 {
            return Err(OnionError::validation(
                "pool_size",
                "pool_size must be a positive integer",
            ));
        }
        if self.acquire_timeout_ms == 0 {
            return Err(OnionError::validation(
                "acquire_timeout_ms",
                "acquire_timeout_ms must be a positive integer",
            ));
        }
        Ok(())
    }

    /// The parsed rate limit, `None` when disabled.
    pub fn rate_limit(&self) -> Result<Option<RateLimit>, OnionError> {
        parse_rate_limit(&self.rate_limit)
    }

    /// `host:port` for binding.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T, OnionError> {
    raw.trim().parse().map_err(|_| {
        OnionError::validation(key, format!("{} must be a number, got '{}'", key, raw))
    })
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.engine.max_claim_length, 500);
        assert_eq!(settings.backend, Backend::Redb);
    }

    #[test]
    fn rate_limit_parsing() {
        let limit = parse_rate_limit("100/minute").expect("parse").expect("enabled");
        assert_eq!(limit.requests.get(), 100);
        assert_eq!(limit.period, RatePeriod::Minute);
        assert_eq!(limit.to_string(), "100/minute");

        assert_eq!(
            parse_rate_limit("5/Second").expect("parse").map(|l| l.period),
            Some(RatePeriod::Second)
        );
        assert!(parse_rate_limit("off").expect("parse").is_none());
        assert!(parse_rate_limit("fast").is_err());
        assert!(parse_rate_limit("0/minute").is_err());
        assert!(parse_rate_limit("10/day").is_err());
    }

    #[test]
    fn toml_partial_file_keeps_defaults() {
        let settings = Settings::from_toml(
            r#"
            port = 9000
            api_keys = ["k1", "k2"]

            [engine]
            max_claim_length = 42
            "#,
        )
        .expect("parse");

        assert_eq!(settings.port, 9000);
        assert_eq!(settings.api_keys, vec!["k1", "k2"]);
        assert_eq!(settings.engine.max_claim_length, 42);
        assert_eq!(settings.engine.max_grounds_length, 1000);
        assert_eq!(settings.host, "127.0.0.1");
    }

    #[test]
    fn env_overrides_win() {
        let mut settings = Settings::default();
        settings
            .apply_overrides(lookup_from(&[
                ("ONION_PORT", "7000"),
                ("ONION_BACKEND", "memory"),
                ("ONION_API_KEYS", "a, b ,,c"),
                ("ONION_MAX_WARRANT_LENGTH", "10"),
            ]))
            .expect("apply");

        assert_eq!(settings.port, 7000);
        assert_eq!(settings.backend, Backend::Memory);
        assert_eq!(settings.api_keys, vec!["a", "b", "c"]);
        assert_eq!(settings.engine.max_warrant_length, 10);
    }

    #[test]
    fn bad_override_names_key() {
        let mut settings = Settings::default();
        let err = settings
            .apply_overrides(lookup_from(&[("ONION_POOL_SIZE", "many")]))
            .expect_err("not a number");
        assert_eq!(
            err.details().get("field").map(String::as_str),
            Some("pool_size")
        );
    }

    #[test]
    fn zero_pool_rejected() {
        let settings = Settings {
            pool_size: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn unknown_backend_rejected() {
        assert!("postgres".parse::<Backend>().is_err());
        assert_eq!("REDB".parse::<Backend>().expect("parse"), Backend::Redb);
    }
}
