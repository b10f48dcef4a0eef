//! Environment-driven connection settings.
//!
//! Keys (all optional):
//!
//! | key                 | default     |
//! |---------------------|-------------|
//! | `db_username`       | `root`      |
//! | `db_password`       | (empty)     |
//! | `db_host`           | `127.0.0.1` |
//! | `db_port`           | `3306`      |
//! | `db_dbname`         | `test`      |
//! | `db_charset`        | `utf8`      |
//! | `db_max_lifetime`   | `100` (s)   |
//! | `db_pool_size`      | `1`         |
//! | `db_prefix`         | (empty)     |
//! | `cst_timezone_set`  | `28800` (s east of UTC) |
//! | `db_query_timeout`  | none (ms)   |
//!
//! An empty value counts as unset.

use crate::db::Settings;
use crate::error::{DbError, DbResult};
use crate::escape::DEFAULT_TIMEZONE_SECS;
use chrono::FixedOffset;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Connection and executor settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    #[serde(rename = "db_username")]
    pub username: String,
    #[serde(rename = "db_password")]
    pub password: String,
    #[serde(rename = "db_host")]
    pub host: String,
    #[serde(rename = "db_port")]
    pub port: u16,
    #[serde(rename = "db_dbname")]
    pub database: String,
    #[serde(rename = "db_charset")]
    pub charset: String,
    /// Maximum connection lifetime in seconds.
    #[serde(rename = "db_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(rename = "db_pool_size")]
    pub pool_size: u32,
    /// Replaces the `@pf_` token in statements.
    #[serde(rename = "db_prefix")]
    pub prefix: String,
    /// Offset (seconds east of UTC) for inlined timestamps.
    #[serde(rename = "cst_timezone_set")]
    pub timezone_offset_secs: i32,
    #[serde(rename = "db_query_timeout")]
    pub query_timeout_ms: Option<u64>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            username: "root".to_string(),
            password: String::new(),
            host: "127.0.0.1".to_string(),
            port: 3306,
            database: "test".to_string(),
            charset: "utf8".to_string(),
            max_lifetime_secs: 100,
            pool_size: 1,
            prefix: String::new(),
            timezone_offset_secs: DEFAULT_TIMEZONE_SECS,
            query_timeout_ms: None,
        }
    }
}

impl DbConfig {
    /// Load from the process environment after reading `.env` if present.
    pub fn from_env() -> DbResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an env file. Variables already set in the process take precedence.
    pub fn from_env_file(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        let mut file = HashMap::new();
        let entries = dotenvy::from_path_iter(path)
            .map_err(|e| DbError::config(format!("cannot read {}: {e}", path.display())))?;
        for entry in entries {
            let (key, value) = entry
                .map_err(|e| DbError::config(format!("cannot parse {}: {e}", path.display())))?;
            file.insert(key, value);
        }
        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| file.get(key).cloned()))
    }

    /// Build from any key lookup. Unset and empty keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> DbResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(v) = get("db_username") {
            config.username = v;
        }
        if let Some(v) = get("db_password") {
            config.password = v;
        }
        if let Some(v) = get("db_host") {
            config.host = v;
        }
        if let Some(v) = get("db_port") {
            config.port = parse("db_port", &v)?;
        }
        if let Some(v) = get("db_dbname") {
            config.database = v;
        }
        if let Some(v) = get("db_charset") {
            config.charset = v;
        }
        if let Some(v) = get("db_max_lifetime") {
            config.max_lifetime_secs = parse("db_max_lifetime", &v)?;
        }
        if let Some(v) = get("db_pool_size") {
            config.pool_size = parse("db_pool_size", &v)?;
        }
        if let Some(v) = get("db_prefix") {
            config.prefix = v;
        }
        if let Some(v) = get("cst_timezone_set") {
            config.timezone_offset_secs = parse("cst_timezone_set", &v)?;
        }
        if let Some(v) = get("db_query_timeout") {
            config.query_timeout_ms = Some(parse("db_query_timeout", &v)?);
        }

        config.timezone()?;
        Ok(config)
    }

    /// The fixed offset for timestamp literals.
    pub fn timezone(&self) -> DbResult<FixedOffset> {
        FixedOffset::east_opt(self.timezone_offset_secs).ok_or_else(|| {
            DbError::config(format!(
                "cst_timezone_set out of range: {}",
                self.timezone_offset_secs
            ))
        })
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_ms.map(Duration::from_millis)
    }

    /// Executor settings derived from this config.
    pub fn settings(&self) -> DbResult<Settings> {
        Ok(Settings {
            prefix: self.prefix.clone(),
            timezone: self.timezone()?,
            query_timeout: self.query_timeout(),
        })
    }
}

fn parse<T>(key: &str, value: &str) -> DbResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| DbError::config(format!("invalid {key} {value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = DbConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, DbConfig::default());
        assert_eq!(config.port, 3306);
        assert_eq!(config.timezone().unwrap().local_minus_utc(), 8 * 3600);
    }

    #[test]
    fn reads_every_key() {
        let config = DbConfig::from_lookup(lookup(&[
            ("db_username", "app"),
            ("db_password", "secret"),
            ("db_host", "db.internal"),
            ("db_port", "3307"),
            ("db_dbname", "shop"),
            ("db_charset", "utf8mb4"),
            ("db_max_lifetime", "60"),
            ("db_pool_size", "8"),
            ("db_prefix", "sp_"),
            ("cst_timezone_set", "0"),
            ("db_query_timeout", "1500"),
        ]))
        .unwrap();
        assert_eq!(config.username, "app");
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 3307);
        assert_eq!(config.database, "shop");
        assert_eq!(config.charset, "utf8mb4");
        assert_eq!(config.max_lifetime(), Duration::from_secs(60));
        assert_eq!(config.pool_size, 8);

        let settings = config.settings().unwrap();
        assert_eq!(settings.prefix, "sp_");
        assert_eq!(settings.timezone.local_minus_utc(), 0);
        assert_eq!(settings.query_timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn empty_values_keep_defaults() {
        let config = DbConfig::from_lookup(lookup(&[("db_host", ""), ("db_port", "  ")])).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3306);
    }

    #[test]
    fn malformed_numbers_are_config_errors() {
        let err = DbConfig::from_lookup(lookup(&[("db_port", "abc")])).unwrap_err();
        assert!(matches!(err, DbError::Config(ref m) if m.contains("db_port")));

        let err = DbConfig::from_lookup(lookup(&[("cst_timezone_set", "999999")])).unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
    }

    #[test]
    fn deserializes_from_config_keys() {
        let config: DbConfig =
            serde_json::from_str(r#"{"db_host": "10.0.0.2", "db_pool_size": 4}"#).unwrap();
        assert_eq!(config.host, "10.0.0.2");
        assert_eq!(config.pool_size, 4);
        assert_eq!(config.username, "root");
    }

    #[test]
    fn reads_env_file() {
        let path = std::env::temp_dir().join(format!("sqlframe-{}.env", std::process::id()));
        std::fs::write(&path, "db_charset=latin1\ndb_pool_size=3\n").unwrap();
        let config = DbConfig::from_env_file(&path);
        std::fs::remove_file(&path).ok();

        let config = config.unwrap();
        assert_eq!(config.charset, "latin1");
        assert_eq!(config.pool_size, 3);
    }

    #[test]
    fn missing_env_file_is_a_config_error() {
        let err = DbConfig::from_env_file("/nonexistent/sqlframe/app.env").unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
    }
}
