//! Environment-driven configuration.
//!
//! `.env` is loaded first when present (falling back to `.env.example`),
//! then every setting is read through a lookup function so tests can feed a
//! plain map instead of mutating the process environment.

use thiserror::Error;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SQLITE_PATH: &str = "todo.db";
pub const DEFAULT_MYSQL_PORT: u16 = 3306;
pub const DEFAULT_MYSQL_DATABASE: &str = "todos";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },

    #[error("REQUIRE_API_KEY is set but API_KEY is empty; refusing to start unauthenticated")]
    ApiKeyRequired,
}

/// Connection settings for the networked engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MySqlConfig {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
}

/// Which engine backs the store, selected by `DB_TYPE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    Sqlite { path: String },
    MySql(MySqlConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub api_key: Option<String>,
    pub require_api_key: bool,
}

impl AppConfig {
    /// Load `.env` (or `.env.example`) into the process environment. Missing
    /// files are not an error.
    pub fn load_dotenv() {
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_filename(".env.example");
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Blank values behave like unset ones.
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = get("APP_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get("APP_PORT")
            .map(|raw| ("APP_PORT", raw))
            .or_else(|| get("PORT").map(|raw| ("PORT", raw)))
        {
            Some((key, raw)) => parse_port(key, &raw)?,
            None => DEFAULT_PORT,
        };

        // Unset means MySQL; any value other than `mysql` selects SQLite.
        let engine = get("DB_TYPE").unwrap_or_else(|| "mysql".to_string());
        let database = if engine.trim().eq_ignore_ascii_case("mysql") {
            DatabaseConfig::MySql(MySqlConfig {
                user: lookup("DB_USER").unwrap_or_default(),
                password: lookup("DB_PASS").unwrap_or_default(),
                host: get("DB_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: match get("DB_PORT") {
                    Some(raw) => parse_port("DB_PORT", &raw)?,
                    None => DEFAULT_MYSQL_PORT,
                },
                database: get("DB_NAME").unwrap_or_else(|| DEFAULT_MYSQL_DATABASE.to_string()),
            })
        } else {
            if !engine.trim().eq_ignore_ascii_case("sqlite") {
                tracing::warn!(db_type = %engine, "unknown DB_TYPE, falling back to sqlite");
            }
            DatabaseConfig::Sqlite {
                path: get("SQLITE_PATH").unwrap_or_else(|| DEFAULT_SQLITE_PATH.to_string()),
            }
        };

        let api_key = get("API_KEY");
        let require_api_key = match get("REQUIRE_API_KEY") {
            Some(raw) => parse_flag("REQUIRE_API_KEY", &raw)?,
            None => false,
        };
        if require_api_key && api_key.is_none() {
            return Err(ConfigError::ApiKeyRequired);
        }

        Ok(Self {
            host,
            port,
            database,
            api_key,
            require_api_key,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_port(key: &'static str, raw: &str) -> Result<u16, ConfigError> {
    raw.trim().parse().map_err(|err| ConfigError::InvalidValue {
        key,
        message: format!("`{raw}` is not a port: {err}"),
    })
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            message: format!("`{raw}` is not a boolean"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_to_mysql_without_api_key() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(
            config.database,
            DatabaseConfig::MySql(MySqlConfig {
                user: String::new(),
                password: String::new(),
                host: "127.0.0.1".into(),
                port: 3306,
                database: "todos".into(),
            })
        );
        assert_eq!(config.api_key, None);
        assert!(!config.require_api_key);
    }

    #[test]
    fn selects_sqlite_by_name() {
        let config = load(&[("DB_TYPE", "sqlite"), ("SQLITE_PATH", "/tmp/t.db")]).unwrap();
        assert_eq!(
            config.database,
            DatabaseConfig::Sqlite {
                path: "/tmp/t.db".to_string()
            }
        );
    }

    #[test]
    fn reads_mysql_settings() {
        let config = load(&[
            ("DB_TYPE", "MySQL"),
            ("DB_USER", "app"),
            ("DB_PASS", "hunter2"),
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "3307"),
            ("DB_NAME", "tasks"),
        ])
        .unwrap();
        assert_eq!(
            config.database,
            DatabaseConfig::MySql(MySqlConfig {
                user: "app".into(),
                password: "hunter2".into(),
                host: "db.internal".into(),
                port: 3307,
                database: "tasks".into(),
            })
        );
    }

    #[test]
    fn port_falls_back_to_port_variable() {
        let config = load(&[("PORT", "9000")]).unwrap();
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn unknown_engine_falls_back_to_sqlite() {
        let config = load(&[("DB_TYPE", "postgres")]).unwrap();
        assert_eq!(
            config.database,
            DatabaseConfig::Sqlite {
                path: "todo.db".to_string()
            }
        );
    }

    #[test]
    fn rejects_bad_port() {
        let err = load(&[("APP_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "APP_PORT", .. }));
    }

    #[test]
    fn bad_fallback_port_names_port_variable() {
        let err = load(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "PORT", .. }));
    }

    #[test]
    fn blank_api_key_counts_as_unset() {
        let config = load(&[("API_KEY", "   ")]).unwrap();
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn require_flag_without_key_is_fatal() {
        assert_eq!(
            load(&[("REQUIRE_API_KEY", "true")]).unwrap_err(),
            ConfigError::ApiKeyRequired
        );
    }

    #[test]
    fn require_flag_with_key_is_accepted() {
        let config = load(&[("REQUIRE_API_KEY", "on"), ("API_KEY", "s3cret")]).unwrap();
        assert!(config.require_api_key);
        assert_eq!(config.api_key.as_deref(), Some("s3cret"));
    }

    #[test]
    fn rejects_non_boolean_flag() {
        let err = load(&[("REQUIRE_API_KEY", "maybe")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "REQUIRE_API_KEY",
                ..
            }
        ));
    }
}
