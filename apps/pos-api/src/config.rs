//! POS API configuration.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. A variable that is set but unparsable fails startup.
//!
//! | Variable                      | Default              |
//! |-------------------------------|----------------------|
//! | `SHOPLINE_BIND_ADDR`          | `0.0.0.0`            |
//! | `SHOPLINE_PORT`               | `8080`               |
//! | `SHOPLINE_DATABASE_PATH`      | `./shopline.db`      |
//! | `SHOPLINE_DB_MAX_CONNECTIONS` | `5`                  |
//! | `SHOPLINE_RUN_MIGRATIONS`     | `true`               |

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use shopline_db::DbConfig;

/// POS API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Interface to listen on
    pub bind_addr: IpAddr,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Upper bound of the SQLite pool
    pub db_max_connections: u32,

    /// Apply embedded migrations on startup
    pub run_migrations: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            database_path: PathBuf::from("./shopline.db"),
            db_max_connections: 5,
            run_migrations: true,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            bind_addr: parse_or(&lookup, "SHOPLINE_BIND_ADDR", defaults.bind_addr)?,
            port: parse_or(&lookup, "SHOPLINE_PORT", defaults.port)?,
            database_path: lookup("SHOPLINE_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            db_max_connections: parse_or(
                &lookup,
                "SHOPLINE_DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,
            run_migrations: parse_or(&lookup, "SHOPLINE_RUN_MIGRATIONS", defaults.run_migrations)?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SHOPLINE_DB_MAX_CONNECTIONS".to_string(),
                value: "0".to_string(),
            });
        }
        if config.database_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("SHOPLINE_DATABASE_PATH".to_string()));
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Pool settings for [`shopline_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.db_max_connections)
            .run_migrations(self.run_migrations)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert!(config.run_migrations);
        assert_eq!(config.db_config().max_connections, 5);
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("SHOPLINE_BIND_ADDR", "127.0.0.1"),
            ("SHOPLINE_PORT", "9000"),
            ("SHOPLINE_DATABASE_PATH", "/var/lib/shopline/pos.db"),
            ("SHOPLINE_DB_MAX_CONNECTIONS", "8"),
            ("SHOPLINE_RUN_MIGRATIONS", "false"),
        ]))
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:9000");
        assert_eq!(config.database_path, PathBuf::from("/var/lib/shopline/pos.db"));
        let db = config.db_config();
        assert_eq!(db.max_connections, 8);
        assert!(!db.run_migrations);
    }

    #[test]
    fn test_invalid_values_fail() {
        let err = ApiConfig::from_lookup(lookup(&[("SHOPLINE_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "SHOPLINE_PORT"));

        let err =
            ApiConfig::from_lookup(lookup(&[("SHOPLINE_DB_MAX_CONNECTIONS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = ApiConfig::from_lookup(lookup(&[("SHOPLINE_DATABASE_PATH", "")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(_)));
    }
}
