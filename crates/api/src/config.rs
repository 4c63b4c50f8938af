//! Process configuration, read from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `STAFFROLL_BIND_ADDR` | `0.0.0.0:8080` |
//! | `STAFFROLL_STORE` | `sqlite` (`memory`, `postgres`) |
//! | `DATABASE_URL` | `sqlite://employees.db` for SQLite; required for Postgres |
//! | `DATABASE_MAX_CONNECTIONS` | `5` |

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_SQLITE_URL: &str = "sqlite://employees.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value `{value}`: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Which `EmployeeStore` implementation backs the service.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory,
    Sqlite,
    #[cfg(feature = "postgres")]
    Postgres,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_raw = lookup("STAFFROLL_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: "STAFFROLL_BIND_ADDR",
                value: bind_raw.clone(),
                reason: e.to_string(),
            })?;

        let backend = match lookup("STAFFROLL_STORE") {
            None => StoreBackend::Sqlite,
            Some(raw) => parse_backend(&raw)?,
        };

        let database_url = match (backend, lookup("DATABASE_URL")) {
            (_, Some(url)) => url,
            (StoreBackend::Sqlite, None) => DEFAULT_SQLITE_URL.to_string(),
            (StoreBackend::InMemory, None) => String::new(),
            #[cfg(feature = "postgres")]
            (StoreBackend::Postgres, None) => return Err(ConfigError::Missing("DATABASE_URL")),
        };

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "DATABASE_MAX_CONNECTIONS",
                        value: raw,
                        reason: "expected a positive integer".to_string(),
                    });
                }
            },
        };

        Ok(Self {
            bind_addr,
            store: StoreConfig {
                backend,
                database_url,
                max_connections,
            },
        })
    }
}

fn parse_backend(raw: &str) -> Result<StoreBackend, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "memory" | "in-memory" | "in_memory" => Ok(StoreBackend::InMemory),
        "sqlite" => Ok(StoreBackend::Sqlite),
        #[cfg(feature = "postgres")]
        "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
        #[cfg(not(feature = "postgres"))]
        "postgres" | "postgresql" => Err(ConfigError::Invalid {
            var: "STAFFROLL_STORE",
            value: raw.to_string(),
            reason: "built without the `postgres` feature".to_string(),
        }),
        _ => Err(ConfigError::Invalid {
            var: "STAFFROLL_STORE",
            value: raw.to_string(),
            reason: "expected memory|sqlite|postgres".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_sqlite_file_on_port_8080() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.store.database_url, DEFAULT_SQLITE_URL);
        assert_eq!(config.store.max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("STAFFROLL_BIND_ADDR", "127.0.0.1:9000"),
            ("STAFFROLL_STORE", " Memory "),
            ("DATABASE_MAX_CONNECTIONS", "2"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.store.backend, StoreBackend::InMemory);
        assert_eq!(config.store.max_connections, 2);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config_from(&[("STAFFROLL_BIND_ADDR", "nowhere")]),
            Err(ConfigError::Invalid { var: "STAFFROLL_BIND_ADDR", .. })
        ));
        assert!(matches!(
            config_from(&[("STAFFROLL_STORE", "mongo")]),
            Err(ConfigError::Invalid { var: "STAFFROLL_STORE", .. })
        ));
        assert!(matches!(
            config_from(&[("DATABASE_MAX_CONNECTIONS", "0")]),
            Err(ConfigError::Invalid { var: "DATABASE_MAX_CONNECTIONS", .. })
        ));
    }

    #[cfg(not(feature = "postgres"))]
    #[test]
    fn postgres_requires_the_feature() {
        let err = config_from(&[("STAFFROLL_STORE", "postgres")]).unwrap_err();
        assert!(err.to_string().contains("postgres"));
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn postgres_requires_a_database_url() {
        let err = config_from(&[("STAFFROLL_STORE", "postgres")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
    }
}
