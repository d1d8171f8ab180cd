//! Connection settings for [`super::PgDriver`].

use crate::error::{OrmError, OrmResult};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_MAX_OPEN_CONNS: usize = 100;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 6;

/// Database connection settings.
///
/// Deserializes from camelCase keys, so it can be read from any `serde`
/// source:
///
/// ```ignore
/// let cfg = Configuration::from_map(serde_json::json!({
///     "host": "127.0.0.1",
///     "username": "app",
///     "password": "secret",
///     "database": "shop",
///     "maxOpenConns": 20,
/// }))?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Database name; `None` uses the server default for the user.
    pub database: Option<String>,
    /// Maximum pooled connections.
    pub max_open_conns: usize,
    /// Seconds to wait when opening a new connection.
    pub connect_timeout: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            username: String::new(),
            password: String::new(),
            database: None,
            max_open_conns: DEFAULT_MAX_OPEN_CONNS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl Configuration {
    /// Build from a loosely typed map. Missing keys take their defaults.
    pub fn from_map(map: serde_json::Value) -> OrmResult<Self> {
        let cfg: Self = serde_json::from_value(map)
            .map_err(|e| OrmError::Connection(format!("invalid configuration: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> OrmResult<()> {
        if self.host.trim().is_empty() {
            return Err(OrmError::Connection("host is required".to_string()));
        }
        if self.username.trim().is_empty() {
            return Err(OrmError::Connection("username is required".to_string()));
        }
        if self.max_open_conns == 0 {
            return Err(OrmError::Connection(
                "maxOpenConns must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Translate into a `tokio_postgres` connection config.
    pub fn pg_config(&self) -> tokio_postgres::Config {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&self.host)
            .port(self.port)
            .user(&self.username)
            .password(&self.password)
            .connect_timeout(self.connect_timeout());
        if let Some(db) = &self.database {
            pg.dbname(db);
        }
        pg
    }

    /// `host:port/database`, without credentials.
    pub fn display_target(&self) -> String {
        format!(
            "{}:{}/{}",
            self.host,
            self.port,
            self.database.as_deref().unwrap_or("")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_map_fills_defaults() {
        let cfg = Configuration::from_map(serde_json::json!({
            "host": "db",
            "username": "app",
            "password": "pw",
            "database": "shop",
        }))
        .unwrap();
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.max_open_conns, DEFAULT_MAX_OPEN_CONNS);
        assert_eq!(cfg.connect_timeout(), Duration::from_secs(6));
        assert_eq!(cfg.display_target(), "db:5432/shop");
    }

    #[test]
    fn from_map_reads_camel_case_keys() {
        let cfg = Configuration::from_map(serde_json::json!({
            "host": "db",
            "port": 6543,
            "username": "app",
            "maxOpenConns": 5,
            "connectTimeout": 2,
        }))
        .unwrap();
        assert_eq!(cfg.port, 6543);
        assert_eq!(cfg.max_open_conns, 5);
        assert_eq!(cfg.connect_timeout, 2);
        assert_eq!(cfg.database, None);
    }

    #[test]
    fn from_map_requires_username() {
        let err = Configuration::from_map(serde_json::json!({ "host": "db" })).unwrap_err();
        assert!(matches!(err, OrmError::Connection(_)));
    }

    #[test]
    fn from_map_rejects_wrong_types() {
        let err =
            Configuration::from_map(serde_json::json!({ "username": "a", "port": "x" }))
                .unwrap_err();
        assert!(matches!(err, OrmError::Connection(_)));
    }
}
