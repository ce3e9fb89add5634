//! Pool settings.

use oxide_query_core::{QueryError, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;

use crate::connection::SqliteConnection;

const fn default_max_connections() -> u32 {
    5
}

/// Settings for [`connect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// sqlx connection URL, e.g. `sqlite://app.db` or `sqlite::memory:`.
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Prefix applied to every table name and alias.
    #[serde(default)]
    pub prefix: String,
}

impl SqliteConfig {
    /// Creates settings for `url` with the default pool size and no prefix.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
            prefix: String::new(),
        }
    }

    /// Sets the pool size. Each `sqlite::memory:` connection is its own
    /// database, so in-memory setups need a single connection.
    #[must_use]
    pub const fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the table prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

/// Opens a pool and wraps it in a [`SqliteConnection`].
///
/// # Errors
///
/// Returns [`QueryError::Connection`] if the pool cannot connect.
pub async fn connect(config: &SqliteConfig) -> Result<SqliteConnection> {
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
        .map_err(QueryError::connection)?;
    info!(url = %config.url, max_connections = config.max_connections, "connected to sqlite");
    Ok(SqliteConnection::with_prefix(pool, config.prefix.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_deserializing() {
        let config: SqliteConfig = serde_json::from_str(r#"{"url": "sqlite::memory:"}"#).unwrap();
        assert_eq!(config, SqliteConfig::new("sqlite::memory:"));
        assert_eq!(config.max_connections, 5);
        assert!(config.prefix.is_empty());
    }

    #[test]
    fn test_setters() {
        let config = SqliteConfig::new("sqlite://app.db")
            .max_connections(1)
            .prefix("app_");
        assert_eq!(config.max_connections, 1);
        assert_eq!(config.prefix, "app_");
    }

    #[tokio::test]
    async fn test_bad_url_is_a_connection_error() {
        let result = connect(&SqliteConfig::new("postgres://localhost/nope")).await;
        assert!(matches!(result, Err(QueryError::Connection(_))));
    }
}
