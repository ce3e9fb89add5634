//! Connection configuration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::grammar::{Grammar, MySqlGrammar, PostgresGrammar, SqlServerGrammar, SqliteGrammar};

/// Database driver, named as in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    Mysql,
    Pgsql,
    Sqlite,
    Sqlsrv,
}

/// Settings a connection builds its grammar from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub driver: Driver,
    /// Prefix applied to every table name and alias.
    #[serde(default)]
    pub prefix: String,
}

impl DatabaseConfig {
    /// Creates a configuration without a table prefix.
    #[must_use]
    pub const fn new(driver: Driver) -> Self {
        Self {
            driver,
            prefix: String::new(),
        }
    }

    /// Sets the table prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Returns the grammar for the configured driver.
    #[must_use]
    pub fn grammar(&self) -> Arc<dyn Grammar> {
        let prefix = self.prefix.clone();
        match self.driver {
            Driver::Mysql => Arc::new(MySqlGrammar::with_prefix(prefix)),
            Driver::Pgsql => Arc::new(PostgresGrammar::with_prefix(prefix)),
            Driver::Sqlite => Arc::new(SqliteGrammar::with_prefix(prefix)),
            Driver::Sqlsrv => Arc::new(SqlServerGrammar::with_prefix(prefix)),
        }
    }
}
