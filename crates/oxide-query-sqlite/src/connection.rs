//! The sqlx-backed connection.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use oxide_query_core::connection::{Connection, Processor, Row};
use oxide_query_core::grammar::{Grammar, SqliteGrammar};
use oxide_query_core::{QueryError, Result, SqlValue};
use sqlx::sqlite::{SqliteArguments, SqliteQueryResult, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, SqlitePool, TypeInfo, ValueRef};
use tracing::debug;

use crate::config::SqliteConfig;

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Runs compiled queries on an sqlx SQLite pool.
///
/// The connection is its own [`Processor`]: `insert_get_id` reads the rowid
/// from the result of the insert it ran, so concurrent inserts on a shared
/// connection each get their own key.
#[derive(Debug)]
pub struct SqliteConnection {
    pool: SqlitePool,
    grammar: Arc<dyn Grammar>,
    last_insert_id: AtomicI64,
}

impl SqliteConnection {
    /// Wraps `pool` without a table prefix.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_prefix(pool, String::new())
    }

    /// Wraps `pool`, prefixing every table with `prefix`.
    #[must_use]
    pub fn with_prefix(pool: SqlitePool, prefix: impl Into<String>) -> Self {
        Self {
            pool,
            grammar: Arc::new(SqliteGrammar::with_prefix(prefix)),
            last_insert_id: AtomicI64::new(0),
        }
    }

    /// Opens a pool from `config`. Same as [`connect`](crate::connect).
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Connection`] if the pool cannot connect.
    pub async fn connect(config: &SqliteConfig) -> Result<Self> {
        crate::config::connect(config).await
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn execute(&self, sql: &str, bindings: &[SqlValue]) -> Result<SqliteQueryResult> {
        debug!(sql, bindings = bindings.len(), "sqlite execute");
        let result = bind_all(sqlx::query(sql), bindings)
            .execute(&self.pool)
            .await
            .map_err(QueryError::connection)?;
        self.last_insert_id
            .store(result.last_insert_rowid(), Ordering::SeqCst);
        Ok(result)
    }
}

impl Connection for SqliteConnection {
    fn grammar(&self) -> Arc<dyn Grammar> {
        Arc::clone(&self.grammar)
    }

    fn processor(&self) -> &dyn Processor {
        self
    }

    fn select<'a>(
        &'a self,
        sql: &'a str,
        bindings: &'a [SqlValue],
        _use_read: bool,
    ) -> BoxFuture<'a, Result<Vec<Row>>> {
        async move {
            debug!(sql, bindings = bindings.len(), "sqlite select");
            let rows = bind_all(sqlx::query(sql), bindings)
                .fetch_all(&self.pool)
                .await
                .map_err(QueryError::connection)?;
            rows.iter().map(decode_row).collect::<Result<Vec<_>>>()
        }
        .boxed()
    }

    fn statement<'a>(&'a self, sql: &'a str, bindings: &'a [SqlValue]) -> BoxFuture<'a, Result<bool>> {
        async move {
            self.execute(sql, bindings).await?;
            Ok::<_, QueryError>(true)
        }
        .boxed()
    }

    fn affecting_statement<'a>(
        &'a self,
        sql: &'a str,
        bindings: &'a [SqlValue],
    ) -> BoxFuture<'a, Result<u64>> {
        async move {
            let result = self.execute(sql, bindings).await?;
            Ok::<_, QueryError>(result.rows_affected())
        }
        .boxed()
    }

    /// Rowid of the most recent statement run through this handle, by any
    /// task. Use `insert_get_id` for the key of a specific insert.
    fn last_insert_id(&self) -> BoxFuture<'_, Result<i64>> {
        let id = self.last_insert_id.load(Ordering::SeqCst);
        async move { Ok::<_, QueryError>(id) }.boxed()
    }
}

impl Processor for SqliteConnection {
    fn process_insert_get_id<'a>(
        &'a self,
        _connection: &'a dyn Connection,
        sql: &'a str,
        bindings: &'a [SqlValue],
        _sequence: Option<&'a str>,
    ) -> BoxFuture<'a, Result<i64>> {
        async move {
            let result = self.execute(sql, bindings).await?;
            Ok::<_, QueryError>(result.last_insert_rowid())
        }
        .boxed()
    }
}

fn bind_all<'q>(query: SqliteQuery<'q>, bindings: &[SqlValue]) -> SqliteQuery<'q> {
    bindings.iter().cloned().fold(query, bind_value)
}

fn bind_value(query: SqliteQuery<'_>, value: SqlValue) -> SqliteQuery<'_> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

/// Converts a row by the storage class of each value.
fn decode_row(row: &SqliteRow) -> Result<Row> {
    let mut out = Row::new();
    for column in row.columns() {
        let index = column.ordinal();
        let (is_null, storage) = {
            let raw = row.try_get_raw(index).map_err(QueryError::connection)?;
            (raw.is_null(), raw.type_info().name().to_ascii_uppercase())
        };
        let value = if is_null {
            SqlValue::Null
        } else {
            match storage.as_str() {
                "INTEGER" | "BOOLEAN" => SqlValue::Int(get(row, index)?),
                "REAL" => SqlValue::Float(get(row, index)?),
                "BLOB" => SqlValue::Blob(get(row, index)?),
                _ => SqlValue::Text(get(row, index)?),
            }
        };
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

fn get<T>(row: &SqliteRow, index: usize) -> Result<T>
where
    T: for<'r> sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(index).map_err(QueryError::connection)
}
