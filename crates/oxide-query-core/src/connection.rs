//! Driver-facing traits.
//!
//! A [`Connection`] executes compiled SQL; a [`Processor`] post-processes
//! results. Both return boxed futures so they stay object safe.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::builder::{QueryBuilder, SqlValue};
use crate::error::{QueryError, Result};
use crate::grammar::Grammar;

/// One result row, keyed by column name.
pub type Row = BTreeMap<String, SqlValue>;

static DEFAULT_PROCESSOR: DefaultProcessor = DefaultProcessor;

/// A database connection able to run compiled queries.
pub trait Connection: Send + Sync {
    /// Grammar queries on this connection compile with.
    fn grammar(&self) -> Arc<dyn Grammar>;

    /// Result processor; [`DefaultProcessor`] unless overridden.
    fn processor(&self) -> &dyn Processor {
        &DEFAULT_PROCESSOR
    }

    /// Runs a select. `use_read` allows routing to a read replica.
    fn select<'a>(
        &'a self,
        sql: &'a str,
        bindings: &'a [SqlValue],
        use_read: bool,
    ) -> BoxFuture<'a, Result<Vec<Row>>>;

    /// Runs a statement and reports success.
    fn statement<'a>(&'a self, sql: &'a str, bindings: &'a [SqlValue])
        -> BoxFuture<'a, Result<bool>>;

    /// Runs a statement and returns the number of affected rows.
    fn affecting_statement<'a>(
        &'a self,
        sql: &'a str,
        bindings: &'a [SqlValue],
    ) -> BoxFuture<'a, Result<u64>>;

    /// Key generated by the last insert on this connection.
    fn last_insert_id(&self) -> BoxFuture<'_, Result<i64>>;

    /// Runs an insert.
    fn insert<'a>(&'a self, sql: &'a str, bindings: &'a [SqlValue]) -> BoxFuture<'a, Result<bool>> {
        self.statement(sql, bindings)
    }

    /// Runs an update.
    fn update<'a>(&'a self, sql: &'a str, bindings: &'a [SqlValue]) -> BoxFuture<'a, Result<u64>> {
        self.affecting_statement(sql, bindings)
    }

    /// Runs a delete.
    fn delete<'a>(&'a self, sql: &'a str, bindings: &'a [SqlValue]) -> BoxFuture<'a, Result<u64>> {
        self.affecting_statement(sql, bindings)
    }

    /// Starts a query on this connection's grammar.
    fn query(&self) -> QueryBuilder {
        QueryBuilder::new(self.grammar())
    }
}

/// Post-processing of query results.
pub trait Processor: Send + Sync {
    /// Rewrites select results before they reach the caller.
    fn process_select(&self, rows: Vec<Row>) -> Vec<Row> {
        rows
    }

    /// Runs an insert and returns the generated key.
    fn process_insert_get_id<'a>(
        &'a self,
        connection: &'a dyn Connection,
        sql: &'a str,
        bindings: &'a [SqlValue],
        sequence: Option<&'a str>,
    ) -> BoxFuture<'a, Result<i64>>;
}

/// Runs the insert, then asks the connection for the last insert id.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultProcessor;

impl Processor for DefaultProcessor {
    fn process_insert_get_id<'a>(
        &'a self,
        connection: &'a dyn Connection,
        sql: &'a str,
        bindings: &'a [SqlValue],
        _sequence: Option<&'a str>,
    ) -> BoxFuture<'a, Result<i64>> {
        async move {
            connection.insert(sql, bindings).await?;
            connection.last_insert_id().await
        }
        .boxed()
    }
}

/// Reads the key from the row the insert returns, for `RETURNING` and
/// `SCOPE_IDENTITY()` grammars.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReturningProcessor;

impl Processor for ReturningProcessor {
    fn process_insert_get_id<'a>(
        &'a self,
        connection: &'a dyn Connection,
        sql: &'a str,
        bindings: &'a [SqlValue],
        sequence: Option<&'a str>,
    ) -> BoxFuture<'a, Result<i64>> {
        async move {
            let key = sequence.unwrap_or("id");
            let rows = connection.select(sql, bindings, false).await?;
            rows.into_iter()
                .next()
                .and_then(|mut row| row.remove(key))
                .and_then(|value| value.as_i64())
                .ok_or_else(|| QueryError::MissingColumn(String::from(key)))
        }
        .boxed()
    }
}
