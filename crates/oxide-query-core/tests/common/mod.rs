#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::FutureExt;
use oxide_query_core::connection::{DefaultProcessor, Processor, ReturningProcessor};
use oxide_query_core::prelude::*;
use oxide_query_core::{QueryError, Result};

static DEFAULT: DefaultProcessor = DefaultProcessor;
static RETURNING: ReturningProcessor = ReturningProcessor;

pub fn mysql(table: &str) -> QueryBuilder {
    on(Arc::new(MySqlGrammar::new()), table)
}

pub fn pgsql(table: &str) -> QueryBuilder {
    on(Arc::new(PostgresGrammar::new()), table)
}

pub fn sqlite(table: &str) -> QueryBuilder {
    on(Arc::new(SqliteGrammar::new()), table)
}

pub fn sqlsrv(table: &str) -> QueryBuilder {
    on(Arc::new(SqlServerGrammar::new()), table)
}

pub fn on(grammar: Arc<dyn Grammar>, table: &str) -> QueryBuilder {
    QueryBuilder::new(grammar)
        .from(table)
        .unwrap_or_else(|e| panic!("Failed to set table {table}: {e}"))
}

/// Compiles the select and returns its SQL.
pub fn sql(query: &QueryBuilder) -> String {
    query
        .compile()
        .unwrap_or_else(|e| panic!("Failed to compile: {e}"))
        .sql
}

pub fn record(pairs: &[(&str, SqlValue)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| (String::from(*k), v.clone()))
        .collect()
}

pub fn text(value: &str) -> SqlValue {
    SqlValue::Text(String::from(value))
}

/// One statement a [`RecordingConnection`] received.
#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub kind: &'static str,
    pub sql: String,
    pub bindings: Vec<SqlValue>,
}

/// Connection that records every statement and answers selects from a
/// queue of canned results.
pub struct RecordingConnection {
    grammar: Arc<dyn Grammar>,
    returning: bool,
    affected: u64,
    log: Mutex<Vec<Executed>>,
    results: Mutex<VecDeque<Vec<Row>>>,
}

impl RecordingConnection {
    pub fn new(grammar: Arc<dyn Grammar>) -> Self {
        Self {
            grammar,
            returning: false,
            affected: 1,
            log: Mutex::new(Vec::new()),
            results: Mutex::new(VecDeque::new()),
        }
    }

    /// Reads generated keys from the returned row, as Postgres does.
    pub fn returning(mut self) -> Self {
        self.returning = true;
        self
    }

    pub fn affecting(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }

    /// Queues the rows the next select returns.
    pub fn with_rows(self, rows: Vec<Row>) -> Self {
        self.results.lock().unwrap().push_back(rows);
        self
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.log.lock().unwrap().clone()
    }

    pub fn last(&self) -> Executed {
        self.executed()
            .pop()
            .unwrap_or_else(|| panic!("Expected at least one statement"))
    }

    fn record(&self, kind: &'static str, sql: &str, bindings: &[SqlValue]) {
        self.log.lock().unwrap().push(Executed {
            kind,
            sql: String::from(sql),
            bindings: bindings.to_vec(),
        });
    }
}

impl Connection for RecordingConnection {
    fn grammar(&self) -> Arc<dyn Grammar> {
        Arc::clone(&self.grammar)
    }

    fn processor(&self) -> &dyn Processor {
        if self.returning {
            &RETURNING
        } else {
            &DEFAULT
        }
    }

    fn select<'a>(
        &'a self,
        sql: &'a str,
        bindings: &'a [SqlValue],
        _use_read: bool,
    ) -> BoxFuture<'a, Result<Vec<Row>>> {
        self.record("select", sql, bindings);
        let rows = self.results.lock().unwrap().pop_front().unwrap_or_default();
        async move { Ok::<_, QueryError>(rows) }.boxed()
    }

    fn statement<'a>(&'a self, sql: &'a str, bindings: &'a [SqlValue]) -> BoxFuture<'a, Result<bool>> {
        self.record("statement", sql, bindings);
        async { Ok::<_, QueryError>(true) }.boxed()
    }

    fn affecting_statement<'a>(
        &'a self,
        sql: &'a str,
        bindings: &'a [SqlValue],
    ) -> BoxFuture<'a, Result<u64>> {
        self.record("affecting", sql, bindings);
        let affected = self.affected;
        async move { Ok::<_, QueryError>(affected) }.boxed()
    }

    fn last_insert_id(&self) -> BoxFuture<'_, Result<i64>> {
        async { Ok::<_, QueryError>(7) }.boxed()
    }
}
