//! Running compiled queries through a [`Connection`].

use tracing::{debug, warn};

use super::limit_offset::LimitOffsetClauseBuilder;
use super::value::SqlValue;
use super::{parse_column, BuilderState, QueryBuilder, Record};
use crate::ast::{ArithmeticExpression, BindingType, Expr, Subquery};
use crate::binding::CompiledQuery;
use crate::connection::{Connection, Row};
use crate::error::Result;

fn compiled(result: Result<CompiledQuery>, statement: &'static str) -> Result<CompiledQuery> {
    match result {
        Ok(compiled) => {
            debug!(sql = %compiled.sql, bindings = compiled.values().len(), statement, "executing query");
            Ok(compiled)
        }
        Err(err) => {
            warn!(error = %err, statement, "failed to compile query");
            Err(err)
        }
    }
}

/// Key under which a selected column comes back.
fn result_key(column: &str) -> String {
    let lower = column.to_ascii_lowercase();
    if let Some(position) = lower.rfind(" as ") {
        return column[position + 4..].trim().to_string();
    }
    column
        .rsplit('.')
        .next()
        .unwrap_or(column)
        .trim()
        .to_string()
}

fn assignments(values: &Record) -> Vec<(String, Expr)> {
    values
        .iter()
        .map(|(column, value)| {
            (
                column.clone(),
                Expr::binding(value.clone(), BindingType::Update),
            )
        })
        .collect()
}

impl QueryBuilder {
    /// Runs the select and returns the processed rows.
    ///
    /// # Errors
    ///
    /// Returns an error if compiling or running the query fails.
    pub async fn get(&self, connection: &dyn Connection) -> Result<Vec<Row>> {
        let query = compiled(self.compile(), "select")?;
        let rows = connection.select(&query.sql, query.values(), true).await?;
        Ok(connection.processor().process_select(rows))
    }

    /// Runs the select with `LIMIT 1` and returns the first row.
    ///
    /// # Errors
    ///
    /// Returns an error if compiling or running the query fails.
    pub async fn first(&self, connection: &dyn Connection) -> Result<Option<Row>> {
        let rows = self.clone().limit(1).get(connection).await?;
        Ok(rows.into_iter().next())
    }

    /// Returns `column` of the first row.
    ///
    /// # Errors
    ///
    /// Returns an error if compiling or running the query fails.
    pub async fn value(&self, connection: &dyn Connection, column: &str) -> Result<Option<SqlValue>> {
        let row = self.clone().select(&[column])?.first(connection).await?;
        let key = result_key(column);
        Ok(row.and_then(|mut row| row.remove(&key)))
    }

    /// Returns `column` of every row; missing values come back as NULL.
    ///
    /// # Errors
    ///
    /// Returns an error if compiling or running the query fails.
    pub async fn pluck(&self, connection: &dyn Connection, column: &str) -> Result<Vec<SqlValue>> {
        let rows = self.clone().select(&[column])?.get(connection).await?;
        let key = result_key(column);
        Ok(rows
            .into_iter()
            .map(|mut row| row.remove(&key).unwrap_or(SqlValue::Null))
            .collect())
    }

    /// Inserts `rows`. An empty slice is a no-op that reports success.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows do not share their columns, or the
    /// statement fails.
    pub async fn insert(&self, connection: &dyn Connection, rows: &[Record]) -> Result<bool> {
        if rows.is_empty() {
            return Ok(true);
        }
        let query = compiled(self.grammar().compile_insert(self, rows), "insert")?;
        connection.insert(&query.sql, query.values()).await
    }

    /// Inserts one row and returns its generated key.
    ///
    /// `sequence` names the key column, `id` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails or no key comes back.
    pub async fn insert_get_id(
        &self,
        connection: &dyn Connection,
        row: &Record,
        sequence: Option<&str>,
    ) -> Result<i64> {
        let query = compiled(
            self.grammar().compile_insert_get_id(self, row, sequence),
            "insert",
        )?;
        connection
            .processor()
            .process_insert_get_id(connection, &query.sql, query.values(), sequence)
            .await
    }

    /// Inserts `rows`, skipping rows that violate a unique constraint.
    ///
    /// # Errors
    ///
    /// Returns an error if the grammar has no ignore form or the statement
    /// fails.
    pub async fn insert_or_ignore(&self, connection: &dyn Connection, rows: &[Record]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let query = compiled(
            self.grammar().compile_insert_or_ignore(self, rows),
            "insert",
        )?;
        connection
            .affecting_statement(&query.sql, query.values())
            .await
    }

    /// `INSERT INTO table (columns) subquery`.
    ///
    /// # Errors
    ///
    /// Returns an error if a column is malformed or the statement fails.
    pub async fn insert_using(
        &self,
        connection: &dyn Connection,
        columns: &[&str],
        query: impl Into<Subquery>,
    ) -> Result<u64> {
        let query = compiled(
            self.grammar()
                .compile_insert_using(self, columns, query.into()),
            "insert",
        )?;
        connection
            .affecting_statement(&query.sql, query.values())
            .await
    }

    /// Updates the matching rows and returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns an error if compiling or running the statement fails.
    pub async fn update(&self, connection: &dyn Connection, values: &Record) -> Result<u64> {
        let query = compiled(
            self.grammar().compile_update(self, assignments(values)),
            "update",
        )?;
        connection.update(&query.sql, query.values()).await
    }

    /// `column = column + amount`, plus the `extra` assignments.
    ///
    /// # Errors
    ///
    /// Returns an error if `column` is malformed or the statement fails.
    pub async fn increment(
        &self,
        connection: &dyn Connection,
        column: &str,
        amount: i64,
        extra: &Record,
    ) -> Result<u64> {
        self.step(connection, column, "+", amount, extra).await
    }

    /// `column = column - amount`, plus the `extra` assignments.
    ///
    /// # Errors
    ///
    /// Returns an error if `column` is malformed or the statement fails.
    pub async fn decrement(
        &self,
        connection: &dyn Connection,
        column: &str,
        amount: i64,
        extra: &Record,
    ) -> Result<u64> {
        self.step(connection, column, "-", amount, extra).await
    }

    async fn step(
        &self,
        connection: &dyn Connection,
        column: &str,
        operator: &str,
        amount: i64,
        extra: &Record,
    ) -> Result<u64> {
        let value = Expr::Arithmetic(ArithmeticExpression {
            left: Box::new(parse_column(column)?),
            operator: String::from(operator),
            right: Box::new(Expr::binding(SqlValue::Int(amount), BindingType::Update)),
        });
        let mut values = vec![(String::from(column), value)];
        values.extend(assignments(extra));
        let query = compiled(self.grammar().compile_update(self, values), "update")?;
        connection.update(&query.sql, query.values()).await
    }

    /// Inserts `rows`, updating `update` columns of rows that collide on
    /// `unique_by`.
    ///
    /// `None` updates every inserted column; an empty list falls back to a
    /// plain insert.
    ///
    /// # Errors
    ///
    /// Returns an error if the grammar has no upsert form or the statement
    /// fails.
    pub async fn upsert(
        &self,
        connection: &dyn Connection,
        rows: &[Record],
        unique_by: &[&str],
        update: Option<&[&str]>,
    ) -> Result<u64> {
        let Some(first) = rows.first() else {
            return Ok(0);
        };
        let columns: Vec<&str> = first.keys().map(String::as_str).collect();
        let update = update.unwrap_or(&columns);
        if update.is_empty() {
            let inserted = self.insert(connection, rows).await?;
            return Ok(if inserted { rows.len() as u64 } else { 0 });
        }
        let query = compiled(
            self.grammar().compile_upsert(self, rows, unique_by, update),
            "upsert",
        )?;
        connection
            .affecting_statement(&query.sql, query.values())
            .await
    }

    /// Deletes the matching rows and returns how many went away.
    ///
    /// # Errors
    ///
    /// Returns an error if compiling or running the statement fails.
    pub async fn delete(&self, connection: &dyn Connection) -> Result<u64> {
        let query = compiled(self.grammar().compile_delete(self), "delete")?;
        connection.delete(&query.sql, query.values()).await
    }

    /// Empties the table, running every statement the grammar emits.
    ///
    /// # Errors
    ///
    /// Returns an error if compiling or running a statement fails.
    pub async fn truncate(&self, connection: &dyn Connection) -> Result<()> {
        let statements = self.grammar().compile_truncate(self).inspect_err(|err| {
            warn!(error = %err, statement = "truncate", "failed to compile query");
        })?;
        for query in statements {
            debug!(sql = %query.sql, bindings = query.values().len(), "truncate");
            connection.statement(&query.sql, query.values()).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, i64)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (String::from(*k), SqlValue::Int(*v)))
            .collect()
    }

    #[test]
    fn test_result_key() {
        assert_eq!(result_key("users.email"), "email");
        assert_eq!(result_key("users.email as mail"), "mail");
        assert_eq!(result_key("name AS n"), "n");
        assert_eq!(result_key("id"), "id");
    }

    #[test]
    fn test_assignments_are_update_bindings() {
        let values = assignments(&record(&[("votes", 1)]));
        assert_eq!(values.len(), 1);
        assert!(matches!(&values[0].1, Expr::Binding(b) if b.kind == BindingType::Update));
    }
}
