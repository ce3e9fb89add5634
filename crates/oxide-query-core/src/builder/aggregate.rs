//! Aggregates: `count`, `min`, `max`, `sum`, `avg` and `exists`.
//!
//! The aggregate helpers never touch the builder they are called on; they
//! compile a clone that carries a single [`AggregateFunctionCallFragment`].

use tracing::debug;

use super::value::SqlValue;
use super::{parse_column, BuilderState, Property, QueryBuilder};
use crate::ast::{AggregateFunction, AggregateFunctionCallFragment, Distinct, Expr};
use crate::connection::Connection;
use crate::error::{QueryError, Result};

/// Compile-side aggregate operations.
pub trait AggregateBuilder: Sized {
    /// Installs the aggregate call. Without groups, orders are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn set_aggregate(self, function: AggregateFunction, columns: &[&str]) -> Result<Self>;

    /// Returns a clone of the query computing `function` over `columns`.
    ///
    /// Columns are kept when the query has unions or havings, since those
    /// need the original select list.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn to_aggregate_query(&self, function: AggregateFunction, columns: &[&str]) -> Result<Self>;
}

impl AggregateBuilder for QueryBuilder {
    fn set_aggregate(mut self, function: AggregateFunction, columns: &[&str]) -> Result<Self> {
        let columns = columns
            .iter()
            .filter(|c| **c != "*")
            .map(|c| parse_column(c))
            .collect::<Result<Vec<_>>>()?;
        let state = self.state_mut();
        let distinct = !matches!(state.distinct, Distinct::All) && !columns.is_empty();
        state.aggregate = Some(Expr::AggregateFunctionCall(AggregateFunctionCallFragment {
            function,
            columns,
            distinct,
        }));
        if state.groups.is_empty() {
            state.orders.clear();
        }
        Ok(self)
    }

    fn to_aggregate_query(&self, function: AggregateFunction, columns: &[&str]) -> Result<Self> {
        let state = self.state();
        let without: &[Property] = if state.unions.is_empty() && state.havings.is_empty() {
            &[Property::Columns]
        } else {
            &[]
        };
        self.clone_without(without).set_aggregate(function, columns)
    }
}

impl QueryBuilder {
    /// Runs `function` over `columns` and returns the `aggregate` column.
    ///
    /// # Errors
    ///
    /// Returns an error if compiling or running the query fails, or the row
    /// has no `aggregate` column.
    pub async fn aggregate(
        &self,
        connection: &dyn Connection,
        function: AggregateFunction,
        columns: &[&str],
    ) -> Result<SqlValue> {
        let query = self.to_aggregate_query(function, columns)?;
        let rows = query.get(connection).await?;
        rows.into_iter()
            .next()
            .and_then(|mut row| row.remove("aggregate"))
            .ok_or(QueryError::MissingAggregate)
    }

    /// `COUNT(columns)`; an empty slice counts `*`.
    ///
    /// # Errors
    ///
    /// See [`aggregate`](Self::aggregate).
    pub async fn count(&self, connection: &dyn Connection, columns: &[&str]) -> Result<i64> {
        let value = self
            .aggregate(connection, AggregateFunction::Count, columns)
            .await?;
        value.as_i64().ok_or(QueryError::MissingAggregate)
    }

    /// `MIN(column)`.
    ///
    /// # Errors
    ///
    /// See [`aggregate`](Self::aggregate).
    pub async fn min(&self, connection: &dyn Connection, column: &str) -> Result<SqlValue> {
        self.aggregate(connection, AggregateFunction::Min, &[column])
            .await
    }

    /// `MAX(column)`.
    ///
    /// # Errors
    ///
    /// See [`aggregate`](Self::aggregate).
    pub async fn max(&self, connection: &dyn Connection, column: &str) -> Result<SqlValue> {
        self.aggregate(connection, AggregateFunction::Max, &[column])
            .await
    }

    /// `SUM(column)`, zero when no row matches.
    ///
    /// # Errors
    ///
    /// See [`aggregate`](Self::aggregate).
    pub async fn sum(&self, connection: &dyn Connection, column: &str) -> Result<SqlValue> {
        let value = self
            .aggregate(connection, AggregateFunction::Sum, &[column])
            .await?;
        Ok(if value.is_null() { SqlValue::Int(0) } else { value })
    }

    /// `AVG(column)`.
    ///
    /// # Errors
    ///
    /// See [`aggregate`](Self::aggregate).
    pub async fn avg(&self, connection: &dyn Connection, column: &str) -> Result<SqlValue> {
        self.aggregate(connection, AggregateFunction::Avg, &[column])
            .await
    }

    /// Returns true if the query matches at least one row.
    ///
    /// # Errors
    ///
    /// Returns an error if compiling or running the query fails.
    pub async fn exists(&self, connection: &dyn Connection) -> Result<bool> {
        let compiled = self.grammar().compile_exists(self)?;
        debug!(sql = %compiled.sql, bindings = compiled.values().len(), "exists query");
        let rows = connection
            .select(&compiled.sql, compiled.values(), true)
            .await?;
        let found = rows
            .into_iter()
            .next()
            .and_then(|mut row| row.remove("exists"))
            .is_some_and(|value| value.as_i64().is_some_and(|n| n != 0));
        Ok(found)
    }

    /// Returns true if the query matches no row.
    ///
    /// # Errors
    ///
    /// See [`exists`](Self::exists).
    pub async fn doesnt_exist(&self, connection: &dyn Connection) -> Result<bool> {
        Ok(!self.exists(connection).await?)
    }

    /// Total row count used by paginators, ignoring orders, limit and offset.
    ///
    /// Grouped queries are counted through a derived table.
    ///
    /// # Errors
    ///
    /// See [`aggregate`](Self::aggregate).
    pub async fn get_count_for_pagination(
        &self,
        connection: &dyn Connection,
        columns: &[&str],
    ) -> Result<i64> {
        let state = self.state();
        let query = if state.groups.is_empty() && state.havings.is_empty() {
            let without: &[Property] = if state.unions.is_empty() {
                &[
                    Property::Columns,
                    Property::Orders,
                    Property::Limit,
                    Property::Offset,
                ]
            } else {
                &[Property::Orders, Property::Limit, Property::Offset]
            };
            self.clone_without(without)
                .set_aggregate(AggregateFunction::Count, columns)?
        } else {
            let inner = self.clone_without(&[Property::Orders, Property::Limit, Property::Offset]);
            self.new_query()
                .from_sub(inner, "aggregate_table")?
                .set_aggregate(AggregateFunction::Count, &[])?
        };
        let rows = query.get(connection).await?;
        rows.into_iter()
            .next()
            .and_then(|mut row| row.remove("aggregate"))
            .and_then(|value| value.as_i64())
            .ok_or(QueryError::MissingAggregate)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::builder::{OrderByClauseBuilder, UnionClauseBuilder};
    use crate::grammar::MySqlGrammar;

    fn query() -> QueryBuilder {
        QueryBuilder::new(Arc::new(MySqlGrammar::new()))
            .from("users")
            .unwrap()
    }

    #[test]
    fn test_to_aggregate_query_drops_columns() {
        let q = query().select(&["id", "name"]).unwrap();
        let agg = q
            .to_aggregate_query(AggregateFunction::Count, &["*"])
            .unwrap();
        assert!(agg.state().columns.is_empty());
        assert!(agg.state().aggregate.is_some());
        assert_eq!(q.state().columns.len(), 2);
        assert!(q.state().aggregate.is_none());
    }

    #[test]
    fn test_to_aggregate_query_keeps_columns_with_unions() {
        let other = query();
        let q = query().select(&["id"]).unwrap().union(other);
        let agg = q
            .to_aggregate_query(AggregateFunction::Count, &["*"])
            .unwrap();
        assert_eq!(agg.state().columns.len(), 1);
    }

    #[test]
    fn test_set_aggregate_drops_orders_without_groups() {
        let q = query()
            .order_by("id", "asc")
            .unwrap()
            .set_aggregate(AggregateFunction::Max, &["id"])
            .unwrap();
        assert!(q.state().orders.is_empty());
    }

    #[test]
    fn test_distinct_count() {
        let q = query()
            .distinct()
            .set_aggregate(AggregateFunction::Count, &["email"])
            .unwrap();
        assert!(matches!(
            &q.state().aggregate,
            Some(Expr::AggregateFunctionCall(a)) if a.distinct && a.columns.len() == 1
        ));
    }
}
