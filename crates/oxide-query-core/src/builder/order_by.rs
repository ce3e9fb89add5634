//! The order-by family.
//!
//! Once a query has unions, orders apply to the union result instead of the
//! first select.

use super::value::SqlValue;
use super::{parse_column, BuilderState, QueryBuilder};
use crate::ast::{BindingType, Expr, FunctionName, OrderByElement, OrderDirection};
use crate::error::Result;

/// Order-by clauses.
pub trait OrderByClauseBuilder: BuilderState {
    /// Appends an order entry to the active order list.
    #[must_use]
    fn add_order(mut self, node: Expr) -> Self {
        let state = self.state_mut();
        if state.unions.is_empty() {
            state.orders.push(node);
        } else {
            state.union_orders.push(node);
        }
        self
    }

    /// `ORDER BY column direction`, where direction is `asc` or `desc`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column or direction.
    fn order_by(self, column: &str, direction: &str) -> Result<Self> {
        let direction = OrderDirection::parse(direction)?;
        let node = Expr::OrderElement(OrderByElement {
            expression: Box::new(parse_column(column)?),
            direction,
        });
        Ok(self.add_order(node))
    }

    /// `ORDER BY column DESC`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn order_by_desc(self, column: &str) -> Result<Self> {
        self.order_by(column, "desc")
    }

    /// Newest first on `column`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn latest(self, column: &str) -> Result<Self> {
        self.order_by(column, "desc")
    }

    /// Oldest first on `column`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn oldest(self, column: &str) -> Result<Self> {
        self.order_by(column, "asc")
    }

    /// Orders by the dialect's random function.
    #[must_use]
    fn in_random_order(self) -> Self {
        self.add_order(Expr::function(FunctionName::Random, Vec::new()))
    }

    /// Raw order-by SQL.
    #[must_use]
    fn order_by_raw(self, sql: &str, bindings: Vec<SqlValue>) -> Self {
        let kind = if self.state().unions.is_empty() {
            BindingType::Order
        } else {
            BindingType::UnionOrder
        };
        self.add_order(Expr::raw_with_bindings(sql, bindings, kind))
    }

    /// Drops every order entry.
    #[must_use]
    fn reorder(mut self) -> Self {
        let state = self.state_mut();
        state.orders.clear();
        state.union_orders.clear();
        self
    }
}

impl OrderByClauseBuilder for QueryBuilder {}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::grammar::MySqlGrammar;
    use crate::QueryError;

    fn query() -> QueryBuilder {
        QueryBuilder::new(Arc::new(MySqlGrammar::new()))
    }

    #[test]
    fn test_bad_direction() {
        assert!(matches!(
            query().order_by("id", "sideways"),
            Err(QueryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_reorder_clears() {
        let q = query().order_by("id", "asc").unwrap().reorder();
        assert!(q.state().orders.is_empty());
    }
}
