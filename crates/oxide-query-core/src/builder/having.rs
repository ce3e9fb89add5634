//! The having family.

use super::value::{SqlValue, ToSqlValue};
use super::where_clause::{between, comparison, null_predicate};
use super::{push_predicate, BuilderState, QueryBuilder};
use crate::ast::{BindingType, Conjunction, Expr};
use crate::error::Result;

/// Having clauses, folded the same way as wheres.
pub trait HavingClauseBuilder: BuilderState {
    /// Folds a predicate node onto the having tree.
    #[must_use]
    fn add_having(mut self, node: Expr, conjunction: Conjunction) -> Self {
        push_predicate(&mut self.state_mut().havings, node, conjunction);
        self
    }

    /// `HAVING column <operator> value`.
    ///
    /// # Errors
    ///
    /// Returns an error on a bad operator or column.
    fn having(self, column: &str, operator: &str, value: impl ToSqlValue) -> Result<Self> {
        let node = comparison(column, operator, value.to_sql_value(), BindingType::Having)?;
        Ok(self.add_having(node, Conjunction::And))
    }

    /// `OR column <operator> value`.
    ///
    /// # Errors
    ///
    /// Returns an error on a bad operator or column.
    fn or_having(self, column: &str, operator: &str, value: impl ToSqlValue) -> Result<Self> {
        let node = comparison(column, operator, value.to_sql_value(), BindingType::Having)?;
        Ok(self.add_having(node, Conjunction::Or))
    }

    /// Raw having SQL.
    #[must_use]
    fn having_raw(self, sql: &str, bindings: Vec<SqlValue>) -> Self {
        let node = Expr::raw_with_bindings(sql, bindings, BindingType::Having);
        self.add_having(node, Conjunction::And)
    }

    /// `OR` raw having SQL.
    #[must_use]
    fn or_having_raw(self, sql: &str, bindings: Vec<SqlValue>) -> Self {
        let node = Expr::raw_with_bindings(sql, bindings, BindingType::Having);
        self.add_having(node, Conjunction::Or)
    }

    /// `HAVING column BETWEEN low AND high`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn having_between(
        self,
        column: &str,
        low: impl ToSqlValue,
        high: impl ToSqlValue,
    ) -> Result<Self> {
        let node = between(
            column,
            low.to_sql_value(),
            high.to_sql_value(),
            false,
            BindingType::Having,
        )?;
        Ok(self.add_having(node, Conjunction::And))
    }

    /// `HAVING column IS NULL`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn having_null(self, column: &str) -> Result<Self> {
        let node = null_predicate(column, false)?;
        Ok(self.add_having(node, Conjunction::And))
    }

    /// `HAVING column IS NOT NULL`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn having_not_null(self, column: &str) -> Result<Self> {
        let node = null_predicate(column, true)?;
        Ok(self.add_having(node, Conjunction::And))
    }
}

impl HavingClauseBuilder for QueryBuilder {}
