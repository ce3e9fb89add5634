//! The group-by family.

use super::value::SqlValue;
use super::{parse_column, BuilderState, QueryBuilder};
use crate::ast::{BindingType, Expr};
use crate::error::Result;

/// Group-by clauses.
pub trait GroupByClauseBuilder: BuilderState {
    /// `GROUP BY columns`, appended to earlier groups.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn group_by(mut self, columns: &[&str]) -> Result<Self> {
        for column in columns {
            let node = parse_column(column)?;
            self.state_mut().groups.push(node);
        }
        Ok(self)
    }

    /// Raw group-by SQL.
    #[must_use]
    fn group_by_raw(mut self, sql: &str, bindings: Vec<SqlValue>) -> Self {
        self.state_mut()
            .groups
            .push(Expr::raw_with_bindings(sql, bindings, BindingType::GroupBy));
        self
    }
}

impl GroupByClauseBuilder for QueryBuilder {}
