//! SQLite renderer.

use super::{QueryVisitor, VisitState};
use crate::ast::{Expr, FunctionName, JsonPathExpression, TruncateSpecification};
use crate::error::{QueryError, Result};

/// Renders statements for SQLite.
#[derive(Debug)]
pub struct SqliteVisitor<'a> {
    state: VisitState<'a>,
}

impl<'a> SqliteVisitor<'a> {
    /// Creates a visitor over `state`.
    #[must_use]
    pub const fn new(state: VisitState<'a>) -> Self {
        Self { state }
    }
}

impl<'a> QueryVisitor<'a> for SqliteVisitor<'a> {
    fn state(&mut self) -> &mut VisitState<'a> {
        &mut self.state
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn function_template(&self, name: FunctionName) -> Option<&'static str> {
        match name {
            FunctionName::Date => Some("strftime('%Y-%m-%d', {0})"),
            FunctionName::Time => Some("strftime('%H:%M:%S', {0})"),
            FunctionName::Day => Some("strftime('%d', {0})"),
            FunctionName::Month => Some("strftime('%m', {0})"),
            FunctionName::Year => Some("strftime('%Y', {0})"),
            FunctionName::Random => Some("RANDOM()"),
            FunctionName::JsonContains | FunctionName::JsonLength | FunctionName::JsonContainsKey => {
                None
            }
        }
    }

    fn compile_json_function(
        &mut self,
        name: FunctionName,
        column: &Expr,
        _value: Option<String>,
    ) -> Result<String> {
        match name {
            FunctionName::JsonContains => Err(QueryError::unsupported(
                "sqlite",
                "JSON contains predicates",
            )),
            FunctionName::JsonContainsKey => {
                let (field, path) = self.json_field_and_path(column)?;
                Ok(format!("json_type({field}{path}) IS NOT NULL"))
            }
            _ => {
                let (field, path) = self.json_field_and_path(column)?;
                Ok(format!("json_array_length({field}{path})"))
            }
        }
    }

    fn visit_json_path(&mut self, json: &JsonPathExpression) -> Result<String> {
        let field = self.quote_path(&json.column);
        Ok(format!("json_extract({field}, '{}')", json.json_path()))
    }

    fn union_wrap(&mut self, sql: &str) -> String {
        format!("SELECT * FROM ({sql})")
    }

    fn wrap_date_binding(&self, placeholder: String) -> String {
        format!("CAST({placeholder} AS TEXT)")
    }

    fn visit_truncate(&mut self, truncate: &TruncateSpecification) -> Result<String> {
        Ok(format!("DELETE FROM {}", self.visit_expr(&truncate.table)?))
    }
}
