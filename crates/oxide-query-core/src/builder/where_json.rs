//! JSON column predicates.

use serde::Serialize;

use super::value::SqlValue;
use super::where_clause::WhereClauseBuilder;
use super::{parse_column, parse_operator, BuilderState, QueryBuilder};
use crate::ast::{Conjunction, Expr, FunctionName};
use crate::error::{QueryError, Result};

/// Where clauses on JSON documents. Values are JSON-encoded before binding.
pub trait WhereJsonBuilder: WhereClauseBuilder {
    /// The JSON column (or path) contains `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not serialize or the column is
    /// malformed.
    fn where_json_contains(self, column: &str, value: impl Serialize) -> Result<Self> {
        let node = json_contains(&self, column, &value)?;
        Ok(self.add_where(node, Conjunction::And))
    }

    /// `OR` form of [`where_json_contains`](Self::where_json_contains).
    ///
    /// # Errors
    ///
    /// See [`where_json_contains`](Self::where_json_contains).
    fn or_where_json_contains(self, column: &str, value: impl Serialize) -> Result<Self> {
        let node = json_contains(&self, column, &value)?;
        Ok(self.add_where(node, Conjunction::Or))
    }

    /// The JSON column does not contain `value`.
    ///
    /// # Errors
    ///
    /// See [`where_json_contains`](Self::where_json_contains).
    fn where_json_doesnt_contain(self, column: &str, value: impl Serialize) -> Result<Self> {
        let node = Expr::not(json_contains(&self, column, &value)?);
        Ok(self.add_where(node, Conjunction::And))
    }

    /// `OR` form of
    /// [`where_json_doesnt_contain`](Self::where_json_doesnt_contain).
    ///
    /// # Errors
    ///
    /// See [`where_json_contains`](Self::where_json_contains).
    fn or_where_json_doesnt_contain(self, column: &str, value: impl Serialize) -> Result<Self> {
        let node = Expr::not(json_contains(&self, column, &value)?);
        Ok(self.add_where(node, Conjunction::Or))
    }

    /// The JSON path named by `column` (`options->languages->en`) exists.
    ///
    /// # Errors
    ///
    /// Returns an error if `column` has no `->` leg.
    fn where_json_contains_key(self, column: &str) -> Result<Self> {
        let node = json_contains_key(column)?;
        Ok(self.add_where(node, Conjunction::And))
    }

    /// `OR` form of
    /// [`where_json_contains_key`](Self::where_json_contains_key).
    ///
    /// # Errors
    ///
    /// Returns an error if `column` has no `->` leg.
    fn or_where_json_contains_key(self, column: &str) -> Result<Self> {
        let node = json_contains_key(column)?;
        Ok(self.add_where(node, Conjunction::Or))
    }

    /// The JSON path named by `column` does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if `column` has no `->` leg.
    fn where_json_doesnt_contain_key(self, column: &str) -> Result<Self> {
        let node = Expr::not(json_contains_key(column)?);
        Ok(self.add_where(node, Conjunction::And))
    }

    /// `OR` form of
    /// [`where_json_doesnt_contain_key`](Self::where_json_doesnt_contain_key).
    ///
    /// # Errors
    ///
    /// Returns an error if `column` has no `->` leg.
    fn or_where_json_doesnt_contain_key(self, column: &str) -> Result<Self> {
        let node = Expr::not(json_contains_key(column)?);
        Ok(self.add_where(node, Conjunction::Or))
    }

    /// Compares the length of the JSON array at `column`.
    ///
    /// # Errors
    ///
    /// Returns an error on a bad operator or column.
    fn where_json_length(self, column: &str, operator: &str, length: i64) -> Result<Self> {
        let node = json_length(&self, column, operator, length)?;
        Ok(self.add_where(node, Conjunction::And))
    }

    /// `OR` form of [`where_json_length`](Self::where_json_length).
    ///
    /// # Errors
    ///
    /// Returns an error on a bad operator or column.
    fn or_where_json_length(self, column: &str, operator: &str, length: i64) -> Result<Self> {
        let node = json_length(&self, column, operator, length)?;
        Ok(self.add_where(node, Conjunction::Or))
    }
}

impl WhereJsonBuilder for QueryBuilder {}

fn json_contains<B: BuilderState>(
    builder: &B,
    column: &str,
    value: &impl Serialize,
) -> Result<Expr> {
    let encoded = serde_json::to_string(value)
        .map_err(|e| QueryError::InvalidArgument(format!("cannot encode JSON value: {e}")))?;
    Ok(Expr::function(
        FunctionName::JsonContains,
        vec![
            parse_column(column)?,
            Expr::binding(SqlValue::Text(encoded), builder.where_binding()),
        ],
    ))
}

fn json_contains_key(column: &str) -> Result<Expr> {
    let column = parse_column(column)?;
    if !matches!(column, Expr::JsonPath(_)) {
        return Err(QueryError::InvalidArgument(String::from(
            "JSON key checks need a column path such as [options->key]",
        )));
    }
    Ok(Expr::function(FunctionName::JsonContainsKey, vec![column]))
}

fn json_length<B: BuilderState>(
    builder: &B,
    column: &str,
    operator: &str,
    length: i64,
) -> Result<Expr> {
    let operator = parse_operator(operator)?;
    Ok(Expr::comparison(
        Expr::function(FunctionName::JsonLength, vec![parse_column(column)?]),
        operator,
        Expr::binding(SqlValue::Int(length), builder.where_binding()),
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::grammar::MySqlGrammar;

    fn query() -> QueryBuilder {
        QueryBuilder::new(Arc::new(MySqlGrammar::new()))
    }

    #[test]
    fn test_contains_encodes_value() {
        let q = query().where_json_contains("options->languages", "en").unwrap();
        let Expr::FunctionCall(call) = &q.state().wheres[0] else {
            panic!("Expected function call");
        };
        assert_eq!(call.name, FunctionName::JsonContains);
        assert!(matches!(
            &call.args[1],
            Expr::Binding(b) if b.value == SqlValue::Text(String::from("\"en\""))
        ));
    }

    #[test]
    fn test_contains_key_needs_path() {
        assert!(query().where_json_contains_key("options").is_err());
        assert!(query().where_json_contains_key("options->languages").is_ok());
    }

    #[test]
    fn test_doesnt_contain_wraps_not() {
        let q = query()
            .where_json_doesnt_contain("options->languages", vec!["en", "de"])
            .unwrap();
        assert!(matches!(&q.state().wheres[0], Expr::Not(_)));
    }
}
