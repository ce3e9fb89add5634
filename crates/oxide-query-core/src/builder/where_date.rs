//! Date and time part predicates.
//!
//! The column is wrapped in a dialect-neutral [`FunctionName`]; each visitor
//! maps it to its own function (`YEAR(x)`, `EXTRACT(YEAR FROM x)`,
//! `strftime('%Y', x)` ...).

use super::value::{SqlValue, ToSqlValue};
use super::where_clause::WhereClauseBuilder;
use super::{parse_column, prepare_value_and_operator, QueryBuilder};
use crate::ast::{BindingType, Conjunction, Expr, FunctionName};
use crate::error::Result;

/// Where clauses on the date or time part of a column.
pub trait WhereDateBuilder: WhereClauseBuilder {
    /// `DATE(column) <operator> value`.
    ///
    /// # Errors
    ///
    /// Returns an error on a bad operator or column.
    fn where_date(self, column: &str, operator: &str, value: impl ToSqlValue) -> Result<Self> {
        add_date_based(self, FunctionName::Date, column, operator, value.to_sql_value(), Conjunction::And)
    }

    /// `OR DATE(column) <operator> value`.
    ///
    /// # Errors
    ///
    /// Returns an error on a bad operator or column.
    fn or_where_date(self, column: &str, operator: &str, value: impl ToSqlValue) -> Result<Self> {
        add_date_based(self, FunctionName::Date, column, operator, value.to_sql_value(), Conjunction::Or)
    }

    /// `TIME(column) <operator> value`.
    ///
    /// # Errors
    ///
    /// Returns an error on a bad operator or column.
    fn where_time(self, column: &str, operator: &str, value: impl ToSqlValue) -> Result<Self> {
        add_date_based(self, FunctionName::Time, column, operator, value.to_sql_value(), Conjunction::And)
    }

    /// `OR TIME(column) <operator> value`.
    ///
    /// # Errors
    ///
    /// Returns an error on a bad operator or column.
    fn or_where_time(self, column: &str, operator: &str, value: impl ToSqlValue) -> Result<Self> {
        add_date_based(self, FunctionName::Time, column, operator, value.to_sql_value(), Conjunction::Or)
    }

    /// `DAY(column) <operator> value`, the value left-padded to two digits.
    ///
    /// # Errors
    ///
    /// Returns an error on a bad operator or column.
    fn where_day(self, column: &str, operator: &str, value: impl ToSqlValue) -> Result<Self> {
        let value = pad_two_digits(value.to_sql_value());
        add_date_based(self, FunctionName::Day, column, operator, value, Conjunction::And)
    }

    /// `OR DAY(column) <operator> value`.
    ///
    /// # Errors
    ///
    /// Returns an error on a bad operator or column.
    fn or_where_day(self, column: &str, operator: &str, value: impl ToSqlValue) -> Result<Self> {
        let value = pad_two_digits(value.to_sql_value());
        add_date_based(self, FunctionName::Day, column, operator, value, Conjunction::Or)
    }

    /// `MONTH(column) <operator> value`, the value left-padded to two digits.
    ///
    /// # Errors
    ///
    /// Returns an error on a bad operator or column.
    fn where_month(self, column: &str, operator: &str, value: impl ToSqlValue) -> Result<Self> {
        let value = pad_two_digits(value.to_sql_value());
        add_date_based(self, FunctionName::Month, column, operator, value, Conjunction::And)
    }

    /// `OR MONTH(column) <operator> value`.
    ///
    /// # Errors
    ///
    /// Returns an error on a bad operator or column.
    fn or_where_month(self, column: &str, operator: &str, value: impl ToSqlValue) -> Result<Self> {
        let value = pad_two_digits(value.to_sql_value());
        add_date_based(self, FunctionName::Month, column, operator, value, Conjunction::Or)
    }

    /// `YEAR(column) <operator> value`.
    ///
    /// # Errors
    ///
    /// Returns an error on a bad operator or column.
    fn where_year(self, column: &str, operator: &str, value: impl ToSqlValue) -> Result<Self> {
        add_date_based(self, FunctionName::Year, column, operator, value.to_sql_value(), Conjunction::And)
    }

    /// `OR YEAR(column) <operator> value`.
    ///
    /// # Errors
    ///
    /// Returns an error on a bad operator or column.
    fn or_where_year(self, column: &str, operator: &str, value: impl ToSqlValue) -> Result<Self> {
        add_date_based(self, FunctionName::Year, column, operator, value.to_sql_value(), Conjunction::Or)
    }
}

impl WhereDateBuilder for QueryBuilder {}

fn add_date_based<B: WhereClauseBuilder>(
    builder: B,
    function: FunctionName,
    column: &str,
    operator: &str,
    value: SqlValue,
    conjunction: Conjunction,
) -> Result<B> {
    let operator = prepare_value_and_operator(operator, &value)?;
    let kind: BindingType = builder.where_binding();
    let node = Expr::comparison(
        Expr::function(function, vec![parse_column(column)?]),
        operator,
        Expr::binding(value, kind),
    );
    Ok(builder.add_where(node, conjunction))
}

fn pad_two_digits(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::Int(n) if (0..10).contains(&n) => SqlValue::Text(format!("{n:02}")),
        SqlValue::Int(n) => SqlValue::Text(n.to_string()),
        SqlValue::Text(s) if s.len() == 1 => SqlValue::Text(format!("0{s}")),
        other => other,
    }
}
