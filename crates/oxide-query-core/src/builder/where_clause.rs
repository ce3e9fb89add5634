//! The where family.

use super::value::{SqlValue, ToSqlValue};
use super::{
    parse_column, prepare_value_and_operator, push_predicate, BuilderState, QueryBuilder,
};
use crate::ast::{
    BetweenPredicateExpression, BindingType, Conjunction, ExistsPredicateExpression, Expr,
    InPredicateExpression, InValues, NestedExpression, NestedPredicateExpression,
    NullPredicateExpression,
};
use crate::error::Result;

/// Where clauses. Every method folds its predicate onto the existing tree.
pub trait WhereClauseBuilder: BuilderState {
    /// Folds a predicate node onto the where tree.
    #[must_use]
    fn add_where(mut self, node: Expr, conjunction: Conjunction) -> Self {
        push_predicate(&mut self.state_mut().wheres, node, conjunction);
        self
    }

    /// `column <operator> value`. A `NULL` value renders `IS [NOT] NULL`.
    ///
    /// # Errors
    ///
    /// Returns an error on an unknown operator, a `NULL` compared with
    /// anything but equality, or a malformed column.
    fn where_(self, column: &str, operator: &str, value: impl ToSqlValue) -> Result<Self> {
        let node = comparison(column, operator, value.to_sql_value(), self.where_binding())?;
        Ok(self.add_where(node, Conjunction::And))
    }

    /// `column = value`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn where_eq(self, column: &str, value: impl ToSqlValue) -> Result<Self> {
        self.where_(column, "=", value)
    }

    /// `OR column <operator> value`.
    ///
    /// # Errors
    ///
    /// See [`where_`](Self::where_).
    fn or_where(self, column: &str, operator: &str, value: impl ToSqlValue) -> Result<Self> {
        let node = comparison(column, operator, value.to_sql_value(), self.where_binding())?;
        Ok(self.add_where(node, Conjunction::Or))
    }

    /// `OR column = value`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn or_where_eq(self, column: &str, value: impl ToSqlValue) -> Result<Self> {
        self.or_where(column, "=", value)
    }

    /// `NOT (...)` around a nested group.
    ///
    /// # Errors
    ///
    /// Propagates errors from the closure.
    fn where_not<F>(self, callback: F) -> Result<Self>
    where
        F: FnOnce(QueryBuilder) -> Result<QueryBuilder>,
    {
        nested_not(self, callback, Conjunction::And)
    }

    /// `OR NOT (...)` around a nested group.
    ///
    /// # Errors
    ///
    /// Propagates errors from the closure.
    fn or_where_not<F>(self, callback: F) -> Result<Self>
    where
        F: FnOnce(QueryBuilder) -> Result<QueryBuilder>,
    {
        nested_not(self, callback, Conjunction::Or)
    }

    /// `first <operator> second`, comparing two columns.
    ///
    /// # Errors
    ///
    /// Returns an error on an unknown operator or a malformed column.
    fn where_column(self, first: &str, operator: &str, second: &str) -> Result<Self> {
        let node = column_comparison(first, operator, second)?;
        Ok(self.add_where(node, Conjunction::And))
    }

    /// `OR first <operator> second`.
    ///
    /// # Errors
    ///
    /// Returns an error on an unknown operator or a malformed column.
    fn or_where_column(self, first: &str, operator: &str, second: &str) -> Result<Self> {
        let node = column_comparison(first, operator, second)?;
        Ok(self.add_where(node, Conjunction::Or))
    }

    /// Adds a nested group of column comparisons.
    ///
    /// The second argument sits where the single-pair form takes its
    /// operator, and it is used as the conjunction that joins the group to
    /// the rest of the tree; the pairs inside the group are joined with AND.
    ///
    /// # Errors
    ///
    /// Returns an error if `operator` is not `and`/`or`, or a pair is invalid.
    fn where_columns(self, columns: &[(&str, &str, &str)], operator: &str) -> Result<Self> {
        let conjunction = Conjunction::parse(operator)?;
        let mut nested = self.for_nested_where();
        for (first, op, second) in columns {
            nested = nested.where_column(first, op, second)?;
        }
        Ok(self.add_nested_where_query(nested, conjunction))
    }

    /// Raw SQL with `?` placeholders.
    #[must_use]
    fn where_raw(self, sql: &str, bindings: Vec<SqlValue>) -> Self {
        let kind = self.where_binding();
        self.add_where(Expr::raw_with_bindings(sql, bindings, kind), Conjunction::And)
    }

    /// `OR` raw SQL.
    #[must_use]
    fn or_where_raw(self, sql: &str, bindings: Vec<SqlValue>) -> Self {
        let kind = self.where_binding();
        self.add_where(Expr::raw_with_bindings(sql, bindings, kind), Conjunction::Or)
    }

    /// `column IN (values)`. An empty list renders `0 = 1`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn where_in<I, V>(self, column: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let node = in_list(column, values, false, self.where_binding())?;
        Ok(self.add_where(node, Conjunction::And))
    }

    /// `OR column IN (values)`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn or_where_in<I, V>(self, column: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let node = in_list(column, values, false, self.where_binding())?;
        Ok(self.add_where(node, Conjunction::Or))
    }

    /// `column NOT IN (values)`. An empty list renders `1 = 1`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn where_not_in<I, V>(self, column: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let node = in_list(column, values, true, self.where_binding())?;
        Ok(self.add_where(node, Conjunction::And))
    }

    /// `OR column NOT IN (values)`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn or_where_not_in<I, V>(self, column: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let node = in_list(column, values, true, self.where_binding())?;
        Ok(self.add_where(node, Conjunction::Or))
    }

    /// `column IN (subquery)`, the subquery built by `callback`.
    ///
    /// # Errors
    ///
    /// Propagates errors from the closure or a malformed column.
    fn where_in_sub<F>(self, column: &str, callback: F) -> Result<Self>
    where
        F: FnOnce(QueryBuilder) -> Result<QueryBuilder>,
    {
        let node = in_sub(&self, column, callback, false)?;
        Ok(self.add_where(node, Conjunction::And))
    }

    /// `column NOT IN (subquery)`.
    ///
    /// # Errors
    ///
    /// Propagates errors from the closure or a malformed column.
    fn where_not_in_sub<F>(self, column: &str, callback: F) -> Result<Self>
    where
        F: FnOnce(QueryBuilder) -> Result<QueryBuilder>,
    {
        let node = in_sub(&self, column, callback, true)?;
        Ok(self.add_where(node, Conjunction::And))
    }

    /// `column IN (1, 2, 3)` with the integers inlined.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn where_integer_in_raw<I>(self, column: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = i64>,
    {
        let node = integer_in(column, values, false)?;
        Ok(self.add_where(node, Conjunction::And))
    }

    /// `column NOT IN (1, 2, 3)` with the integers inlined.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn where_integer_not_in_raw<I>(self, column: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = i64>,
    {
        let node = integer_in(column, values, true)?;
        Ok(self.add_where(node, Conjunction::And))
    }

    /// `column IS NULL`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn where_null(self, column: &str) -> Result<Self> {
        let node = null_predicate(column, false)?;
        Ok(self.add_where(node, Conjunction::And))
    }

    /// `OR column IS NULL`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn or_where_null(self, column: &str) -> Result<Self> {
        let node = null_predicate(column, false)?;
        Ok(self.add_where(node, Conjunction::Or))
    }

    /// `column IS NOT NULL`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn where_not_null(self, column: &str) -> Result<Self> {
        let node = null_predicate(column, true)?;
        Ok(self.add_where(node, Conjunction::And))
    }

    /// `OR column IS NOT NULL`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn or_where_not_null(self, column: &str) -> Result<Self> {
        let node = null_predicate(column, true)?;
        Ok(self.add_where(node, Conjunction::Or))
    }

    /// `column BETWEEN low AND high`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn where_between(self, column: &str, low: impl ToSqlValue, high: impl ToSqlValue) -> Result<Self> {
        let kind = self.where_binding();
        let node = between(column, low.to_sql_value(), high.to_sql_value(), false, kind)?;
        Ok(self.add_where(node, Conjunction::And))
    }

    /// `OR column BETWEEN low AND high`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn or_where_between(
        self,
        column: &str,
        low: impl ToSqlValue,
        high: impl ToSqlValue,
    ) -> Result<Self> {
        let kind = self.where_binding();
        let node = between(column, low.to_sql_value(), high.to_sql_value(), false, kind)?;
        Ok(self.add_where(node, Conjunction::Or))
    }

    /// `column NOT BETWEEN low AND high`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn where_not_between(
        self,
        column: &str,
        low: impl ToSqlValue,
        high: impl ToSqlValue,
    ) -> Result<Self> {
        let kind = self.where_binding();
        let node = between(column, low.to_sql_value(), high.to_sql_value(), true, kind)?;
        Ok(self.add_where(node, Conjunction::And))
    }

    /// `OR column NOT BETWEEN low AND high`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn or_where_not_between(
        self,
        column: &str,
        low: impl ToSqlValue,
        high: impl ToSqlValue,
    ) -> Result<Self> {
        let kind = self.where_binding();
        let node = between(column, low.to_sql_value(), high.to_sql_value(), true, kind)?;
        Ok(self.add_where(node, Conjunction::Or))
    }

    /// A parenthesized group built by `callback` on a fresh child builder.
    ///
    /// # Errors
    ///
    /// Propagates errors from the closure.
    fn where_nested<F>(self, callback: F) -> Result<Self>
    where
        F: FnOnce(QueryBuilder) -> Result<QueryBuilder>,
    {
        let nested = callback(self.for_nested_where())?;
        Ok(self.add_nested_where_query(nested, Conjunction::And))
    }

    /// `OR (...)`.
    ///
    /// # Errors
    ///
    /// Propagates errors from the closure.
    fn or_where_nested<F>(self, callback: F) -> Result<Self>
    where
        F: FnOnce(QueryBuilder) -> Result<QueryBuilder>,
    {
        let nested = callback(self.for_nested_where())?;
        Ok(self.add_nested_where_query(nested, Conjunction::Or))
    }

    /// Adds the where tree of `query` as one parenthesized group. A query
    /// without wheres adds nothing.
    #[must_use]
    fn add_nested_where_query(self, query: QueryBuilder, conjunction: Conjunction) -> Self {
        if query.state().wheres.is_empty() {
            return self;
        }
        let node = Expr::NestedPredicate(NestedPredicateExpression {
            query: Box::new(query),
        });
        self.add_where(node, conjunction)
    }

    /// `column <operator> (subquery)`.
    ///
    /// # Errors
    ///
    /// Propagates errors from the closure, a bad operator or column.
    fn where_sub<F>(self, column: &str, operator: &str, callback: F) -> Result<Self>
    where
        F: FnOnce(QueryBuilder) -> Result<QueryBuilder>,
    {
        let operator = super::parse_operator(operator)?;
        let query = callback(self.new_query())?;
        let node = Expr::comparison(
            parse_column(column)?,
            operator,
            Expr::Nested(NestedExpression::new(self.where_binding(), query)),
        );
        Ok(self.add_where(node, Conjunction::And))
    }

    /// `EXISTS (subquery)`.
    ///
    /// # Errors
    ///
    /// Propagates errors from the closure.
    fn where_exists<F>(self, callback: F) -> Result<Self>
    where
        F: FnOnce(QueryBuilder) -> Result<QueryBuilder>,
    {
        let node = exists(&self, callback, false)?;
        Ok(self.add_where(node, Conjunction::And))
    }

    /// `OR EXISTS (subquery)`.
    ///
    /// # Errors
    ///
    /// Propagates errors from the closure.
    fn or_where_exists<F>(self, callback: F) -> Result<Self>
    where
        F: FnOnce(QueryBuilder) -> Result<QueryBuilder>,
    {
        let node = exists(&self, callback, false)?;
        Ok(self.add_where(node, Conjunction::Or))
    }

    /// `NOT EXISTS (subquery)`.
    ///
    /// # Errors
    ///
    /// Propagates errors from the closure.
    fn where_not_exists<F>(self, callback: F) -> Result<Self>
    where
        F: FnOnce(QueryBuilder) -> Result<QueryBuilder>,
    {
        let node = exists(&self, callback, true)?;
        Ok(self.add_where(node, Conjunction::And))
    }

    /// `OR NOT EXISTS (subquery)`.
    ///
    /// # Errors
    ///
    /// Propagates errors from the closure.
    fn or_where_not_exists<F>(self, callback: F) -> Result<Self>
    where
        F: FnOnce(QueryBuilder) -> Result<QueryBuilder>,
    {
        let node = exists(&self, callback, true)?;
        Ok(self.add_where(node, Conjunction::Or))
    }

    /// A nested group of `column = value` pairs joined with AND.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn where_array<'c, I, V>(self, conditions: I, conjunction: Conjunction) -> Result<Self>
    where
        I: IntoIterator<Item = (&'c str, V)>,
        V: ToSqlValue,
    {
        let mut nested = self.for_nested_where();
        for (column, value) in conditions {
            nested = nested.where_eq(column, value)?;
        }
        Ok(self.add_nested_where_query(nested, conjunction))
    }
}

impl WhereClauseBuilder for QueryBuilder {}

pub(crate) fn comparison(
    column: &str,
    operator: &str,
    value: SqlValue,
    kind: BindingType,
) -> Result<Expr> {
    let operator = prepare_value_and_operator(operator, &value)?;
    Ok(Expr::comparison(
        parse_column(column)?,
        operator,
        Expr::binding(value, kind),
    ))
}

fn column_comparison(first: &str, operator: &str, second: &str) -> Result<Expr> {
    let operator = super::parse_operator(operator)?;
    Ok(Expr::comparison(
        parse_column(first)?,
        operator,
        parse_column(second)?,
    ))
}

fn in_list<I, V>(column: &str, values: I, negated: bool, kind: BindingType) -> Result<Expr>
where
    I: IntoIterator<Item = V>,
    V: ToSqlValue,
{
    Ok(Expr::In(InPredicateExpression {
        expression: Box::new(parse_column(column)?),
        values: InValues::List(
            values
                .into_iter()
                .map(|v| Expr::binding(v.to_sql_value(), kind))
                .collect(),
        ),
        negated,
    }))
}

fn integer_in<I>(column: &str, values: I, negated: bool) -> Result<Expr>
where
    I: IntoIterator<Item = i64>,
{
    Ok(Expr::In(InPredicateExpression {
        expression: Box::new(parse_column(column)?),
        values: InValues::List(
            values
                .into_iter()
                .map(|v| Expr::raw(v.to_string()))
                .collect(),
        ),
        negated,
    }))
}

fn in_sub<B, F>(builder: &B, column: &str, callback: F, negated: bool) -> Result<Expr>
where
    B: BuilderState,
    F: FnOnce(QueryBuilder) -> Result<QueryBuilder>,
{
    let query = callback(builder.new_query())?;
    Ok(Expr::In(InPredicateExpression {
        expression: Box::new(parse_column(column)?),
        values: InValues::Query(NestedExpression::new(builder.where_binding(), query)),
        negated,
    }))
}

pub(crate) fn null_predicate(column: &str, negated: bool) -> Result<Expr> {
    Ok(Expr::NullPredicate(NullPredicateExpression {
        expression: Box::new(parse_column(column)?),
        negated,
    }))
}

pub(crate) fn between(
    column: &str,
    low: SqlValue,
    high: SqlValue,
    negated: bool,
    kind: BindingType,
) -> Result<Expr> {
    Ok(Expr::Between(BetweenPredicateExpression {
        expression: Box::new(parse_column(column)?),
        low: Box::new(Expr::binding(low, kind)),
        high: Box::new(Expr::binding(high, kind)),
        negated,
    }))
}

fn exists<B, F>(builder: &B, callback: F, negated: bool) -> Result<Expr>
where
    B: BuilderState,
    F: FnOnce(QueryBuilder) -> Result<QueryBuilder>,
{
    let query = callback(builder.new_query())?;
    Ok(Expr::Exists(ExistsPredicateExpression {
        query: NestedExpression::new(builder.where_binding(), query),
        negated,
    }))
}

fn nested_not<B, F>(builder: B, callback: F, conjunction: Conjunction) -> Result<B>
where
    B: WhereClauseBuilder,
    F: FnOnce(QueryBuilder) -> Result<QueryBuilder>,
{
    let nested = callback(builder.for_nested_where())?;
    if nested.state().wheres.is_empty() {
        return Ok(builder);
    }
    let node = Expr::not(Expr::NestedPredicate(NestedPredicateExpression {
        query: Box::new(nested),
    }));
    Ok(builder.add_where(node, conjunction))
}
