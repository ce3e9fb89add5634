//! The join family.

use std::sync::Arc;

use super::value::ToSqlValue;
use super::where_clause::WhereClauseBuilder;
use super::where_date::WhereDateBuilder;
use super::where_json::WhereJsonBuilder;
use super::where_predicate::WherePredicateBuilder;
use super::{
    parse_operator, parse_qualified_column, parse_table, push_predicate, BuilderState,
    QueryBuilder, QueryState,
};
use crate::ast::{
    BindingType, Conjunction, Expr, JoinFragment, JoinType, NestedExpression, Subquery,
    TableReferenceExpression,
};
use crate::error::Result;
use crate::grammar::Grammar;
use crate::parser::FragmentParser;

/// The ON builder handed to [`JoinClauseBuilder::join_on`] closures.
///
/// It carries the whole where surface; values it binds are typed `join`.
#[derive(Debug, Clone)]
pub struct JoinClause {
    join_type: JoinType,
    table: Expr,
    query: QueryBuilder,
}

impl JoinClause {
    /// Creates an ON builder for `table`.
    #[must_use]
    pub fn new(grammar: Arc<dyn Grammar>, join_type: JoinType, table: Expr) -> Self {
        Self {
            join_type,
            table,
            query: QueryBuilder::with_where_binding(grammar, BindingType::Join),
        }
    }

    /// `ON first <operator> second`.
    ///
    /// # Errors
    ///
    /// Returns an error on a bad operator or column.
    pub fn on(self, first: &str, operator: &str, second: &str) -> Result<Self> {
        self.on_with(first, operator, second, Conjunction::And)
    }

    /// `OR first <operator> second`.
    ///
    /// # Errors
    ///
    /// Returns an error on a bad operator or column.
    pub fn or_on(self, first: &str, operator: &str, second: &str) -> Result<Self> {
        self.on_with(first, operator, second, Conjunction::Or)
    }

    fn on_with(
        mut self,
        first: &str,
        operator: &str,
        second: &str,
        conjunction: Conjunction,
    ) -> Result<Self> {
        let node = Expr::comparison(
            parse_qualified_column(first)?,
            parse_operator(operator)?,
            parse_qualified_column(second)?,
        );
        push_predicate(&mut self.query.state_mut().wheres, node, conjunction);
        Ok(self)
    }

    /// Converts the clause into a join node.
    #[must_use]
    pub fn into_fragment(mut self) -> Expr {
        let on = self.query.state_mut().wheres.pop().map(Box::new);
        Expr::Join(JoinFragment {
            join_type: self.join_type,
            table: Box::new(self.table),
            on,
        })
    }
}

impl BuilderState for JoinClause {
    fn state(&self) -> &QueryState {
        self.query.state()
    }

    fn state_mut(&mut self) -> &mut QueryState {
        self.query.state_mut()
    }

    fn grammar(&self) -> &Arc<dyn Grammar> {
        self.query.grammar()
    }

    fn where_binding(&self) -> BindingType {
        BindingType::Join
    }
}

impl WhereClauseBuilder for JoinClause {}
impl WhereDateBuilder for JoinClause {}
impl WhereJsonBuilder for JoinClause {}
impl WherePredicateBuilder for JoinClause {}

/// Join clauses.
pub trait JoinClauseBuilder: BuilderState {
    /// Appends a join node.
    #[must_use]
    fn add_join(mut self, join: Expr) -> Self {
        self.state_mut().joins.push(join);
        self
    }

    /// `INNER JOIN table ON first <operator> second`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed table, column or operator.
    fn join(self, table: &str, first: &str, operator: &str, second: &str) -> Result<Self> {
        join_columns(self, JoinType::Inner, table, first, operator, second)
    }

    /// `INNER JOIN table ON first <operator> ?`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed table, column or operator.
    fn join_where(
        self,
        table: &str,
        first: &str,
        operator: &str,
        value: impl ToSqlValue,
    ) -> Result<Self> {
        join_value(self, JoinType::Inner, table, first, operator, value)
    }

    /// A join whose ON tree is built by `callback`.
    ///
    /// # Errors
    ///
    /// Propagates errors from the closure or a malformed table.
    fn join_on<F>(self, table: &str, join_type: JoinType, callback: F) -> Result<Self>
    where
        F: FnOnce(JoinClause) -> Result<JoinClause>,
    {
        let clause = JoinClause::new(Arc::clone(self.grammar()), join_type, parse_table(table)?);
        let clause = callback(clause)?;
        Ok(self.add_join(clause.into_fragment()))
    }

    /// `LEFT JOIN table ON first <operator> second`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed table, column or operator.
    fn left_join(self, table: &str, first: &str, operator: &str, second: &str) -> Result<Self> {
        join_columns(self, JoinType::Left, table, first, operator, second)
    }

    /// `LEFT JOIN table ON first <operator> ?`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed table, column or operator.
    fn left_join_where(
        self,
        table: &str,
        first: &str,
        operator: &str,
        value: impl ToSqlValue,
    ) -> Result<Self> {
        join_value(self, JoinType::Left, table, first, operator, value)
    }

    /// `RIGHT JOIN table ON first <operator> second`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed table, column or operator.
    fn right_join(self, table: &str, first: &str, operator: &str, second: &str) -> Result<Self> {
        join_columns(self, JoinType::Right, table, first, operator, second)
    }

    /// `RIGHT JOIN table ON first <operator> ?`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed table, column or operator.
    fn right_join_where(
        self,
        table: &str,
        first: &str,
        operator: &str,
        value: impl ToSqlValue,
    ) -> Result<Self> {
        join_value(self, JoinType::Right, table, first, operator, value)
    }

    /// `CROSS JOIN table`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed table.
    fn cross_join(self, table: &str) -> Result<Self> {
        let clause = JoinClause::new(Arc::clone(self.grammar()), JoinType::Cross, parse_table(table)?);
        Ok(self.add_join(clause.into_fragment()))
    }

    /// `INNER JOIN (subquery) AS alias ON first <operator> second`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed alias, column or operator.
    fn join_sub(
        self,
        query: impl Into<Subquery>,
        alias: &str,
        first: &str,
        operator: &str,
        second: &str,
    ) -> Result<Self> {
        join_sub_with(self, JoinType::Inner, query.into(), alias, first, operator, second)
    }

    /// `LEFT JOIN (subquery) AS alias ON ...`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed alias, column or operator.
    fn left_join_sub(
        self,
        query: impl Into<Subquery>,
        alias: &str,
        first: &str,
        operator: &str,
        second: &str,
    ) -> Result<Self> {
        join_sub_with(self, JoinType::Left, query.into(), alias, first, operator, second)
    }

    /// `RIGHT JOIN (subquery) AS alias ON ...`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed alias, column or operator.
    fn right_join_sub(
        self,
        query: impl Into<Subquery>,
        alias: &str,
        first: &str,
        operator: &str,
        second: &str,
    ) -> Result<Self> {
        join_sub_with(self, JoinType::Right, query.into(), alias, first, operator, second)
    }

    /// Parses a whole `table [AS alias] [ON a = b]` fragment.
    ///
    /// # Errors
    ///
    /// Returns an error if the fragment does not parse.
    fn join_fragment(self, fragment: &str, join_type: JoinType) -> Result<Self> {
        let parsed = FragmentParser::new(fragment).parse_join()?;
        Ok(self.add_join(Expr::Join(JoinFragment {
            join_type,
            table: Box::new(parsed.table),
            on: parsed.on.map(Box::new),
        })))
    }
}

impl JoinClauseBuilder for QueryBuilder {}

fn join_columns<B: JoinClauseBuilder>(
    builder: B,
    join_type: JoinType,
    table: &str,
    first: &str,
    operator: &str,
    second: &str,
) -> Result<B> {
    let clause = JoinClause::new(Arc::clone(builder.grammar()), join_type, parse_table(table)?)
        .on(first, operator, second)?;
    Ok(builder.add_join(clause.into_fragment()))
}

fn join_value<B: JoinClauseBuilder>(
    builder: B,
    join_type: JoinType,
    table: &str,
    first: &str,
    operator: &str,
    value: impl ToSqlValue,
) -> Result<B> {
    let clause = JoinClause::new(Arc::clone(builder.grammar()), join_type, parse_table(table)?)
        .where_(first, operator, value)?;
    Ok(builder.add_join(clause.into_fragment()))
}

fn join_sub_with<B: JoinClauseBuilder>(
    builder: B,
    join_type: JoinType,
    query: Subquery,
    alias: &str,
    first: &str,
    operator: &str,
    second: &str,
) -> Result<B> {
    let alias = FragmentParser::new(alias).parse_as_name()?;
    let table = Expr::TableReference(TableReferenceExpression {
        table: Box::new(Expr::Nested(NestedExpression::new(BindingType::Join, query))),
        alias: Some(alias),
    });
    let clause = JoinClause::new(Arc::clone(builder.grammar()), join_type, table)
        .on(first, operator, second)?;
    Ok(builder.add_join(clause.into_fragment()))
}
