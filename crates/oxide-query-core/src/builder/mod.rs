//! Fluent query builder.
//!
//! [`QueryBuilder`] only accumulates AST nodes; SQL is produced by the
//! grammar it was created with. Each clause family is a trait with provided
//! methods over [`BuilderState`], so [`JoinClause`] gets the whole where
//! surface for its ON predicates.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use oxide_query_core::builder::{QueryBuilder, WhereClauseBuilder};
//! use oxide_query_core::grammar::MySqlGrammar;
//!
//! let mut query = QueryBuilder::new(Arc::new(MySqlGrammar::new()))
//!     .from("users")?
//!     .where_eq("votes", 100)?
//!     .or_where("name", "=", "John")?;
//!
//! assert_eq!(
//!     query.to_sql()?,
//!     "SELECT * FROM `users` WHERE `votes` = ? OR `name` = ?"
//! );
//! assert_eq!(query.get_bindings().len(), 2);
//! # Ok::<(), oxide_query_core::QueryError>(())
//! ```

mod aggregate;
mod execute;
mod expr;
mod group_by;
mod having;
mod join;
mod limit_offset;
mod order_by;
mod union;
pub mod value;
mod where_clause;
mod where_date;
mod where_json;
mod where_predicate;

use std::collections::BTreeMap;
use std::sync::Arc;

pub use aggregate::AggregateBuilder;
pub use expr::{col, Column, Predicate};
pub use group_by::GroupByClauseBuilder;
pub use having::HavingClauseBuilder;
pub use join::{JoinClause, JoinClauseBuilder};
pub use limit_offset::LimitOffsetClauseBuilder;
pub use order_by::OrderByClauseBuilder;
pub use union::UnionClauseBuilder;
pub use value::{SqlValue, ToSqlValue};
pub use where_clause::WhereClauseBuilder;
pub use where_date::WhereDateBuilder;
pub use where_json::WhereJsonBuilder;
pub use where_predicate::WherePredicateBuilder;

use crate::ast::{
    BindingType, ColumnReferenceExpression, Conjunction, Distinct, Expr, Lock, NestedExpression,
    Subquery, TableReferenceExpression,
};
use crate::binding::{Bindings, CompiledQuery};
use crate::error::{QueryError, Result};
use crate::grammar::Grammar;
use crate::parser::FragmentParser;

/// One row of insert or update values, keyed by column name.
pub type Record = BTreeMap<String, SqlValue>;

/// Operators accepted by the where and having families.
const OPERATORS: &[&str] = &[
    "=", "<", ">", "<=", ">=", "<>", "!=", "<=>", "like", "like binary", "not like", "ilike",
    "&", "|", "^", "<<", ">>", "&~", "rlike", "not rlike", "regexp", "not regexp", "~", "~*",
    "!~", "!~*", "similar to", "not similar to", "not ilike", "~~*", "!~~*",
];

/// Clause arrays and scalars of one logical query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryState {
    pub columns: Vec<Expr>,
    pub joins: Vec<Expr>,
    pub wheres: Vec<Expr>,
    pub groups: Vec<Expr>,
    pub havings: Vec<Expr>,
    pub orders: Vec<Expr>,
    pub unions: Vec<Expr>,
    pub union_orders: Vec<Expr>,
    pub aggregate: Option<Expr>,
    pub distinct: Distinct,
    pub from: Option<Expr>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub union_limit: Option<usize>,
    pub union_offset: Option<usize>,
    pub lock: Option<Lock>,
}

/// Names a [`QueryState`] field for [`QueryBuilder::clone_without`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    Columns,
    Joins,
    Wheres,
    Groups,
    Havings,
    Orders,
    Unions,
    UnionOrders,
    Aggregate,
    Distinct,
    From,
    Limit,
    Offset,
    UnionLimit,
    UnionOffset,
    Lock,
}

impl QueryState {
    /// Resets one field to its empty value.
    pub fn clear(&mut self, property: Property) {
        match property {
            Property::Columns => self.columns.clear(),
            Property::Joins => self.joins.clear(),
            Property::Wheres => self.wheres.clear(),
            Property::Groups => self.groups.clear(),
            Property::Havings => self.havings.clear(),
            Property::Orders => self.orders.clear(),
            Property::Unions => self.unions.clear(),
            Property::UnionOrders => self.union_orders.clear(),
            Property::Aggregate => self.aggregate = None,
            Property::Distinct => self.distinct = Distinct::All,
            Property::From => self.from = None,
            Property::Limit => self.limit = None,
            Property::Offset => self.offset = None,
            Property::UnionLimit => self.union_limit = None,
            Property::UnionOffset => self.union_offset = None,
            Property::Lock => self.lock = None,
        }
    }
}

/// Access to the clause arrays the builder traits fill in.
pub trait BuilderState: Sized {
    /// Returns the clause state.
    fn state(&self) -> &QueryState;

    /// Returns the clause state for mutation.
    fn state_mut(&mut self) -> &mut QueryState;

    /// Returns the grammar child queries are created with.
    fn grammar(&self) -> &Arc<dyn Grammar>;

    /// Binding type of values added through the where family.
    fn where_binding(&self) -> BindingType;

    /// Creates an empty builder on the same grammar.
    fn new_query(&self) -> QueryBuilder {
        QueryBuilder::new(Arc::clone(self.grammar()))
    }

    /// Creates the child builder handed to nested where closures.
    ///
    /// The child copies the parent's `from` as it is now; a parent without a
    /// table yet gives a child without one.
    fn for_nested_where(&self) -> QueryBuilder {
        let mut query = self.new_query();
        query.where_kind = self.where_binding();
        query.state.from = self.state().from.clone();
        query
    }
}

/// Fluent query builder.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    grammar: Arc<dyn Grammar>,
    state: QueryState,
    where_kind: BindingType,
    bindings: Bindings,
}

impl PartialEq for QueryBuilder {
    fn eq(&self, other: &Self) -> bool {
        self.grammar.name() == other.grammar.name() && self.state == other.state
    }
}

impl BuilderState for QueryBuilder {
    fn state(&self) -> &QueryState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut QueryState {
        &mut self.state
    }

    fn grammar(&self) -> &Arc<dyn Grammar> {
        &self.grammar
    }

    fn where_binding(&self) -> BindingType {
        self.where_kind
    }
}

impl QueryBuilder {
    /// Creates an empty builder compiling with `grammar`.
    #[must_use]
    pub fn new(grammar: Arc<dyn Grammar>) -> Self {
        Self::with_where_binding(grammar, BindingType::Where)
    }

    pub(crate) fn with_where_binding(grammar: Arc<dyn Grammar>, where_kind: BindingType) -> Self {
        Self {
            grammar,
            state: QueryState::default(),
            where_kind,
            bindings: Bindings::new(),
        }
    }

    /// Sets the selected columns, replacing earlier ones.
    ///
    /// # Errors
    ///
    /// Returns an error if a column fragment does not parse.
    pub fn select(mut self, columns: &[&str]) -> Result<Self> {
        self.state.columns = columns
            .iter()
            .map(|c| parse_column_alias(c))
            .collect::<Result<_>>()?;
        Ok(self)
    }

    /// Appends selected columns.
    ///
    /// # Errors
    ///
    /// Returns an error if a column fragment does not parse.
    pub fn add_select(mut self, columns: &[&str]) -> Result<Self> {
        for column in columns {
            self.state.columns.push(parse_column_alias(column)?);
        }
        Ok(self)
    }

    /// Appends a raw select expression.
    #[must_use]
    pub fn select_raw(mut self, sql: &str, bindings: Vec<SqlValue>) -> Self {
        self.state
            .columns
            .push(Expr::raw_with_bindings(sql, bindings, BindingType::Select));
        self
    }

    /// Appends `(subquery) AS alias` to the selected columns.
    ///
    /// # Errors
    ///
    /// Returns an error if the alias is not a valid name.
    pub fn select_sub(mut self, query: impl Into<Subquery>, alias: &str) -> Result<Self> {
        let alias = FragmentParser::new(alias).parse_as_name()?;
        self.state
            .columns
            .push(Expr::ColumnReference(ColumnReferenceExpression {
                expression: Box::new(Expr::Nested(NestedExpression::new(
                    BindingType::Select,
                    query,
                ))),
                alias: Some(alias),
            }));
        Ok(self)
    }

    /// Forces `SELECT DISTINCT`.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.state.distinct = Distinct::Distinct;
        self
    }

    /// `DISTINCT ON (columns)`, rendered as a plain `DISTINCT` outside Postgres.
    #[must_use]
    pub fn distinct_on(mut self, columns: &[&str]) -> Self {
        self.state.distinct = Distinct::On(columns.iter().map(|c| String::from(*c)).collect());
        self
    }

    /// Sets the table the query targets.
    ///
    /// # Errors
    ///
    /// Returns an error if the table fragment does not parse.
    pub fn from(mut self, table: &str) -> Result<Self> {
        self.state.from = Some(parse_table(table)?);
        Ok(self)
    }

    /// Selects from `(subquery) AS alias`.
    ///
    /// # Errors
    ///
    /// Returns an error if the alias is not a valid name.
    pub fn from_sub(mut self, query: impl Into<Subquery>, alias: &str) -> Result<Self> {
        let alias = FragmentParser::new(alias).parse_as_name()?;
        self.state.from = Some(Expr::TableReference(TableReferenceExpression {
            table: Box::new(Expr::Nested(NestedExpression::new(BindingType::From, query))),
            alias: Some(alias),
        }));
        Ok(self)
    }

    /// Selects from raw SQL.
    #[must_use]
    pub fn from_raw(mut self, sql: &str, bindings: Vec<SqlValue>) -> Self {
        self.state.from = Some(Expr::raw_with_bindings(sql, bindings, BindingType::From));
        self
    }

    /// Sets the row lock.
    #[must_use]
    pub fn lock(mut self, lock: Lock) -> Self {
        self.state.lock = Some(lock);
        self
    }

    /// Locks the selected rows for update.
    #[must_use]
    pub fn lock_for_update(self) -> Self {
        self.lock(Lock::Update)
    }

    /// Takes a shared lock on the selected rows.
    #[must_use]
    pub fn shared_lock(self) -> Self {
        self.lock(Lock::Shared)
    }

    /// Returns a copy with the given fields reset and no bindings.
    #[must_use]
    pub fn clone_without(&self, properties: &[Property]) -> Self {
        let mut clone = self.clone();
        for property in properties {
            clone.state.clear(*property);
        }
        clone.bindings.clear();
        clone
    }

    /// Drops the bindings of the last render.
    pub fn reset_bindings(&mut self) {
        self.bindings.clear();
    }

    /// Bindings of the last [`to_sql`](Self::to_sql) call, in clause order.
    #[must_use]
    pub fn get_bindings(&self) -> Vec<SqlValue> {
        self.bindings.flatten()
    }

    /// Bindings of the last [`to_sql`](Self::to_sql) call, keyed by clause.
    #[must_use]
    pub fn get_raw_bindings(&self) -> BTreeMap<&'static str, Vec<SqlValue>> {
        self.bindings.raw()
    }

    /// Renders the select statement and keeps its bindings on the builder.
    ///
    /// # Errors
    ///
    /// Returns an error if the grammar cannot render the query.
    pub fn to_sql(&mut self) -> Result<String> {
        self.reset_bindings();
        let compiled = self.compile()?;
        self.bindings = compiled.bindings;
        Ok(compiled.sql)
    }

    /// Renders the select statement without touching the builder.
    ///
    /// # Errors
    ///
    /// Returns an error if the grammar cannot render the query.
    pub fn compile(&self) -> Result<CompiledQuery> {
        self.grammar.compile_select(self)
    }
}

/// Parses a column without alias and unwraps the column reference.
pub(crate) fn parse_column(name: &str) -> Result<Expr> {
    match FragmentParser::new(name).parse_column_without_alias()? {
        Expr::ColumnReference(column) => Ok(*column.expression),
        other => Ok(other),
    }
}

pub(crate) fn parse_column_alias(name: &str) -> Result<Expr> {
    Ok(FragmentParser::new(name).parse_column_alias()?)
}

pub(crate) fn parse_table(name: &str) -> Result<Expr> {
    Ok(FragmentParser::new(name).parse_table_alias()?)
}

pub(crate) fn parse_qualified_column(name: &str) -> Result<Expr> {
    Ok(FragmentParser::new(name).parse_unary_table_column()?)
}

/// Lower-cases and checks an operator.
pub(crate) fn parse_operator(operator: &str) -> Result<String> {
    let normalized = operator.trim().to_ascii_lowercase();
    if OPERATORS.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err(QueryError::InvalidArgument(format!(
            "unknown operator [{operator}]"
        )))
    }
}

/// Checks an operator against a value; `NULL` only pairs with equality.
pub(crate) fn prepare_value_and_operator(operator: &str, value: &SqlValue) -> Result<String> {
    let operator = parse_operator(operator)?;
    if value.is_null() && !matches!(operator.as_str(), "=" | "<>" | "!=") {
        return Err(QueryError::InvalidArgument(String::from(
            "Illegal operator and value combination.",
        )));
    }
    Ok(operator)
}

/// Folds `node` onto the last entry of `list`, building a left-deep tree.
pub(crate) fn push_predicate(list: &mut Vec<Expr>, node: Expr, conjunction: Conjunction) {
    let folded = match list.pop() {
        Some(previous) => Expr::binary(previous, conjunction, node),
        None => node,
    };
    list.push(folded);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::MySqlGrammar;

    fn query() -> QueryBuilder {
        QueryBuilder::new(Arc::new(MySqlGrammar::new()))
    }

    #[test]
    fn test_select_parses_aliases() {
        let q = query().select(&["id", "users.email as mail"]).unwrap();
        assert_eq!(q.state().columns.len(), 2);
        assert!(matches!(
            &q.state().columns[1],
            Expr::ColumnReference(c) if c.alias.as_deref() == Some("mail")
        ));
    }

    #[test]
    fn test_select_rejects_bad_fragment() {
        assert!(matches!(
            query().select(&["a b c"]),
            Err(QueryError::Parse(_))
        ));
    }

    #[test]
    fn test_clone_without() {
        let q = query()
            .from("users")
            .unwrap()
            .select(&["id"])
            .unwrap()
            .lock_for_update();
        let clone = q.clone_without(&[Property::Columns, Property::Lock]);
        assert!(clone.state().columns.is_empty());
        assert!(clone.state().lock.is_none());
        assert!(clone.state().from.is_some());
        assert_eq!(q.state().columns.len(), 1);
    }

    #[test]
    fn test_for_nested_where_copies_from() {
        let parent = query().from("users").unwrap();
        assert_eq!(parent.for_nested_where().state().from, parent.state().from);
        assert!(query().for_nested_where().state().from.is_none());
    }

    #[test]
    fn test_parse_operator() {
        assert_eq!(parse_operator("LIKE").unwrap(), "like");
        assert!(matches!(
            parse_operator("=>"),
            Err(QueryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_null_only_pairs_with_equality() {
        assert!(prepare_value_and_operator("=", &SqlValue::Null).is_ok());
        assert!(prepare_value_and_operator("<>", &SqlValue::Null).is_ok());
        assert!(prepare_value_and_operator(">", &SqlValue::Null).is_err());
        assert!(prepare_value_and_operator(">", &SqlValue::Int(1)).is_ok());
    }

    #[test]
    fn test_push_predicate_is_left_deep() {
        let mut list = Vec::new();
        push_predicate(&mut list, Expr::raw("a"), Conjunction::Or);
        push_predicate(&mut list, Expr::raw("b"), Conjunction::And);
        push_predicate(&mut list, Expr::raw("c"), Conjunction::Or);
        assert_eq!(list.len(), 1);
        let Expr::Binary(top) = &list[0] else {
            panic!("Expected binary");
        };
        assert_eq!(top.conjunction, Conjunction::Or);
        assert!(matches!(*top.left, Expr::Binary(_)));
        assert_eq!(*top.right, Expr::raw("c"));
    }
}
