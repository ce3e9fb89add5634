//! Expression, predicate and fragment nodes.
//!
//! Every node a builder array can hold is a variant of [`Expr`]. Nodes are
//! plain data; rendering lives in the visitors.

use std::fmt::Write;

use super::types::{
    AggregateFunction, BindingType, Conjunction, FunctionName, JoinType, JsonArrow,
    OrderDirection,
};
use crate::builder::value::SqlValue;
use crate::builder::QueryBuilder;

/// A single name. `*` is kept as a name and never quoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: String,
}

impl Identifier {
    /// Creates an identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns true for the `*` wildcard.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.name == "*"
    }
}

/// A dotted chain such as `schema.table.column`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpression {
    pub segments: Vec<Identifier>,
}

impl PathExpression {
    /// Creates a path from segment names.
    #[must_use]
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Identifier::new).collect(),
        }
    }

    /// Returns the last segment, usually the column name.
    #[must_use]
    pub fn last(&self) -> Option<&Identifier> {
        self.segments.last()
    }

    /// Returns the path joined with dots.
    #[must_use]
    pub fn dotted(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// A table name, optionally schema qualified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    pub path: PathExpression,
}

/// One `->key` or `->>key` leg of a JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonLeg {
    pub arrow: JsonArrow,
    pub key: String,
}

/// A column followed by JSON path legs, as in `options->language`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPathExpression {
    pub column: PathExpression,
    pub legs: Vec<JsonLeg>,
}

impl JsonPathExpression {
    /// Returns true if the final leg unquotes the value.
    #[must_use]
    pub fn unquotes(&self) -> bool {
        self.legs
            .last()
            .is_some_and(|leg| leg.arrow == JsonArrow::ExtractText)
    }

    /// Returns the `$."a"."b"` path used by the JSON functions.
    #[must_use]
    pub fn json_path(&self) -> String {
        let mut path = String::from("$");
        for leg in &self.legs {
            if leg.key.parse::<usize>().is_ok() {
                let _ = write!(path, "[{}]", leg.key);
            } else {
                let _ = write!(path, ".\"{}\"", leg.key.replace('\'', "''"));
            }
        }
        path
    }
}

/// A column expression with an optional alias.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnReferenceExpression {
    pub expression: Box<Expr>,
    pub alias: Option<String>,
}

/// A table expression with an optional alias.
#[derive(Debug, Clone, PartialEq)]
pub struct TableReferenceExpression {
    pub table: Box<Expr>,
    pub alias: Option<String>,
}

/// SQL text rendered verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawExpression {
    pub sql: String,
}

impl RawExpression {
    /// Creates a raw expression.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }
}

/// Raw SQL carrying `?` placeholders and their values.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBindingExpression {
    pub raw: RawExpression,
    pub bindings: Vec<BindingVariable>,
}

/// A value drained into the bindings when visited.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingVariable {
    pub value: SqlValue,
    pub kind: BindingType,
}

impl BindingVariable {
    /// Creates a binding of the given clause type.
    #[must_use]
    pub const fn new(value: SqlValue, kind: BindingType) -> Self {
        Self { value, kind }
    }
}

/// `left <op> right`.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonPredicateExpression {
    pub left: Box<Expr>,
    pub operator: String,
    pub right: Box<Expr>,
}

/// `expr [NOT] BETWEEN low AND high`.
#[derive(Debug, Clone, PartialEq)]
pub struct BetweenPredicateExpression {
    pub expression: Box<Expr>,
    pub low: Box<Expr>,
    pub high: Box<Expr>,
    pub negated: bool,
}

/// The right-hand side of an IN predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum InValues {
    List(Vec<Expr>),
    Query(NestedExpression),
}

/// `expr [NOT] IN (...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct InPredicateExpression {
    pub expression: Box<Expr>,
    pub values: InValues,
    pub negated: bool,
}

/// `expr IS [NOT] NULL`.
#[derive(Debug, Clone, PartialEq)]
pub struct NullPredicateExpression {
    pub expression: Box<Expr>,
    pub negated: bool,
}

/// `[NOT] EXISTS (subquery)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExistsPredicateExpression {
    pub query: NestedExpression,
    pub negated: bool,
}

/// `NOT expr`.
#[derive(Debug, Clone, PartialEq)]
pub struct NotExpression {
    pub expression: Box<Expr>,
}

/// Two predicates joined by AND/OR.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub left: Box<Expr>,
    pub conjunction: Conjunction,
    pub right: Box<Expr>,
}

/// A parenthesized group of predicates held by a child builder.
///
/// A compilation may visit a given instance once only.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedPredicateExpression {
    pub query: Box<QueryBuilder>,
}

/// A JOIN with its optional ON predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinFragment {
    pub join_type: JoinType,
    pub table: Box<Expr>,
    pub on: Option<Box<Expr>>,
}

/// One UNION leg.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionFragment {
    pub query: NestedExpression,
    pub all: bool,
}

/// `FUNC([DISTINCT] columns) AS aggregate`.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateFunctionCallFragment {
    pub function: AggregateFunction,
    pub columns: Vec<Expr>,
    pub distinct: bool,
}

/// Source of a nested query.
#[derive(Debug, Clone, PartialEq)]
pub enum Subquery {
    /// A builder compiled with the outer grammar and context.
    Builder(Box<QueryBuilder>),
    /// An already compiled query supplied by a caller.
    Raw {
        sql: String,
        bindings: Vec<SqlValue>,
    },
}

impl From<QueryBuilder> for Subquery {
    fn from(builder: QueryBuilder) -> Self {
        Self::Builder(Box::new(builder))
    }
}

impl From<crate::binding::CompiledQuery> for Subquery {
    fn from(compiled: crate::binding::CompiledQuery) -> Self {
        let bindings = compiled.bindings.values().to_vec();
        Self::Raw {
            sql: compiled.sql,
            bindings,
        }
    }
}

/// A subquery box; its bindings merge into the outer query under `kind`.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedExpression {
    pub kind: BindingType,
    pub query: Subquery,
}

impl NestedExpression {
    /// Creates a nested expression.
    #[must_use]
    pub fn new(kind: BindingType, query: impl Into<Subquery>) -> Self {
        Self {
            kind,
            query: query.into(),
        }
    }
}

/// Filters order entries on `columns` out of `orders` at render time.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectOrderElementExpression {
    pub columns: Vec<String>,
    pub orders: Vec<Expr>,
}

/// A dialect-neutral function call.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCallExpression {
    pub name: FunctionName,
    pub args: Vec<Expr>,
}

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByElement {
    pub expression: Box<Expr>,
    pub direction: OrderDirection,
}

/// `column = value` inside UPDATE ... SET.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentSetClause {
    pub column: Box<Expr>,
    pub value: Box<Expr>,
}

/// `left <op> right` for arithmetic such as increments.
#[derive(Debug, Clone, PartialEq)]
pub struct ArithmeticExpression {
    pub left: Box<Expr>,
    pub operator: String,
    pub right: Box<Expr>,
}

/// Every expression, predicate and fragment node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Identifier(Identifier),
    Path(PathExpression),
    TableName(TableName),
    JsonPath(JsonPathExpression),
    ColumnReference(ColumnReferenceExpression),
    TableReference(TableReferenceExpression),
    Raw(RawExpression),
    RawBinding(RawBindingExpression),
    Binding(BindingVariable),
    NumberLiteral(f64),
    StringLiteral(String),
    Comparison(ComparisonPredicateExpression),
    Between(BetweenPredicateExpression),
    In(InPredicateExpression),
    NullPredicate(NullPredicateExpression),
    Exists(ExistsPredicateExpression),
    Not(NotExpression),
    Binary(BinaryExpression),
    NestedPredicate(NestedPredicateExpression),
    Join(JoinFragment),
    Union(UnionFragment),
    AggregateFunctionCall(AggregateFunctionCallFragment),
    Nested(NestedExpression),
    RejectOrderElement(RejectOrderElementExpression),
    FunctionCall(FunctionCallExpression),
    OrderElement(OrderByElement),
    Assignment(AssignmentSetClause),
    Arithmetic(ArithmeticExpression),
}

impl Expr {
    /// Raw SQL.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(RawExpression::new(sql))
    }

    /// Raw SQL with `?` bindings of the given clause type.
    #[must_use]
    pub fn raw_with_bindings(
        sql: impl Into<String>,
        bindings: Vec<SqlValue>,
        kind: BindingType,
    ) -> Self {
        if bindings.is_empty() {
            return Self::raw(sql);
        }
        Self::RawBinding(RawBindingExpression {
            raw: RawExpression::new(sql),
            bindings: bindings
                .into_iter()
                .map(|value| BindingVariable::new(value, kind))
                .collect(),
        })
    }

    /// A bound value.
    #[must_use]
    pub const fn binding(value: SqlValue, kind: BindingType) -> Self {
        Self::Binding(BindingVariable::new(value, kind))
    }

    /// A column path built from segment names, without parsing.
    #[must_use]
    pub fn path<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Path(PathExpression::new(segments))
    }

    /// `left <op> right`.
    #[must_use]
    pub fn comparison(left: Self, operator: impl Into<String>, right: Self) -> Self {
        Self::Comparison(ComparisonPredicateExpression {
            left: Box::new(left),
            operator: operator.into(),
            right: Box::new(right),
        })
    }

    /// `left AND/OR right`.
    #[must_use]
    pub fn binary(left: Self, conjunction: Conjunction, right: Self) -> Self {
        Self::Binary(BinaryExpression {
            left: Box::new(left),
            conjunction,
            right: Box::new(right),
        })
    }

    /// `NOT expr`.
    #[must_use]
    pub fn not(expression: Self) -> Self {
        Self::Not(NotExpression {
            expression: Box::new(expression),
        })
    }

    /// A dialect-neutral function call.
    #[must_use]
    pub const fn function(name: FunctionName, args: Vec<Self>) -> Self {
        Self::FunctionCall(FunctionCallExpression { name, args })
    }

    /// Returns the column path this node names, looking through aliases,
    /// order entries and JSON legs.
    #[must_use]
    pub fn column_name(&self) -> Option<String> {
        match self {
            Self::Identifier(ident) => Some(ident.name.clone()),
            Self::Path(path) => Some(path.dotted()),
            Self::JsonPath(json) => Some(json.column.dotted()),
            Self::ColumnReference(col) => col.expression.column_name(),
            Self::OrderElement(order) => order.expression.column_name(),
            _ => None,
        }
    }

    /// Returns true if the node is a predicate that can be folded with
    /// AND/OR.
    #[must_use]
    pub const fn is_predicate(&self) -> bool {
        matches!(
            self,
            Self::Comparison(_)
                | Self::Between(_)
                | Self::In(_)
                | Self::NullPredicate(_)
                | Self::Exists(_)
                | Self::Not(_)
                | Self::Binary(_)
                | Self::NestedPredicate(_)
                | Self::FunctionCall(_)
                | Self::Raw(_)
                | Self::RawBinding(_)
        )
    }
}
