//! Abstract syntax tree for compiled queries.
//!
//! Builders store [`Expr`] nodes in their clause arrays. Grammars assemble
//! those nodes into a [`Statement`], and visitors render the statement.

mod clause;
mod expression;
mod statement;
mod types;

pub use clause::{
    FromClause, GroupByClause, HavingClause, LimitClause, LockClause, OffsetClause,
    OrderByClause, SelectClause, WhereClause,
};
pub use expression::{
    AggregateFunctionCallFragment, ArithmeticExpression, AssignmentSetClause,
    BetweenPredicateExpression, BinaryExpression, BindingVariable, ColumnReferenceExpression,
    ComparisonPredicateExpression, ExistsPredicateExpression, Expr, FunctionCallExpression,
    Identifier, InPredicateExpression, InValues, JoinFragment, JsonLeg, JsonPathExpression,
    NestedExpression, NestedPredicateExpression, NotExpression, NullPredicateExpression,
    OrderByElement, PathExpression, RawBindingExpression, RawExpression,
    RejectOrderElementExpression, Subquery, TableName, TableReferenceExpression, UnionFragment,
};
pub use statement::{
    BinaryUnionQueryExpression, ConflictClause, DeleteSpecification, InsertSource,
    InsertSpecification, InsertVerb, MergeSpecification, QuerySpecification, Statement,
    TruncateSpecification, UpdateSpecification,
};
pub use types::{
    AggregateFunction, BindingType, Conjunction, Distinct, FunctionName, JoinType, JsonArrow,
    Lock, OrderDirection,
};
