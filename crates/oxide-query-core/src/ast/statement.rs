//! Top-level statements assembled by the grammars.

use super::clause::{
    FromClause, GroupByClause, HavingClause, LimitClause, LockClause, OffsetClause,
    OrderByClause, SelectClause, WhereClause,
};
use super::expression::{Expr, NestedExpression};

/// A single SELECT.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpecification {
    pub select: SelectClause,
    pub from: Option<FromClause>,
    pub where_clause: Option<WhereClause>,
    pub group_by: Option<GroupByClause>,
    pub having: Option<HavingClause>,
    pub order_by: Option<OrderByClause>,
    pub limit: Option<LimitClause>,
    pub offset: Option<OffsetClause>,
    pub lock: Option<LockClause>,
}

/// `left UNION [ALL] right`, left-deep, with the trailing union clauses on
/// the outermost node only.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryUnionQueryExpression {
    pub left: Box<Statement>,
    pub right: NestedExpression,
    pub all: bool,
    pub order_by: Option<OrderByClause>,
    pub limit: Option<LimitClause>,
    pub offset: Option<OffsetClause>,
}

/// `UPDATE [TOP (n)] target [joins] SET .. [FROM ..] [WHERE ..] [ORDER BY ..] [LIMIT n]`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSpecification {
    pub target: Expr,
    pub top: Option<usize>,
    pub joins: Vec<Expr>,
    pub assignments: Vec<Expr>,
    pub from: Option<FromClause>,
    pub where_clause: Option<WhereClause>,
    pub order_by: Option<OrderByClause>,
    pub limit: Option<LimitClause>,
}

/// `DELETE [TOP (n)] [target] FROM .. [WHERE ..] [ORDER BY ..] [LIMIT n]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteSpecification {
    pub target: Option<Expr>,
    pub top: Option<usize>,
    pub from: FromClause,
    pub where_clause: Option<WhereClause>,
    pub order_by: Option<OrderByClause>,
    pub limit: Option<LimitClause>,
}

/// The INSERT keyword form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertVerb {
    #[default]
    Insert,
    /// `INSERT IGNORE INTO`
    InsertIgnore,
    /// `INSERT OR IGNORE INTO`
    InsertOrIgnore,
}

/// Where inserted rows come from.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    Values(Vec<Vec<Expr>>),
    Query(NestedExpression),
    DefaultValues,
}

/// Conflict handling appended to an INSERT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictClause {
    /// `ON CONFLICT DO NOTHING`
    DoNothing,
    /// `ON CONFLICT (unique_by) DO UPDATE SET col = excluded.col`
    DoUpdate {
        unique_by: Vec<String>,
        update: Vec<String>,
    },
    /// `ON DUPLICATE KEY UPDATE col = VALUES(col)`
    DuplicateKeyUpdate { update: Vec<String> },
}

/// `INSERT INTO table (columns) source`.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertSpecification {
    pub verb: InsertVerb,
    pub table: Expr,
    pub columns: Vec<Expr>,
    pub source: InsertSource,
    pub conflict: Option<ConflictClause>,
    pub returning: Vec<Expr>,
}

/// `MERGE` based upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeSpecification {
    pub table: Expr,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Expr>>,
    pub unique_by: Vec<String>,
    pub update: Vec<String>,
}

/// `TRUNCATE`.
#[derive(Debug, Clone, PartialEq)]
pub struct TruncateSpecification {
    pub table: Expr,
}

/// Every statement a grammar can assemble.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(QuerySpecification),
    Union(BinaryUnionQueryExpression),
    Insert(InsertSpecification),
    Update(UpdateSpecification),
    Delete(DeleteSpecification),
    Merge(MergeSpecification),
    Truncate(TruncateSpecification),
}
