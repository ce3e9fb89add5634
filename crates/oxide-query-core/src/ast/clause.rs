//! One struct per SQL clause.

use super::expression::Expr;
use super::types::{Distinct, Lock};

/// `SELECT [DISTINCT] columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectClause {
    pub distinct: Distinct,
    pub columns: Vec<Expr>,
}

/// `FROM table joins`.
#[derive(Debug, Clone, PartialEq)]
pub struct FromClause {
    pub table: Expr,
    pub joins: Vec<Expr>,
}

/// `WHERE condition`.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub condition: Expr,
}

/// `GROUP BY columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupByClause {
    pub columns: Vec<Expr>,
}

/// `HAVING condition`.
#[derive(Debug, Clone, PartialEq)]
pub struct HavingClause {
    pub condition: Expr,
}

/// `ORDER BY elements`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByClause {
    pub elements: Vec<Expr>,
}

/// Row limit. SQL Server renders it as `TOP n` or `FETCH NEXT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitClause {
    pub value: usize,
}

/// Row offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetClause {
    pub value: usize,
}

/// Row lock request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockClause {
    pub lock: Lock,
}
