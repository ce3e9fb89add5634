//! The union family.

use super::{BuilderState, QueryBuilder};
use crate::ast::{BindingType, Expr, NestedExpression, Subquery, UnionFragment};
use crate::error::Result;

/// Union clauses.
pub trait UnionClauseBuilder: BuilderState {
    /// `UNION query`.
    #[must_use]
    fn union(self, query: impl Into<Subquery>) -> Self {
        add_union(self, query.into(), false)
    }

    /// `UNION ALL query`.
    #[must_use]
    fn union_all(self, query: impl Into<Subquery>) -> Self {
        add_union(self, query.into(), true)
    }

    /// `UNION [ALL]` with a query built by `callback` on a fresh builder.
    ///
    /// # Errors
    ///
    /// Propagates errors from the closure.
    fn union_with<F>(self, all: bool, callback: F) -> Result<Self>
    where
        F: FnOnce(QueryBuilder) -> Result<QueryBuilder>,
    {
        let query = callback(self.new_query())?;
        Ok(add_union(self, query.into(), all))
    }
}

impl UnionClauseBuilder for QueryBuilder {}

fn add_union<B: BuilderState>(mut builder: B, query: Subquery, all: bool) -> B {
    builder.state_mut().unions.push(Expr::Union(UnionFragment {
        query: NestedExpression::new(BindingType::Union, query),
        all,
    }));
    builder
}
