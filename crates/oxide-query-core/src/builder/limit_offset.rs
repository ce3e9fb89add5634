//! Limit, offset and pagination.

use super::value::ToSqlValue;
use super::where_clause::WhereClauseBuilder;
use super::{parse_column, QueryBuilder};
use crate::ast::{Expr, OrderByElement, OrderDirection, RejectOrderElementExpression};
use crate::error::Result;

/// Limit and offset clauses.
pub trait LimitOffsetClauseBuilder: WhereClauseBuilder {
    /// Caps the number of rows. Applies to the union result once the query
    /// has unions.
    #[must_use]
    fn limit(mut self, value: usize) -> Self {
        let state = self.state_mut();
        if state.unions.is_empty() {
            state.limit = Some(value);
        } else {
            state.union_limit = Some(value);
        }
        self
    }

    /// Alias of [`limit`](Self::limit).
    #[must_use]
    fn take(self, value: usize) -> Self {
        self.limit(value)
    }

    /// Skips rows.
    #[must_use]
    fn offset(mut self, value: usize) -> Self {
        let state = self.state_mut();
        if state.unions.is_empty() {
            state.offset = Some(value);
        } else {
            state.union_offset = Some(value);
        }
        self
    }

    /// Alias of [`offset`](Self::offset).
    #[must_use]
    fn skip(self, value: usize) -> Self {
        self.offset(value)
    }

    /// Page `page` (1-based) of `per_page` rows.
    #[must_use]
    fn for_page(self, page: usize, per_page: usize) -> Self {
        self.offset(page.saturating_sub(1).saturating_mul(per_page))
            .limit(per_page)
    }

    /// `per_page` rows before `last_id`, newest first on `column`.
    ///
    /// Earlier order entries on `column` are filtered out at render time.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn for_page_before_id(
        self,
        per_page: usize,
        last_id: Option<impl ToSqlValue>,
        column: &str,
    ) -> Result<Self> {
        page_by_id(self, per_page, last_id, column, "<", OrderDirection::Desc)
    }

    /// `per_page` rows after `last_id`, oldest first on `column`.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed column.
    fn for_page_after_id(
        self,
        per_page: usize,
        last_id: Option<impl ToSqlValue>,
        column: &str,
    ) -> Result<Self> {
        page_by_id(self, per_page, last_id, column, ">", OrderDirection::Asc)
    }
}

impl LimitOffsetClauseBuilder for QueryBuilder {}

fn page_by_id<B: LimitOffsetClauseBuilder>(
    builder: B,
    per_page: usize,
    last_id: Option<impl ToSqlValue>,
    column: &str,
    operator: &str,
    direction: OrderDirection,
) -> Result<B> {
    let mut builder = match last_id {
        Some(id) => builder.where_(column, operator, id)?,
        None => builder,
    };
    let order = Expr::OrderElement(OrderByElement {
        expression: Box::new(parse_column(column)?),
        direction,
    });
    let state = builder.state_mut();
    let previous = std::mem::take(&mut state.orders);
    if !previous.is_empty() {
        state.orders.push(Expr::RejectOrderElement(RejectOrderElementExpression {
            columns: vec![String::from(column)],
            orders: previous,
        }));
    }
    state.orders.push(order);
    Ok(builder.limit(per_page))
}
