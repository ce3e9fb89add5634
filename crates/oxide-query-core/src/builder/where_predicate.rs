//! Where clauses from prebuilt [`Predicate`] trees.

use super::expr::{retag, Predicate};
use super::where_clause::WhereClauseBuilder;
use super::{BuilderState, QueryBuilder};
use crate::ast::{BindingType, Conjunction, Expr, NestedPredicateExpression};

/// Adds predicates built with [`col`](super::col).
pub trait WherePredicateBuilder: WhereClauseBuilder {
    /// Folds `predicate` onto the where tree with AND.
    #[must_use]
    fn where_predicate(self, predicate: Predicate) -> Self {
        let node = lower(&self, predicate);
        self.add_where(node, Conjunction::And)
    }

    /// Folds `predicate` onto the where tree with OR.
    #[must_use]
    fn or_where_predicate(self, predicate: Predicate) -> Self {
        let node = lower(&self, predicate);
        self.add_where(node, Conjunction::Or)
    }
}

impl WherePredicateBuilder for QueryBuilder {}

fn lower<B: BuilderState>(builder: &B, predicate: Predicate) -> Expr {
    match predicate {
        Predicate::Leaf(expr) => match builder.where_binding() {
            BindingType::Where => expr,
            kind => retag(expr, kind),
        },
        Predicate::Binary(left, conjunction, right) => {
            Expr::binary(lower(builder, *left), conjunction, lower(builder, *right))
        }
        Predicate::Not(inner) => Expr::not(lower(builder, *inner)),
        Predicate::Group(inner) => {
            let mut query = builder.for_nested_where();
            let node = lower(builder, *inner);
            query.state_mut().wheres.push(node);
            Expr::NestedPredicate(NestedPredicateExpression {
                query: Box::new(query),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::builder::col;
    use crate::grammar::MySqlGrammar;

    #[test]
    fn test_group_lowers_to_nested_predicate() {
        let q = QueryBuilder::new(Arc::new(MySqlGrammar::new())).where_predicate(
            col("a")
                .eq(1)
                .and(col("b").eq(2).or(col("c").eq(3)).paren()),
        );
        let Expr::Binary(binary) = &q.state().wheres[0] else {
            panic!("Expected binary");
        };
        assert!(matches!(*binary.right, Expr::NestedPredicate(_)));
    }
}
