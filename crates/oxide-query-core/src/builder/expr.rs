//! Predicate helpers for `where_predicate`.
//!
//! ```rust
//! use oxide_query_core::builder::col;
//!
//! let predicate = col("active")
//!     .eq(true)
//!     .and(col("age").gt(18).or(col("verified").eq(true)).paren());
//! assert_eq!(predicate.binding_count(), 3);
//! ```

use super::value::{SqlValue, ToSqlValue};
use crate::ast::{
    BetweenPredicateExpression, BindingType, Conjunction, Expr, InPredicateExpression, InValues,
    NullPredicateExpression, PathExpression,
};

/// Creates a column reference. Dots split the table qualifier.
#[must_use]
pub fn col(name: &str) -> Column {
    Column {
        path: PathExpression::new(name.split('.')),
    }
}

/// A column reference.
#[derive(Debug, Clone)]
pub struct Column {
    path: PathExpression,
}

impl Column {
    /// Creates a qualified column reference.
    #[must_use]
    pub fn qualified(table: &str, name: &str) -> Self {
        Self {
            path: PathExpression::new([table, name]),
        }
    }

    fn expr(self) -> Expr {
        Expr::Path(self.path)
    }

    fn compare(self, operator: &str, value: SqlValue) -> Predicate {
        Predicate::Leaf(Expr::comparison(
            self.expr(),
            operator,
            Expr::binding(value, BindingType::Where),
        ))
    }

    /// Creates an equality predicate. `NULL` renders `IS NULL`.
    #[must_use]
    pub fn eq<T: ToSqlValue>(self, value: T) -> Predicate {
        self.compare("=", value.to_sql_value())
    }

    /// Creates an inequality predicate.
    #[must_use]
    pub fn not_eq<T: ToSqlValue>(self, value: T) -> Predicate {
        self.compare("!=", value.to_sql_value())
    }

    /// Creates a less-than predicate.
    #[must_use]
    pub fn lt<T: ToSqlValue>(self, value: T) -> Predicate {
        self.compare("<", value.to_sql_value())
    }

    /// Creates a less-than-or-equal predicate.
    #[must_use]
    pub fn lt_eq<T: ToSqlValue>(self, value: T) -> Predicate {
        self.compare("<=", value.to_sql_value())
    }

    /// Creates a greater-than predicate.
    #[must_use]
    pub fn gt<T: ToSqlValue>(self, value: T) -> Predicate {
        self.compare(">", value.to_sql_value())
    }

    /// Creates a greater-than-or-equal predicate.
    #[must_use]
    pub fn gt_eq<T: ToSqlValue>(self, value: T) -> Predicate {
        self.compare(">=", value.to_sql_value())
    }

    /// Compares with another column.
    #[must_use]
    pub fn eq_column(self, other: Self) -> Predicate {
        Predicate::Leaf(Expr::comparison(self.expr(), "=", other.expr()))
    }

    /// Creates an IS NULL predicate.
    #[must_use]
    pub fn is_null(self) -> Predicate {
        self.null(false)
    }

    /// Creates an IS NOT NULL predicate.
    #[must_use]
    pub fn is_not_null(self) -> Predicate {
        self.null(true)
    }

    fn null(self, negated: bool) -> Predicate {
        Predicate::Leaf(Expr::NullPredicate(NullPredicateExpression {
            expression: Box::new(self.expr()),
            negated,
        }))
    }

    /// Creates a LIKE predicate.
    #[must_use]
    pub fn like<T: ToSqlValue>(self, pattern: T) -> Predicate {
        self.compare("like", pattern.to_sql_value())
    }

    /// Creates a NOT LIKE predicate.
    #[must_use]
    pub fn not_like<T: ToSqlValue>(self, pattern: T) -> Predicate {
        self.compare("not like", pattern.to_sql_value())
    }

    /// Creates a BETWEEN predicate.
    #[must_use]
    pub fn between<T: ToSqlValue, U: ToSqlValue>(self, low: T, high: U) -> Predicate {
        self.between_impl(low.to_sql_value(), high.to_sql_value(), false)
    }

    /// Creates a NOT BETWEEN predicate.
    #[must_use]
    pub fn not_between<T: ToSqlValue, U: ToSqlValue>(self, low: T, high: U) -> Predicate {
        self.between_impl(low.to_sql_value(), high.to_sql_value(), true)
    }

    fn between_impl(self, low: SqlValue, high: SqlValue, negated: bool) -> Predicate {
        Predicate::Leaf(Expr::Between(BetweenPredicateExpression {
            expression: Box::new(self.expr()),
            low: Box::new(Expr::binding(low, BindingType::Where)),
            high: Box::new(Expr::binding(high, BindingType::Where)),
            negated,
        }))
    }

    /// Creates an IN predicate.
    #[must_use]
    pub fn in_list<T: ToSqlValue>(self, values: Vec<T>) -> Predicate {
        self.in_list_impl(values, false)
    }

    /// Creates a NOT IN predicate.
    #[must_use]
    pub fn not_in_list<T: ToSqlValue>(self, values: Vec<T>) -> Predicate {
        self.in_list_impl(values, true)
    }

    fn in_list_impl<T: ToSqlValue>(self, values: Vec<T>, negated: bool) -> Predicate {
        Predicate::Leaf(Expr::In(InPredicateExpression {
            expression: Box::new(self.expr()),
            values: InValues::List(
                values
                    .into_iter()
                    .map(|v| Expr::binding(v.to_sql_value(), BindingType::Where))
                    .collect(),
            ),
            negated,
        }))
    }
}

/// A predicate tree, lowered into AST nodes by `where_predicate`.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Leaf(Expr),
    Binary(Box<Self>, Conjunction, Box<Self>),
    Not(Box<Self>),
    Group(Box<Self>),
}

impl Predicate {
    /// Raw SQL with `?` placeholders.
    #[must_use]
    pub fn raw(sql: &str, bindings: Vec<SqlValue>) -> Self {
        Self::Leaf(Expr::raw_with_bindings(sql, bindings, BindingType::Where))
    }

    /// Creates an AND predicate.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::Binary(Box::new(self), Conjunction::And, Box::new(other))
    }

    /// Creates an OR predicate.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Binary(Box::new(self), Conjunction::Or, Box::new(other))
    }

    /// Wraps the predicate in parentheses.
    #[must_use]
    pub fn paren(self) -> Self {
        Self::Group(Box::new(self))
    }

    /// Negates the predicate with NOT.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Number of bound values in the tree.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        match self {
            Self::Leaf(expr) => count_bindings(expr),
            Self::Binary(left, _, right) => left.binding_count() + right.binding_count(),
            Self::Not(inner) | Self::Group(inner) => inner.binding_count(),
        }
    }
}

fn count_bindings(expr: &Expr) -> usize {
    match expr {
        Expr::Binding(_) => 1,
        Expr::RawBinding(raw) => raw.bindings.len(),
        Expr::Comparison(c) => count_bindings(&c.left) + count_bindings(&c.right),
        Expr::Between(b) => count_bindings(&b.low) + count_bindings(&b.high),
        Expr::In(i) => match &i.values {
            InValues::List(items) => items.iter().map(count_bindings).sum(),
            InValues::Query(_) => 0,
        },
        _ => 0,
    }
}

/// Re-tags the bound values of a leaf, for predicates added to a join.
pub(crate) fn retag(expr: Expr, kind: BindingType) -> Expr {
    match expr {
        Expr::Binding(mut b) => {
            b.kind = kind;
            Expr::Binding(b)
        }
        Expr::RawBinding(mut raw) => {
            for b in &mut raw.bindings {
                b.kind = kind;
            }
            Expr::RawBinding(raw)
        }
        Expr::Comparison(mut c) => {
            c.right = Box::new(retag(*c.right, kind));
            Expr::Comparison(c)
        }
        Expr::Between(mut b) => {
            b.low = Box::new(retag(*b.low, kind));
            b.high = Box::new(retag(*b.high, kind));
            Expr::Between(b)
        }
        Expr::In(mut i) => {
            if let InValues::List(items) = i.values {
                i.values = InValues::List(items.into_iter().map(|e| retag(e, kind)).collect());
            }
            Expr::In(i)
        }
        other => other,
    }
}
