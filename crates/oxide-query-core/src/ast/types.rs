//! Small enums shared by the AST, the builder and the grammars.

use core::fmt;

/// The clause a bound value belongs to.
///
/// The declaration order is the canonical flattening order used by
/// [`Bindings::flatten`](crate::binding::Bindings::flatten). Inserted and
/// assigned values sit between the joins and the where clause, where their
/// placeholders appear in `INSERT` and `UPDATE` statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BindingType {
    Select,
    From,
    Join,
    Insert,
    Update,
    Where,
    GroupBy,
    Having,
    Order,
    Union,
    UnionOrder,
}

impl BindingType {
    /// Every binding type in flattening order.
    pub const ALL: [Self; 11] = [
        Self::Select,
        Self::From,
        Self::Join,
        Self::Insert,
        Self::Update,
        Self::Where,
        Self::GroupBy,
        Self::Having,
        Self::Order,
        Self::Union,
        Self::UnionOrder,
    ];

    /// Flattening order of an `UPDATE ... SET ... FROM ... JOIN` statement,
    /// where the assignments precede the joined tables.
    pub const UPDATE_FROM: [Self; 11] = [
        Self::Select,
        Self::From,
        Self::Insert,
        Self::Update,
        Self::Join,
        Self::Where,
        Self::GroupBy,
        Self::Having,
        Self::Order,
        Self::Union,
        Self::UnionOrder,
    ];

    /// Returns the clause name used as the key of raw bindings.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::From => "from",
            Self::Join => "join",
            Self::Where => "where",
            Self::GroupBy => "groupBy",
            Self::Having => "having",
            Self::Order => "order",
            Self::Union => "union",
            Self::UnionOrder => "unionOrder",
            Self::Insert => "insert",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for BindingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The combinator of a [`BinaryExpression`](super::BinaryExpression).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    /// Parses a conjunction name.
    ///
    /// `andX` and `orX` are reserved names with no implementation, so they
    /// are reported as unsupported rather than invalid.
    ///
    /// # Errors
    ///
    /// Returns an error for any name other than `and` or `or`.
    pub fn parse(name: &str) -> crate::Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "and" => Ok(Self::And),
            "or" => Ok(Self::Or),
            "andx" | "orx" => Err(crate::QueryError::unsupported(
                "builder",
                format!("the [{name}] conjunction"),
            )),
            _ => Err(crate::QueryError::InvalidArgument(format!(
                "unknown conjunction [{name}], expected 'and' or 'or'"
            ))),
        }
    }

    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Join types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Cross,
}

impl JoinType {
    /// Returns the SQL keyword(s) that introduce the join.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    /// Parses `asc`/`desc` in any case.
    ///
    /// # Errors
    ///
    /// Returns an error for any other direction.
    pub fn parse(direction: &str) -> crate::Result<Self> {
        match direction.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(crate::QueryError::InvalidArgument(String::from(
                "Order direction must be \"asc\" or \"desc\".",
            ))),
        }
    }

    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// JSON path leg operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonArrow {
    /// `->`: extract as JSON.
    Extract,
    /// `->>`: extract as unquoted text.
    ExtractText,
}

impl JsonArrow {
    /// Returns the operator text.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Extract => "->",
            Self::ExtractText => "->>",
        }
    }
}

/// Dialect-neutral function keys rewritten by each visitor's template table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionName {
    Date,
    Time,
    Day,
    Month,
    Year,
    JsonContains,
    JsonLength,
    JsonContainsKey,
    Random,
}

impl FunctionName {
    /// Returns the neutral name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::Time => "Time",
            Self::Day => "Day",
            Self::Month => "Month",
            Self::Year => "Year",
            Self::JsonContains => "JsonContains",
            Self::JsonLength => "JsonLength",
            Self::JsonContainsKey => "JsonContainsKey",
            Self::Random => "Random",
        }
    }

    /// Returns true for the date part functions.
    #[must_use]
    pub const fn is_date_part(&self) -> bool {
        matches!(
            self,
            Self::Date | Self::Time | Self::Day | Self::Month | Self::Year
        )
    }
}

/// Aggregate functions installed by the aggregate helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Count,
    Min,
    Max,
    Sum,
    Avg,
}

impl AggregateFunction {
    /// Returns the SQL function name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
        }
    }
}

/// Row locking requested with `lock_for_update`/`shared_lock`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lock {
    /// Exclusive lock.
    Update,
    /// Shared lock.
    Shared,
    /// Dialect-specific lock text rendered verbatim.
    Raw(String),
}

/// SELECT quantifier.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Distinct {
    #[default]
    All,
    Distinct,
    /// Postgres `DISTINCT ON (..)`; other dialects fall back to `DISTINCT`.
    On(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QueryError;

    #[test]
    fn test_binding_type_order() {
        assert!(BindingType::Select < BindingType::Join);
        assert!(BindingType::Join < BindingType::Where);
        assert!(BindingType::Having < BindingType::Order);
        assert!(BindingType::Order < BindingType::Union);
        assert_eq!(BindingType::ALL.len(), 11);
        assert_eq!(BindingType::GroupBy.to_string(), "groupBy");
    }

    #[test]
    fn test_conjunction_parse() {
        assert_eq!(Conjunction::parse("and").ok(), Some(Conjunction::And));
        assert_eq!(Conjunction::parse("OR").ok(), Some(Conjunction::Or));
        assert!(matches!(
            Conjunction::parse("andX"),
            Err(QueryError::Unsupported { .. })
        ));
        assert!(matches!(
            Conjunction::parse("orX"),
            Err(QueryError::Unsupported { .. })
        ));
        assert!(matches!(
            Conjunction::parse("xor"),
            Err(QueryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_order_direction_parse() {
        assert_eq!(OrderDirection::parse("DESC").ok(), Some(OrderDirection::Desc));
        assert!(OrderDirection::parse("up").is_err());
    }

    #[test]
    fn test_function_name_date_parts() {
        assert!(FunctionName::Year.is_date_part());
        assert!(!FunctionName::JsonLength.is_date_part());
        assert_eq!(FunctionName::JsonContains.as_str(), "JsonContains");
    }
}
