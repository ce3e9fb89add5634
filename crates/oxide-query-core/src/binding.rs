//! Binding accumulation and compiled query output.

use std::collections::BTreeMap;

use crate::ast::BindingType;
use crate::builder::value::SqlValue;

/// Values collected while rendering, keyed by clause type.
///
/// Two views are kept. The per-type map is what `get_raw_bindings` exposes;
/// the traversal-ordered list is what a driver receives, and it lines up with
/// the placeholders in the SQL text (including Postgres `$N` numbering).
#[derive(Debug, Clone, PartialEq)]
pub struct Bindings {
    by_type: BTreeMap<BindingType, Vec<SqlValue>>,
    ordered: Vec<SqlValue>,
    clause_order: &'static [BindingType],
}

impl Default for Bindings {
    fn default() -> Self {
        Self {
            by_type: BTreeMap::new(),
            ordered: Vec::new(),
            clause_order: &BindingType::ALL,
        }
    }
}

impl Bindings {
    /// Creates an empty binding set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the clause order [`flatten`](Self::flatten) follows, for
    /// statements that place clauses differently from a SELECT.
    pub fn set_clause_order(&mut self, order: &'static [BindingType]) {
        self.clause_order = order;
    }

    /// Appends a value under the given clause type.
    pub fn push(&mut self, kind: BindingType, value: SqlValue) {
        self.ordered.push(value.clone());
        self.by_type.entry(kind).or_default().push(value);
    }

    /// Appends every value of a nested query under a single clause type,
    /// keeping the nested traversal order.
    pub fn merge(&mut self, kind: BindingType, nested: Self) {
        let entry = self.by_type.entry(kind).or_default();
        entry.extend(nested.ordered.iter().cloned());
        self.ordered.extend(nested.ordered);
    }

    /// Appends another binding set, keeping its clause types.
    pub fn extend(&mut self, other: Self) {
        for (kind, values) in other.by_type {
            self.by_type.entry(kind).or_default().extend(values);
        }
        self.ordered.extend(other.ordered);
    }

    /// Returns the values of one clause type.
    #[must_use]
    pub fn get(&self, kind: BindingType) -> &[SqlValue] {
        self.by_type.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Returns the values in traversal order.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.ordered
    }

    /// Returns the values concatenated in clause order.
    #[must_use]
    pub fn flatten(&self) -> Vec<SqlValue> {
        self.clause_order
            .iter()
            .flat_map(|kind| self.get(*kind).iter().cloned())
            .collect()
    }

    /// Returns the per-type map keyed by clause name.
    #[must_use]
    pub fn raw(&self) -> BTreeMap<&'static str, Vec<SqlValue>> {
        self.by_type
            .iter()
            .map(|(kind, values)| (kind.as_str(), values.clone()))
            .collect()
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Returns true if no value was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Drops every value.
    pub fn clear(&mut self) {
        self.by_type.clear();
        self.ordered.clear();
        self.clause_order = &BindingType::ALL;
    }
}

/// SQL text plus the bindings its placeholders refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub bindings: Bindings,
}

impl CompiledQuery {
    /// Creates a compiled query.
    #[must_use]
    pub const fn new(sql: String, bindings: Bindings) -> Self {
        Self { sql, bindings }
    }

    /// Values in placeholder order.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        self.bindings.values()
    }

    /// Returns the SQL with every placeholder replaced by its inlined value.
    ///
    /// Meant for logs and debugging only; execute `sql` with `values()`.
    #[must_use]
    pub fn to_raw_sql(&self) -> String {
        let values = self.values();
        let mut out = String::with_capacity(self.sql.len());
        let mut chars = self.sql.chars().peekable();
        let mut next = 0;
        let mut quote: Option<char> = None;

        while let Some(c) = chars.next() {
            match (quote, c) {
                (Some(q), _) if c == q => {
                    quote = None;
                    out.push(c);
                }
                (Some(_), _) => out.push(c),
                (None, '\'' | '"' | '`') => {
                    quote = Some(c);
                    out.push(c);
                }
                (None, '?') => {
                    match values.get(next) {
                        Some(value) => out.push_str(&value.to_sql_inline()),
                        None => out.push('?'),
                    }
                    next += 1;
                }
                (None, '$') if chars.peek().is_some_and(char::is_ascii_digit) => {
                    let mut digits = String::new();
                    while let Some(d) = chars.next_if(char::is_ascii_digit) {
                        digits.push(d);
                    }
                    let index = digits.parse::<usize>().ok().and_then(|n| n.checked_sub(1));
                    match index.and_then(|i| values.get(i)) {
                        Some(value) => out.push_str(&value.to_sql_inline()),
                        None => {
                            out.push('$');
                            out.push_str(&digits);
                        }
                    }
                }
                (None, _) => out.push(c),
            }
        }
        out
    }
}
