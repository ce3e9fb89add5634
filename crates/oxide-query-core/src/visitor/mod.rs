//! SQL renderers.
//!
//! A visitor walks one [`Statement`] depth first and returns the SQL text.
//! Every [`BindingVariable`] it meets is drained into [`VisitState::bindings`]
//! and replaced by a placeholder, so the binding list always follows the
//! placeholder order of the text.
//!
//! [`QueryVisitor`] carries the MySQL-shaped rendering of every node. The
//! dialect visitors override the hooks: quoting, placeholders, the function
//! template table, JSON paths, locking and pagination.

mod mysql;
mod postgres;
mod sqlite;
mod sqlserver;

pub use mysql::MySqlVisitor;
pub use postgres::PostgresVisitor;
pub use sqlite::SqliteVisitor;
pub use sqlserver::SqlServerVisitor;

use crate::ast::{
    AggregateFunctionCallFragment, BetweenPredicateExpression, BinaryUnionQueryExpression,
    BindingType, BindingVariable, ComparisonPredicateExpression, ConflictClause,
    DeleteSpecification, Distinct, Expr, FromClause, FunctionCallExpression, FunctionName,
    InPredicateExpression, InValues, InsertSource, InsertSpecification, InsertVerb, JoinFragment,
    JsonLeg, JsonPathExpression, LimitClause, Lock, MergeSpecification, NestedExpression,
    NestedPredicateExpression, OffsetClause, OrderByClause, PathExpression, QuerySpecification,
    SelectClause, Statement, Subquery, TruncateSpecification, UpdateSpecification,
};
use crate::binding::Bindings;
use crate::builder::BuilderState;
use crate::error::{QueryError, Result};
use crate::grammar::{CompileContext, Grammar};

/// Mutable state shared by one visitor run.
pub struct VisitState<'a> {
    /// Grammar nested queries are compiled with.
    pub grammar: &'a dyn Grammar,
    /// Placeholder offset, alias counter and visited set of the compilation.
    pub ctx: &'a mut CompileContext,
    /// Values drained so far.
    pub bindings: Bindings,
}

impl<'a> VisitState<'a> {
    /// Creates the state for a fresh visitor.
    #[must_use]
    pub fn new(grammar: &'a dyn Grammar, ctx: &'a mut CompileContext) -> Self {
        Self {
            grammar,
            ctx,
            bindings: Bindings::new(),
        }
    }
}

impl std::fmt::Debug for VisitState<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisitState")
            .field("grammar", &self.grammar.name())
            .field("ctx", &self.ctx)
            .field("bindings", &self.bindings)
            .finish()
    }
}

/// Renders statements and expressions to SQL.
pub trait QueryVisitor<'a> {
    /// Shared state of this run.
    fn state(&mut self) -> &mut VisitState<'a>;

    /// Quotes one identifier segment.
    fn quote_identifier(&self, name: &str) -> String;

    /// Emits the placeholder of the binding just drained.
    fn placeholder(&mut self) -> String {
        String::from("?")
    }

    /// Template of a dialect-neutral function; `{0}` is the first argument.
    fn function_template(&self, name: FunctionName) -> Option<&'static str>;

    /// Renders the JSON predicate functions. `value` is the already rendered
    /// second argument, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the dialect has no rendering for `name`.
    fn compile_json_function(
        &mut self,
        name: FunctionName,
        column: &Expr,
        value: Option<String>,
    ) -> Result<String>;

    /// Renders `column->key` style paths.
    ///
    /// # Errors
    ///
    /// Returns an error if a segment cannot be rendered.
    fn visit_json_path(&mut self, json: &JsonPathExpression) -> Result<String>;

    /// Text appended after the statement for a lock.
    fn lock_suffix(&self, _lock: &Lock) -> Option<String> {
        None
    }

    /// Text appended after the FROM table for a lock.
    fn table_hint(&self, _lock: &Lock) -> Option<String> {
        None
    }

    /// Row count rendered as `TOP n` in the select list.
    fn top_rows(&self, _limit: Option<LimitClause>, _offset: Option<OffsetClause>) -> Option<usize> {
        None
    }

    /// Wraps one side of a UNION.
    fn union_wrap(&mut self, sql: &str) -> String {
        format!("({sql})")
    }

    /// Renders raw SQL text.
    fn visit_raw_text(&mut self, sql: &str) -> String {
        String::from(sql)
    }

    /// Wraps the placeholder compared with a date part function.
    fn wrap_date_binding(&self, placeholder: String) -> String {
        placeholder
    }

    /// Body of an INSERT without columns.
    fn empty_insert(&self) -> &'static str {
        "DEFAULT VALUES"
    }

    /// Renders the SELECT quantifier, with its trailing space.
    ///
    /// # Errors
    ///
    /// Returns an error if a `DISTINCT ON` column is malformed.
    fn visit_distinct(&mut self, distinct: &Distinct) -> Result<String> {
        Ok(match distinct {
            Distinct::All => String::new(),
            Distinct::Distinct | Distinct::On(_) => String::from("DISTINCT "),
        })
    }

    /// Trailing `ORDER BY`, `LIMIT` and `OFFSET` parts.
    ///
    /// # Errors
    ///
    /// Returns an error if an order entry fails to render.
    fn visit_pagination(
        &mut self,
        order_by: Option<&OrderByClause>,
        limit: Option<LimitClause>,
        offset: Option<OffsetClause>,
        _top_applied: bool,
    ) -> Result<Vec<String>> {
        let mut parts = Vec::new();
        if let Some(order) = order_by {
            if let Some(sql) = self.visit_order_by(order)? {
                parts.push(format!("ORDER BY {sql}"));
            }
        }
        if let Some(limit) = limit {
            parts.push(format!("LIMIT {}", limit.value));
        }
        if let Some(offset) = offset {
            parts.push(format!("OFFSET {}", offset.value));
        }
        Ok(parts)
    }

    /// Renders a `MERGE`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Unsupported`] unless the dialect has MERGE.
    fn visit_merge(&mut self, _merge: &MergeSpecification) -> Result<String> {
        let grammar = self.grammar();
        Err(QueryError::unsupported(grammar.name(), "MERGE statements"))
    }

    /// Renders a TRUNCATE.
    ///
    /// # Errors
    ///
    /// Returns an error if the table fails to render.
    fn visit_truncate(&mut self, truncate: &TruncateSpecification) -> Result<String> {
        Ok(format!("TRUNCATE TABLE {}", self.visit_expr(&truncate.table)?))
    }

    /// Grammar of this run.
    fn grammar(&mut self) -> &'a dyn Grammar {
        self.state().grammar
    }

    /// Quotes a table name or alias, applying the table prefix.
    fn quote_table(&mut self, name: &str) -> String {
        let prefix = self.grammar().table_prefix();
        self.quote_identifier(&format!("{prefix}{name}"))
    }

    /// Quotes a column path; the table segment of a qualified path gets the
    /// table prefix.
    fn quote_path(&mut self, path: &PathExpression) -> String {
        let qualified = path.segments.len() > 1;
        let mut out = Vec::with_capacity(path.segments.len());
        for (index, segment) in path.segments.iter().enumerate() {
            if segment.is_wildcard() {
                out.push(String::from("*"));
            } else if index == 0 && qualified {
                out.push(self.quote_table(&segment.name));
            } else {
                out.push(self.quote_identifier(&segment.name));
            }
        }
        out.join(".")
    }

    /// Quotes a table path; the last segment gets the table prefix.
    fn quote_table_path(&mut self, path: &PathExpression) -> String {
        let last = path.segments.len().saturating_sub(1);
        let mut out = Vec::with_capacity(path.segments.len());
        for (index, segment) in path.segments.iter().enumerate() {
            if index == last {
                out.push(self.quote_table(&segment.name));
            } else {
                out.push(self.quote_identifier(&segment.name));
            }
        }
        out.join(".")
    }

    /// Splits a JSON column into its quoted field and a `, '$.path'` suffix.
    ///
    /// # Errors
    ///
    /// Returns an error if a non-path column fails to render.
    fn json_field_and_path(&mut self, column: &Expr) -> Result<(String, String)> {
        match column {
            Expr::JsonPath(json) => {
                let field = self.quote_path(&json.column);
                Ok((field, format!(", '{}'", json.json_path())))
            }
            other => Ok((self.visit_expr(other)?, String::new())),
        }
    }

    /// Drains a binding and returns its placeholder.
    fn bind(&mut self, binding: &BindingVariable) -> String {
        self.state()
            .bindings
            .push(binding.kind, binding.value.clone());
        self.placeholder()
    }

    /// Renders any expression node.
    ///
    /// # Errors
    ///
    /// Returns an error if a node cannot be rendered by this dialect.
    fn visit_expr(&mut self, expr: &Expr) -> Result<String> {
        match expr {
            Expr::Identifier(ident) => Ok(if ident.is_wildcard() {
                String::from("*")
            } else {
                self.quote_identifier(&ident.name)
            }),
            Expr::Path(path) => Ok(self.quote_path(path)),
            Expr::TableName(table) => Ok(self.quote_table_path(&table.path)),
            Expr::JsonPath(json) => self.visit_json_path(json),
            Expr::ColumnReference(column) => {
                let sql = self.visit_expr(&column.expression)?;
                Ok(match &column.alias {
                    Some(alias) => format!("{sql} AS {}", self.quote_identifier(alias)),
                    None => sql,
                })
            }
            Expr::TableReference(table) => {
                let sql = self.visit_expr(&table.table)?;
                Ok(match &table.alias {
                    Some(alias) => format!("{sql} AS {}", self.quote_table(alias)),
                    None => sql,
                })
            }
            Expr::Raw(raw) => Ok(self.visit_raw_text(&raw.sql)),
            Expr::RawBinding(raw) => {
                let state = self.state();
                for binding in &raw.bindings {
                    state.bindings.push(binding.kind, binding.value.clone());
                }
                Ok(self.visit_raw_text(&raw.raw.sql))
            }
            Expr::Binding(binding) => Ok(self.bind(binding)),
            Expr::NumberLiteral(n) => Ok(format!("{n}")),
            Expr::StringLiteral(s) => Ok(format!("'{}'", s.replace('\'', "''"))),
            Expr::Comparison(comparison) => self.visit_comparison(comparison),
            Expr::Between(between) => self.visit_between(between),
            Expr::In(predicate) => self.visit_in(predicate),
            Expr::NullPredicate(null) => {
                let sql = self.visit_expr(&null.expression)?;
                let not = if null.negated { "NOT " } else { "" };
                Ok(format!("{sql} IS {not}NULL"))
            }
            Expr::Exists(exists) => {
                let sql = self.visit_nested(&exists.query)?;
                let not = if exists.negated { "NOT " } else { "" };
                Ok(format!("{not}EXISTS {sql}"))
            }
            Expr::Not(not) => Ok(format!("NOT {}", self.visit_expr(&not.expression)?)),
            Expr::Binary(binary) => {
                let left = self.visit_expr(&binary.left)?;
                let right = self.visit_expr(&binary.right)?;
                Ok(format!("{left} {} {right}", binary.conjunction.as_str()))
            }
            Expr::NestedPredicate(nested) => self.visit_nested_predicate(nested),
            Expr::Join(join) => self.visit_join(join),
            Expr::Union(union) => {
                let sql = self.compile_nested(&union.query)?;
                let keyword = if union.all { "UNION ALL" } else { "UNION" };
                Ok(format!("{keyword} {}", self.union_wrap(&sql)))
            }
            Expr::AggregateFunctionCall(aggregate) => self.visit_aggregate(aggregate),
            Expr::Nested(nested) => self.visit_nested(nested),
            Expr::RejectOrderElement(reject) => {
                let mut parts = Vec::new();
                for order in &reject.orders {
                    let keep = order
                        .column_name()
                        .is_none_or(|name| !reject.columns.contains(&name));
                    if keep {
                        let sql = self.visit_expr(order)?;
                        if !sql.is_empty() {
                            parts.push(sql);
                        }
                    }
                }
                Ok(parts.join(", "))
            }
            Expr::FunctionCall(call) => self.visit_function_call(call),
            Expr::OrderElement(order) => {
                let sql = self.visit_expr(&order.expression)?;
                Ok(format!("{sql} {}", order.direction.as_str()))
            }
            Expr::Assignment(assignment) => {
                let column = self.visit_expr(&assignment.column)?;
                let value = self.visit_expr(&assignment.value)?;
                Ok(format!("{column} = {value}"))
            }
            Expr::Arithmetic(arithmetic) => {
                let left = self.visit_expr(&arithmetic.left)?;
                let right = self.visit_expr(&arithmetic.right)?;
                Ok(format!("{left} {} {right}", arithmetic.operator))
            }
        }
    }

    /// `left OP right`, with the `IS [NOT] NULL` rewrite for NULL bindings.
    ///
    /// # Errors
    ///
    /// Returns an error if a side fails to render.
    fn visit_comparison(&mut self, comparison: &ComparisonPredicateExpression) -> Result<String> {
        let left = self.visit_expr(&comparison.left)?;
        let operator = comparison.operator.as_str();
        let date_part = matches!(
            &*comparison.left,
            Expr::FunctionCall(call) if call.name.is_date_part()
        );
        match &*comparison.right {
            Expr::Binding(binding) if binding.value.is_null() && operator == "=" => {
                Ok(format!("{left} IS NULL"))
            }
            Expr::Binding(binding) if binding.value.is_null() && matches!(operator, "!=" | "<>") => {
                Ok(format!("{left} IS NOT NULL"))
            }
            Expr::Binding(binding) if date_part => {
                let placeholder = self.bind(binding);
                let right = self.wrap_date_binding(placeholder);
                Ok(format!("{left} {} {right}", operator.to_ascii_uppercase()))
            }
            right => {
                let right = self.visit_expr(right)?;
                Ok(format!("{left} {} {right}", operator.to_ascii_uppercase()))
            }
        }
    }

    /// `expr [NOT] BETWEEN low AND high`.
    ///
    /// # Errors
    ///
    /// Returns an error if an operand fails to render.
    fn visit_between(&mut self, between: &BetweenPredicateExpression) -> Result<String> {
        let expression = self.visit_expr(&between.expression)?;
        let low = self.visit_expr(&between.low)?;
        let high = self.visit_expr(&between.high)?;
        let not = if between.negated { "NOT " } else { "" };
        Ok(format!("{expression} {not}BETWEEN {low} AND {high}"))
    }

    /// `expr [NOT] IN (...)`; an empty list is constant false (true when
    /// negated).
    ///
    /// # Errors
    ///
    /// Returns an error if an operand fails to render.
    fn visit_in(&mut self, predicate: &InPredicateExpression) -> Result<String> {
        let not = if predicate.negated { "NOT " } else { "" };
        match &predicate.values {
            InValues::List(values) if values.is_empty() => Ok(String::from(if predicate.negated {
                "1 = 1"
            } else {
                "0 = 1"
            })),
            InValues::List(values) => {
                let expression = self.visit_expr(&predicate.expression)?;
                let values = values
                    .iter()
                    .map(|v| self.visit_expr(v))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("{expression} {not}IN ({})", values.join(", ")))
            }
            InValues::Query(query) => {
                let expression = self.visit_expr(&predicate.expression)?;
                let sql = self.visit_nested(query)?;
                Ok(format!("{expression} {not}IN {sql}"))
            }
        }
    }

    /// Renders a parenthesized where group. Each group may be visited once
    /// per compilation.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::AlreadyVisited`] on a second visit.
    fn visit_nested_predicate(&mut self, nested: &NestedPredicateExpression) -> Result<String> {
        let address = std::ptr::from_ref(nested.query.as_ref()) as usize;
        self.state().ctx.mark_visited(address)?;
        let parts = nested
            .query
            .state()
            .wheres
            .iter()
            .map(|w| self.visit_expr(w))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("({})", parts.join(" AND ")))
    }

    /// `TYPE JOIN table [ON ...]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the table or condition fails to render.
    fn visit_join(&mut self, join: &JoinFragment) -> Result<String> {
        let table = self.visit_expr(&join.table)?;
        Ok(match &join.on {
            Some(on) => format!("{} {table} ON {}", join.join_type.as_str(), self.visit_expr(on)?),
            None => format!("{} {table}", join.join_type.as_str()),
        })
    }

    /// `FN([DISTINCT] columns) AS aggregate`.
    ///
    /// # Errors
    ///
    /// Returns an error if a column fails to render.
    fn visit_aggregate(&mut self, aggregate: &AggregateFunctionCallFragment) -> Result<String> {
        let columns = if aggregate.columns.is_empty() {
            String::from("*")
        } else {
            aggregate
                .columns
                .iter()
                .map(|c| self.visit_expr(c))
                .collect::<Result<Vec<_>>>()?
                .join(", ")
        };
        let distinct = if aggregate.distinct { "DISTINCT " } else { "" };
        Ok(format!(
            "{}({distinct}{columns}) AS aggregate",
            aggregate.function.as_str()
        ))
    }

    /// Dialect-neutral function call through the template table.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Unsupported`] if the dialect has no template.
    fn visit_function_call(&mut self, call: &FunctionCallExpression) -> Result<String> {
        match call.name {
            FunctionName::JsonContains | FunctionName::JsonLength | FunctionName::JsonContainsKey => {
                let column = call.args.first().ok_or_else(|| {
                    QueryError::InvalidArgument(format!("{} needs a column", call.name.as_str()))
                })?;
                let value = match call.args.get(1) {
                    Some(value) => Some(self.visit_expr(value)?),
                    None => None,
                };
                self.compile_json_function(call.name, column, value)
            }
            name => {
                let Some(template) = self.function_template(name) else {
                    let grammar = self.grammar();
                    return Err(QueryError::unsupported(
                        grammar.name(),
                        format!("the {} function", name.as_str()),
                    ));
                };
                let first = match call.args.first() {
                    Some(arg) => self.visit_expr(arg)?,
                    None => String::new(),
                };
                Ok(template.replace("{0}", &first))
            }
        }
    }

    /// `(subquery)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the subquery fails to compile.
    fn visit_nested(&mut self, nested: &NestedExpression) -> Result<String> {
        Ok(format!("({})", self.compile_nested(nested)?))
    }

    /// Compiles a subquery with the same grammar and context, merging its
    /// bindings under the nested node's type. Returns the bare SQL.
    ///
    /// # Errors
    ///
    /// Returns an error if the subquery fails to compile.
    fn compile_nested(&mut self, nested: &NestedExpression) -> Result<String> {
        match &nested.query {
            Subquery::Builder(query) => {
                let state = self.state();
                let grammar = state.grammar;
                let statement = grammar.select_statement(query)?;
                let (sql, bindings) = {
                    let mut inner = grammar.visitor(state.ctx);
                    let sql = inner.visit_statement(&statement)?;
                    (sql, std::mem::take(&mut inner.state().bindings))
                };
                let state = self.state();
                state.bindings.merge(nested.kind, bindings);
                state.ctx.retain(statement);
                Ok(sql)
            }
            Subquery::Raw { sql, bindings } => {
                let state = self.state();
                for value in bindings {
                    state.bindings.push(nested.kind, value.clone());
                }
                Ok(self.visit_raw_text(sql))
            }
        }
    }

    /// `SELECT [DISTINCT] [TOP n] columns`.
    ///
    /// # Errors
    ///
    /// Returns an error if a column fails to render.
    fn visit_select_clause(&mut self, select: &SelectClause, top: Option<usize>) -> Result<String> {
        let distinct = self.visit_distinct(&select.distinct)?;
        let top = top.map(|n| format!("TOP {n} ")).unwrap_or_default();
        let columns = select
            .columns
            .iter()
            .map(|c| self.visit_expr(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("SELECT {distinct}{top}{}", columns.join(", ")))
    }

    /// `table [hint] joins`.
    ///
    /// # Errors
    ///
    /// Returns an error if the table or a join fails to render.
    fn visit_from_clause(&mut self, from: &FromClause, lock: Option<&Lock>) -> Result<String> {
        let mut parts = vec![self.visit_expr(&from.table)?];
        if let Some(hint) = lock.and_then(|lock| self.table_hint(lock)) {
            parts.push(hint);
        }
        for join in &from.joins {
            parts.push(self.visit_expr(join)?);
        }
        Ok(parts.join(" "))
    }

    /// Order entries joined with commas; `None` when every entry was
    /// filtered out.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry fails to render.
    fn visit_order_by(&mut self, order: &OrderByClause) -> Result<Option<String>> {
        let mut parts = Vec::new();
        for element in &order.elements {
            let sql = self.visit_expr(element)?;
            if !sql.is_empty() {
                parts.push(sql);
            }
        }
        Ok((!parts.is_empty()).then(|| parts.join(", ")))
    }

    /// Renders one SELECT.
    ///
    /// # Errors
    ///
    /// Returns an error if a clause fails to render.
    fn visit_query_specification(&mut self, node: &QuerySpecification) -> Result<String> {
        let top = self.top_rows(node.limit, node.offset);
        let mut parts = vec![self.visit_select_clause(&node.select, top)?];
        if let Some(from) = &node.from {
            parts.push(format!(
                "FROM {}",
                self.visit_from_clause(from, node.lock.as_ref().map(|l| &l.lock))?
            ));
        }
        if let Some(where_clause) = &node.where_clause {
            parts.push(format!("WHERE {}", self.visit_expr(&where_clause.condition)?));
        }
        if let Some(group_by) = &node.group_by {
            let columns = group_by
                .columns
                .iter()
                .map(|c| self.visit_expr(c))
                .collect::<Result<Vec<_>>>()?;
            parts.push(format!("GROUP BY {}", columns.join(", ")));
        }
        if let Some(having) = &node.having {
            parts.push(format!("HAVING {}", self.visit_expr(&having.condition)?));
        }
        parts.extend(self.visit_pagination(
            node.order_by.as_ref(),
            node.limit,
            node.offset,
            top.is_some(),
        )?);
        if let Some(suffix) = node.lock.as_ref().and_then(|l| self.lock_suffix(&l.lock)) {
            parts.push(suffix);
        }
        Ok(parts.join(" "))
    }

    /// `left UNION [ALL] right` plus the union's trailing clauses.
    ///
    /// # Errors
    ///
    /// Returns an error if a side fails to render.
    fn visit_union(&mut self, union: &BinaryUnionQueryExpression) -> Result<String> {
        let left = match &*union.left {
            Statement::Union(inner) => self.visit_union(inner)?,
            other => {
                let sql = self.visit_statement(other)?;
                self.union_wrap(&sql)
            }
        };
        let right = self.compile_nested(&union.right)?;
        let keyword = if union.all { "UNION ALL" } else { "UNION" };
        let mut parts = vec![left, String::from(keyword), self.union_wrap(&right)];
        parts.extend(self.visit_pagination(
            union.order_by.as_ref(),
            union.limit,
            union.offset,
            false,
        )?);
        Ok(parts.join(" "))
    }

    /// Renders an INSERT.
    ///
    /// # Errors
    ///
    /// Returns an error if a part fails to render.
    fn visit_insert(&mut self, insert: &InsertSpecification) -> Result<String> {
        let verb = match insert.verb {
            InsertVerb::Insert => "INSERT",
            InsertVerb::InsertIgnore => "INSERT IGNORE",
            InsertVerb::InsertOrIgnore => "INSERT OR IGNORE",
        };
        let table = self.visit_expr(&insert.table)?;
        let columns = insert
            .columns
            .iter()
            .map(|c| self.visit_expr(c))
            .collect::<Result<Vec<_>>>()?;
        let mut parts = vec![format!("{verb} INTO {table}")];
        match &insert.source {
            InsertSource::DefaultValues => parts.push(String::from(self.empty_insert())),
            InsertSource::Values(rows) => {
                parts.push(format!("({})", columns.join(", ")));
                let mut tuples = Vec::with_capacity(rows.len());
                for row in rows {
                    let values = row
                        .iter()
                        .map(|v| self.visit_expr(v))
                        .collect::<Result<Vec<_>>>()?;
                    tuples.push(format!("({})", values.join(", ")));
                }
                parts.push(format!("VALUES {}", tuples.join(", ")));
            }
            InsertSource::Query(query) => {
                if !columns.is_empty() {
                    parts.push(format!("({})", columns.join(", ")));
                }
                parts.push(self.compile_nested(query)?);
            }
        }
        if let Some(conflict) = &insert.conflict {
            parts.push(self.visit_conflict(conflict));
        }
        if !insert.returning.is_empty() {
            let returning = insert
                .returning
                .iter()
                .map(|c| self.visit_expr(c))
                .collect::<Result<Vec<_>>>()?;
            parts.push(format!("RETURNING {}", returning.join(", ")));
        }
        Ok(parts.join(" "))
    }

    /// Conflict handling of an INSERT.
    fn visit_conflict(&mut self, conflict: &ConflictClause) -> String {
        match conflict {
            ConflictClause::DoNothing => String::from("ON CONFLICT DO NOTHING"),
            ConflictClause::DoUpdate { unique_by, update } => {
                let unique = unique_by
                    .iter()
                    .map(|c| self.quote_identifier(c))
                    .collect::<Vec<_>>()
                    .join(", ");
                let excluded = self.quote_identifier("excluded");
                let set = update
                    .iter()
                    .map(|c| {
                        let column = self.quote_identifier(c);
                        format!("{column} = {excluded}.{column}")
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("ON CONFLICT ({unique}) DO UPDATE SET {set}")
            }
            ConflictClause::DuplicateKeyUpdate { update } => {
                let set = update
                    .iter()
                    .map(|c| {
                        let column = self.quote_identifier(c);
                        format!("{column} = VALUES({column})")
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("ON DUPLICATE KEY UPDATE {set}")
            }
        }
    }

    /// Renders an UPDATE.
    ///
    /// # Errors
    ///
    /// Returns an error if a part fails to render.
    fn visit_update(&mut self, update: &UpdateSpecification) -> Result<String> {
        let mut parts = vec![String::from("UPDATE")];
        if let Some(top) = update.top {
            parts.push(format!("TOP ({top})"));
        }
        parts.push(self.visit_expr(&update.target)?);
        for join in &update.joins {
            parts.push(self.visit_expr(join)?);
        }
        let assignments = update
            .assignments
            .iter()
            .map(|a| self.visit_expr(a))
            .collect::<Result<Vec<_>>>()?;
        parts.push(format!("SET {}", assignments.join(", ")));
        if let Some(from) = &update.from {
            self.state().bindings.set_clause_order(&BindingType::UPDATE_FROM);
            parts.push(format!("FROM {}", self.visit_from_clause(from, None)?));
        }
        if let Some(where_clause) = &update.where_clause {
            parts.push(format!("WHERE {}", self.visit_expr(&where_clause.condition)?));
        }
        if let Some(order) = &update.order_by {
            if let Some(sql) = self.visit_order_by(order)? {
                parts.push(format!("ORDER BY {sql}"));
            }
        }
        if let Some(limit) = update.limit {
            parts.push(format!("LIMIT {}", limit.value));
        }
        Ok(parts.join(" "))
    }

    /// Renders a DELETE.
    ///
    /// # Errors
    ///
    /// Returns an error if a part fails to render.
    fn visit_delete(&mut self, delete: &DeleteSpecification) -> Result<String> {
        let mut parts = vec![String::from("DELETE")];
        if let Some(top) = delete.top {
            parts.push(format!("TOP ({top})"));
        }
        if let Some(target) = &delete.target {
            parts.push(self.visit_expr(target)?);
        }
        parts.push(format!("FROM {}", self.visit_from_clause(&delete.from, None)?));
        if let Some(where_clause) = &delete.where_clause {
            parts.push(format!("WHERE {}", self.visit_expr(&where_clause.condition)?));
        }
        if let Some(order) = &delete.order_by {
            if let Some(sql) = self.visit_order_by(order)? {
                parts.push(format!("ORDER BY {sql}"));
            }
        }
        if let Some(limit) = delete.limit {
            parts.push(format!("LIMIT {}", limit.value));
        }
        Ok(parts.join(" "))
    }

    /// Renders any statement.
    ///
    /// # Errors
    ///
    /// Returns an error if a part fails to render.
    fn visit_statement(&mut self, statement: &Statement) -> Result<String> {
        match statement {
            Statement::Select(node) => self.visit_query_specification(node),
            Statement::Union(union) => self.visit_union(union),
            Statement::Insert(insert) => self.visit_insert(insert),
            Statement::Update(update) => self.visit_update(update),
            Statement::Delete(delete) => self.visit_delete(delete),
            Statement::Merge(merge) => self.visit_merge(merge),
            Statement::Truncate(truncate) => self.visit_truncate(truncate),
        }
    }
}

/// Splits a JSON path into its parent path and final leg.
pub(crate) fn split_last_leg(json: &JsonPathExpression) -> Option<(JsonPathExpression, &JsonLeg)> {
    let (last, rest) = json.legs.split_last()?;
    Some((
        JsonPathExpression {
            column: json.column.clone(),
            legs: rest.to_vec(),
        },
        last,
    ))
}

/// `'key'` with quotes doubled, or the bare number for array indexes.
pub(crate) fn json_key_literal(key: &str) -> String {
    if key.parse::<usize>().is_ok() {
        String::from(key)
    } else {
        format!("'{}'", key.replace('\'', "''"))
    }
}
