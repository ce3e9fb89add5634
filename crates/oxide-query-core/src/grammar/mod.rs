//! Per-dialect statement assembly.
//!
//! A grammar turns builder state into a [`Statement`] and hands it to its
//! visitor. The provided methods of [`Grammar`] carry the MySQL-shaped
//! baseline; each dialect overrides the statements it builds differently.

mod mysql;
mod postgres;
mod sqlite;
mod sqlserver;

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

pub use mysql::MySqlGrammar;
pub use postgres::PostgresGrammar;
pub use sqlite::SqliteGrammar;
pub use sqlserver::SqlServerGrammar;

use crate::ast::{
    AssignmentSetClause, BinaryUnionQueryExpression, BindingType, ConflictClause, Conjunction, DeleteSpecification,
    Distinct, Expr, FromClause, GroupByClause, HavingClause, Identifier, InPredicateExpression, InValues,
    InsertSource, InsertSpecification, InsertVerb, LimitClause, LockClause, NestedExpression,
    OffsetClause, OrderByClause, PathExpression, QuerySpecification, SelectClause, Statement,
    Subquery, TableName, TableReferenceExpression, TruncateSpecification, UpdateSpecification,
    WhereClause,
};
use crate::binding::CompiledQuery;
use crate::builder::{parse_column, BuilderState, Property, QueryBuilder, Record};
use crate::error::{QueryError, Result};
use crate::visitor::QueryVisitor;

/// State threaded through one compilation, nested queries included.
#[derive(Debug, Default)]
pub struct CompileContext {
    offset: usize,
    self_join_count: usize,
    visited: HashSet<usize>,
    retained: Vec<Statement>,
}

impl CompileContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of numbered placeholders emitted so far.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the next 1-based placeholder number.
    pub fn next_placeholder(&mut self) -> usize {
        self.offset += 1;
        self.offset
    }

    pub(crate) fn advance_to(&mut self, offset: usize) {
        self.offset = self.offset.max(offset);
    }

    /// Returns a fresh alias for joining a table to itself.
    ///
    /// Callers that assemble self-joins take aliases here and then compile
    /// through [`Grammar::compile_select_with`] with the same context, so the
    /// aliases stay unique across the whole compilation, nested queries
    /// included. Each context starts at `oxide_reserved_0`.
    pub fn next_alias(&mut self) -> String {
        let alias = format!("oxide_reserved_{}", self.self_join_count);
        self.self_join_count += 1;
        alias
    }

    /// Records a nested predicate by address.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::AlreadyVisited`] if it was recorded before.
    pub fn mark_visited(&mut self, address: usize) -> Result<()> {
        if self.visited.insert(address) {
            Ok(())
        } else {
            Err(QueryError::AlreadyVisited)
        }
    }

    /// Keeps a nested statement alive until the compilation ends, so the
    /// addresses in the visited set stay unique.
    pub(crate) fn retain(&mut self, statement: Statement) {
        self.retained.push(statement);
    }
}

/// A SQL dialect.
pub trait Grammar: fmt::Debug + Send + Sync {
    /// Dialect name, also the driver name in configuration.
    fn name(&self) -> &'static str;

    /// Prefix applied to every table name and table alias.
    fn table_prefix(&self) -> &str;

    /// Creates this dialect's visitor over `ctx`.
    fn visitor<'a>(&'a self, ctx: &'a mut CompileContext) -> Box<dyn QueryVisitor<'a> + 'a>;

    /// Assembles the SELECT, folding unions left-deep.
    ///
    /// # Errors
    ///
    /// Returns an error if the union list is malformed.
    fn select_statement(&self, query: &QueryBuilder) -> Result<Statement> {
        select_statement(query)
    }

    /// Assembles an UPDATE. Without joins, orders and limit are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the query has no table or a column is malformed.
    fn update_statement(
        &self,
        query: &QueryBuilder,
        values: Vec<(String, Expr)>,
    ) -> Result<Statement> {
        let target = Target::of(query, "update")?;
        let state = query.state();
        let assignments = assignments(values, false)?;
        let where_clause = where_clause(&state.wheres);
        Ok(Statement::Update(if state.joins.is_empty() {
            UpdateSpecification {
                target: target.table,
                top: None,
                joins: Vec::new(),
                assignments,
                from: None,
                where_clause,
                order_by: order_by(&state.orders),
                limit: state.limit.map(|value| LimitClause { value }),
            }
        } else {
            UpdateSpecification {
                target: target.table,
                top: None,
                joins: state.joins.clone(),
                assignments,
                from: None,
                where_clause,
                order_by: None,
                limit: None,
            }
        }))
    }

    /// Assembles a DELETE. With joins, the alias of the target table is
    /// named before FROM.
    ///
    /// # Errors
    ///
    /// Returns an error if the query has no table.
    fn delete_statement(&self, query: &QueryBuilder) -> Result<Statement> {
        let target = Target::of(query, "delete")?;
        let state = query.state();
        let where_clause = where_clause(&state.wheres);
        Ok(Statement::Delete(if state.joins.is_empty() {
            DeleteSpecification {
                target: None,
                top: None,
                from: FromClause {
                    table: target.table,
                    joins: Vec::new(),
                },
                where_clause,
                order_by: order_by(&state.orders),
                limit: state.limit.map(|value| LimitClause { value }),
            }
        } else {
            DeleteSpecification {
                target: Some(target.alias),
                top: None,
                from: FromClause {
                    table: target.table,
                    joins: state.joins.clone(),
                },
                where_clause,
                order_by: None,
                limit: None,
            }
        }))
    }

    /// Renders `statement` with a visitor over `ctx`.
    ///
    /// # Errors
    ///
    /// Returns an error if a node cannot be rendered.
    fn render(&self, statement: &Statement, ctx: &mut CompileContext) -> Result<CompiledQuery> {
        let mut visitor = self.visitor(ctx);
        let sql = visitor.visit_statement(statement)?;
        let bindings = std::mem::take(&mut visitor.state().bindings);
        debug!(grammar = self.name(), sql = %sql, bindings = bindings.len(), "compiled statement");
        Ok(CompiledQuery::new(sql, bindings))
    }

    /// Compiles the select with a fresh context.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be rendered.
    fn compile_select(&self, query: &QueryBuilder) -> Result<CompiledQuery> {
        let mut ctx = CompileContext::new();
        self.compile_select_with(query, &mut ctx)
    }

    /// Compiles the select inside an existing compilation.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be rendered.
    fn compile_select_with(
        &self,
        query: &QueryBuilder,
        ctx: &mut CompileContext,
    ) -> Result<CompiledQuery> {
        let statement = self.select_statement(query)?;
        self.render(&statement, ctx)
    }

    /// `SELECT EXISTS(select) AS exists`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be rendered.
    fn compile_exists(&self, query: &QueryBuilder) -> Result<CompiledQuery> {
        let inner = self.compile_select(query)?;
        let sql = format!("SELECT EXISTS({}) AS {}", inner.sql, self.quote("exists"));
        Ok(CompiledQuery::new(sql, inner.bindings))
    }

    /// `INSERT INTO table (columns) VALUES ...`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query has no table or the rows disagree on
    /// their columns.
    fn compile_insert(&self, query: &QueryBuilder, rows: &[Record]) -> Result<CompiledQuery> {
        let insert = insert_specification(query, rows, InsertVerb::Insert)?;
        self.render(&Statement::Insert(insert), &mut CompileContext::new())
    }

    /// Insert that skips rows violating a unique constraint.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Unsupported`] unless the dialect overrides it.
    fn compile_insert_or_ignore(
        &self,
        _query: &QueryBuilder,
        _rows: &[Record],
    ) -> Result<CompiledQuery> {
        Err(QueryError::unsupported(self.name(), "insert or ignore"))
    }

    /// Insert whose generated key the processor can read back.
    ///
    /// # Errors
    ///
    /// See [`compile_insert`](Self::compile_insert).
    fn compile_insert_get_id(
        &self,
        query: &QueryBuilder,
        row: &Record,
        _sequence: Option<&str>,
    ) -> Result<CompiledQuery> {
        self.compile_insert(query, std::slice::from_ref(row))
    }

    /// `INSERT INTO table (columns) <select>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query has no table or a column is malformed.
    fn compile_insert_using(
        &self,
        query: &QueryBuilder,
        columns: &[&str],
        source: Subquery,
    ) -> Result<CompiledQuery> {
        let target = Target::of(query, "insert")?;
        let columns = columns
            .iter()
            .map(|c| parse_column(c))
            .collect::<Result<Vec<_>>>()?;
        let insert = InsertSpecification {
            verb: InsertVerb::Insert,
            table: target.table,
            columns,
            source: InsertSource::Query(NestedExpression::new(BindingType::Insert, source)),
            conflict: None,
            returning: Vec::new(),
        };
        self.render(&Statement::Insert(insert), &mut CompileContext::new())
    }

    /// Compiles an UPDATE of `values`.
    ///
    /// # Errors
    ///
    /// See [`update_statement`](Self::update_statement).
    fn compile_update(
        &self,
        query: &QueryBuilder,
        values: Vec<(String, Expr)>,
    ) -> Result<CompiledQuery> {
        let statement = self.update_statement(query, values)?;
        self.render(&statement, &mut CompileContext::new())
    }

    /// Insert that updates `update` columns of rows colliding on
    /// `unique_by`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Unsupported`] unless the dialect overrides it.
    fn compile_upsert(
        &self,
        _query: &QueryBuilder,
        _rows: &[Record],
        _unique_by: &[&str],
        _update: &[&str],
    ) -> Result<CompiledQuery> {
        Err(QueryError::unsupported(self.name(), "upsert"))
    }

    /// Compiles a DELETE.
    ///
    /// # Errors
    ///
    /// See [`delete_statement`](Self::delete_statement).
    fn compile_delete(&self, query: &QueryBuilder) -> Result<CompiledQuery> {
        let statement = self.delete_statement(query)?;
        self.render(&statement, &mut CompileContext::new())
    }

    /// Statements that empty the table, run in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query has no table.
    fn compile_truncate(&self, query: &QueryBuilder) -> Result<Vec<CompiledQuery>> {
        let target = Target::of(query, "truncate")?;
        let statement = Statement::Truncate(TruncateSpecification { table: target.name });
        Ok(vec![self.render(&statement, &mut CompileContext::new())?])
    }

    /// Quotes one identifier the way this dialect does.
    fn quote(&self, name: &str) -> String {
        let mut ctx = CompileContext::new();
        let visitor = self.visitor(&mut ctx);
        visitor.quote_identifier(name)
    }
}

/// The table a write statement targets.
pub(crate) struct Target {
    /// The FROM expression as written, alias included.
    pub table: Expr,
    /// The table name without alias.
    pub name: Expr,
    /// The alias, or the table name when there is none.
    pub alias: Expr,
    pub alias_path: Vec<String>,
    /// Last segment of the table name.
    pub bare: String,
}

impl Target {
    pub(crate) fn of(query: &QueryBuilder, statement: &str) -> Result<Self> {
        let Some(from) = &query.state().from else {
            return Err(QueryError::InvalidArgument(format!(
                "{statement} needs a table, call from() first"
            )));
        };
        let (path, alias) = match from {
            Expr::TableReference(reference) => match reference.table.as_ref() {
                Expr::TableName(name) => (name.path.clone(), reference.alias.clone()),
                _ => return Err(plain_table(statement)),
            },
            Expr::TableName(name) => (name.path.clone(), None),
            _ => return Err(plain_table(statement)),
        };
        let alias_path: Vec<String> = match alias {
            Some(alias) => vec![alias],
            None => path.segments.iter().map(|s| s.name.clone()).collect(),
        };
        let bare = path.last().map(|s| s.name.clone()).unwrap_or_default();
        Ok(Self {
            table: from.clone(),
            name: Expr::TableName(TableName { path }),
            alias: Expr::TableName(TableName {
                path: PathExpression::new(alias_path.clone()),
            }),
            alias_path,
            bare,
        })
    }
}

fn plain_table(statement: &str) -> QueryError {
    QueryError::InvalidArgument(format!("{statement} needs a plain table name"))
}

/// Folds a predicate list with AND.
pub(crate) fn fold(list: &[Expr]) -> Option<Expr> {
    list.iter()
        .cloned()
        .reduce(|left, right| Expr::binary(left, Conjunction::And, right))
}

pub(crate) fn where_clause(list: &[Expr]) -> Option<WhereClause> {
    fold(list).map(|condition| WhereClause { condition })
}

pub(crate) fn order_by(list: &[Expr]) -> Option<OrderByClause> {
    (!list.is_empty()).then(|| OrderByClause {
        elements: list.to_vec(),
    })
}

/// One SELECT from the builder state, unions aside.
pub(crate) fn query_specification(query: &QueryBuilder) -> QuerySpecification {
    let state = query.state();
    let (distinct, columns) = match &state.aggregate {
        Some(aggregate) => (Distinct::All, vec![aggregate.clone()]),
        None if state.columns.is_empty() => (
            state.distinct.clone(),
            vec![Expr::Identifier(Identifier::new("*"))],
        ),
        None => (state.distinct.clone(), state.columns.clone()),
    };
    QuerySpecification {
        select: SelectClause { distinct, columns },
        from: state.from.clone().map(|table| FromClause {
            table,
            joins: state.joins.clone(),
        }),
        where_clause: where_clause(&state.wheres),
        group_by: (!state.groups.is_empty()).then(|| GroupByClause {
            columns: state.groups.clone(),
        }),
        having: fold(&state.havings).map(|condition| HavingClause { condition }),
        order_by: order_by(&state.orders),
        limit: state.limit.map(|value| LimitClause { value }),
        offset: state.offset.map(|value| OffsetClause { value }),
        lock: state.lock.clone().map(|lock| LockClause { lock }),
    }
}

/// The full SELECT: unions fold left-deep with the union clauses on the
/// outermost node; an aggregate over unions counts a derived table.
pub(crate) fn select_statement(query: &QueryBuilder) -> Result<Statement> {
    let state = query.state();
    if state.unions.is_empty() {
        return Ok(Statement::Select(query_specification(query)));
    }
    if let Some(aggregate) = &state.aggregate {
        let inner = query.clone_without(&[Property::Aggregate]);
        return Ok(Statement::Select(QuerySpecification {
            select: SelectClause {
                distinct: Distinct::All,
                columns: vec![aggregate.clone()],
            },
            from: Some(FromClause {
                table: Expr::TableReference(TableReferenceExpression {
                    table: Box::new(Expr::Nested(NestedExpression::new(
                        BindingType::From,
                        inner,
                    ))),
                    alias: Some(String::from("temp_table")),
                }),
                joins: Vec::new(),
            }),
            where_clause: None,
            group_by: None,
            having: None,
            order_by: None,
            limit: None,
            offset: None,
            lock: None,
        }));
    }
    let mut statement = Statement::Select(query_specification(query));
    let last = state.unions.len() - 1;
    for (index, union) in state.unions.iter().enumerate() {
        let Expr::Union(fragment) = union else {
            return Err(QueryError::InvalidArgument(String::from(
                "union list holds a non-union node",
            )));
        };
        let outermost = index == last;
        statement = Statement::Union(BinaryUnionQueryExpression {
            left: Box::new(statement),
            right: fragment.query.clone(),
            all: fragment.all,
            order_by: if outermost {
                order_by(&state.union_orders)
            } else {
                None
            },
            limit: state
                .union_limit
                .filter(|_| outermost)
                .map(|value| LimitClause { value }),
            offset: state
                .union_offset
                .filter(|_| outermost)
                .map(|value| OffsetClause { value }),
        });
    }
    Ok(statement)
}

/// Every row must carry the columns of the first one.
pub(crate) fn check_rows(rows: &[Record]) -> Result<()> {
    let Some((first, rest)) = rows.split_first() else {
        return Ok(());
    };
    let same = rest
        .iter()
        .all(|row| row.len() == first.len() && row.keys().zip(first.keys()).all(|(a, b)| a == b));
    if same {
        Ok(())
    } else {
        Err(QueryError::InvalidArgument(String::from(
            "every inserted row must have the same columns",
        )))
    }
}

pub(crate) fn insert_specification(
    query: &QueryBuilder,
    rows: &[Record],
    verb: InsertVerb,
) -> Result<InsertSpecification> {
    let target = Target::of(query, "insert")?;
    check_rows(rows)?;
    let (columns, source) = match rows.first() {
        Some(first) if !first.is_empty() => {
            let columns = first
                .keys()
                .map(|c| parse_column(c))
                .collect::<Result<Vec<_>>>()?;
            let values = rows
                .iter()
                .map(|row| {
                    row.values()
                        .map(|v| Expr::binding(v.clone(), BindingType::Insert))
                        .collect()
                })
                .collect();
            (columns, InsertSource::Values(values))
        }
        _ => (Vec::new(), InsertSource::DefaultValues),
    };
    Ok(InsertSpecification {
        verb,
        table: target.table,
        columns,
        source,
        conflict: None,
        returning: Vec::new(),
    })
}

/// `column = value` nodes. `strip_qualifier` keeps only the column segment.
pub(crate) fn assignments(values: Vec<(String, Expr)>, strip_qualifier: bool) -> Result<Vec<Expr>> {
    values
        .into_iter()
        .map(|(column, value)| {
            let column = match parse_column(&column)? {
                Expr::Path(path) if strip_qualifier => {
                    let last = path.last().map(|s| s.name.clone()).unwrap_or_default();
                    Expr::path([last])
                }
                Expr::JsonPath(_) => {
                    return Err(QueryError::InvalidArgument(format!(
                        "cannot assign to JSON path [{column}]"
                    )))
                }
                other => other,
            };
            Ok(Expr::Assignment(AssignmentSetClause {
                column: Box::new(column),
                value: Box::new(value),
            }))
        })
        .collect()
}

/// `rowid IN (SELECT alias.rowid FROM ...)` over a copy of the query, for
/// dialects without multi-table UPDATE and DELETE.
pub(crate) fn rowid_predicate(query: &QueryBuilder, target: &Target, rowid: &str) -> Expr {
    let mut inner = query.clone_without(&[Property::Columns, Property::Aggregate, Property::Lock]);
    let mut segments = target.alias_path.clone();
    segments.push(String::from(rowid));
    inner.state_mut().columns = vec![Expr::path(segments)];
    Expr::In(InPredicateExpression {
        expression: Box::new(Expr::path([rowid])),
        values: InValues::Query(NestedExpression::new(BindingType::Where, inner)),
        negated: false,
    })
}

/// UPDATE through [`rowid_predicate`] when the query joins or limits.
pub(crate) fn rowid_update(
    query: &QueryBuilder,
    values: Vec<(String, Expr)>,
    rowid: &str,
) -> Result<Statement> {
    let target = Target::of(query, "update")?;
    let state = query.state();
    let assignments = assignments(values, true)?;
    let where_clause = if state.joins.is_empty() && state.limit.is_none() {
        where_clause(&state.wheres)
    } else {
        Some(WhereClause {
            condition: rowid_predicate(query, &target, rowid),
        })
    };
    Ok(Statement::Update(UpdateSpecification {
        target: target.table,
        top: None,
        joins: Vec::new(),
        assignments,
        from: None,
        where_clause,
        order_by: None,
        limit: None,
    }))
}

/// DELETE through [`rowid_predicate`] when the query joins or limits.
pub(crate) fn rowid_delete(query: &QueryBuilder, rowid: &str) -> Result<Statement> {
    let target = Target::of(query, "delete")?;
    let state = query.state();
    let where_clause = if state.joins.is_empty() && state.limit.is_none() {
        where_clause(&state.wheres)
    } else {
        Some(WhereClause {
            condition: rowid_predicate(query, &target, rowid),
        })
    };
    Ok(Statement::Delete(DeleteSpecification {
        target: None,
        top: None,
        from: FromClause {
            table: target.table,
            joins: Vec::new(),
        },
        where_clause,
        order_by: None,
        limit: None,
    }))
}

/// `ON CONFLICT (unique_by) DO UPDATE SET ...`.
pub(crate) fn conflict_update(unique_by: &[&str], update: &[&str]) -> ConflictClause {
    ConflictClause::DoUpdate {
        unique_by: unique_by.iter().map(|c| String::from(*c)).collect(),
        update: update.iter().map(|c| String::from(*c)).collect(),
    }
}

/// Columns of the first row, for upserts.
pub(crate) fn row_columns(rows: &[Record]) -> Vec<String> {
    rows.first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::builder::{SqlValue, UnionClauseBuilder, WhereClauseBuilder};

    fn query() -> QueryBuilder {
        QueryBuilder::new(Arc::new(MySqlGrammar::new()))
            .from("users")
            .unwrap()
    }

    #[test]
    fn test_context_counters() {
        let mut ctx = CompileContext::new();
        assert_eq!(ctx.next_placeholder(), 1);
        assert_eq!(ctx.next_placeholder(), 2);
        ctx.advance_to(1);
        assert_eq!(ctx.offset(), 2);
        assert_eq!(ctx.next_alias(), "oxide_reserved_0");
        assert_eq!(ctx.next_alias(), "oxide_reserved_1");
    }

    #[test]
    fn test_mark_visited() {
        let mut ctx = CompileContext::new();
        assert!(ctx.mark_visited(8).is_ok());
        assert!(matches!(ctx.mark_visited(8), Err(QueryError::AlreadyVisited)));
    }

    #[test]
    fn test_unions_fold_left_deep() {
        let q = query().union(query()).union_all(query());
        let Statement::Union(outer) = select_statement(&q).unwrap() else {
            panic!("Expected union");
        };
        assert!(outer.all);
        assert!(matches!(*outer.left, Statement::Union(ref inner) if !inner.all));
    }

    #[test]
    fn test_check_rows() {
        let row = |pairs: &[(&str, i64)]| -> Record {
            pairs
                .iter()
                .map(|(k, v)| (String::from(*k), SqlValue::Int(*v)))
                .collect()
        };
        assert!(check_rows(&[row(&[("a", 1), ("b", 2)]), row(&[("b", 3), ("a", 4)])]).is_ok());
        assert!(matches!(
            check_rows(&[row(&[("a", 1)]), row(&[("b", 1)])]),
            Err(QueryError::InvalidArgument(_))
        ));
        assert!(check_rows(&[]).is_ok());
    }

    #[test]
    fn test_target_requires_table() {
        let q = QueryBuilder::new(Arc::new(MySqlGrammar::new()));
        assert!(matches!(
            Target::of(&q, "delete"),
            Err(QueryError::InvalidArgument(_))
        ));
        let q = query().where_eq("id", 1).unwrap();
        let target = Target::of(&q, "delete").unwrap();
        assert_eq!(target.bare, "users");
        assert_eq!(target.alias_path, ["users"]);
    }

    #[test]
    fn test_assignments_strip_qualifier() {
        let values = vec![(
            String::from("users.votes"),
            Expr::binding(SqlValue::Int(1), BindingType::Update),
        )];
        let stripped = assignments(values.clone(), true).unwrap();
        assert!(matches!(
            &stripped[0],
            Expr::Assignment(a) if *a.column == Expr::path(["votes"])
        ));
        let kept = assignments(values, false).unwrap();
        assert!(matches!(
            &kept[0],
            Expr::Assignment(a) if *a.column == Expr::path(["users", "votes"])
        ));
    }
}
