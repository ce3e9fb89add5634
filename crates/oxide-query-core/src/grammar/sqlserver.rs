use super::{
    assignments, check_rows, row_columns, where_clause, CompileContext, Grammar, Target,
};
use crate::ast::{
    BindingType, DeleteSpecification, Expr, FromClause, MergeSpecification, Statement,
    UpdateSpecification,
};
use crate::binding::CompiledQuery;
use crate::builder::{BuilderState, LimitOffsetClauseBuilder, Property, QueryBuilder, Record};
use crate::error::{QueryError, Result};
use crate::visitor::{QueryVisitor, SqlServerVisitor, VisitState};

/// Microsoft SQL Server.
///
/// Limits on UPDATE and DELETE become `TOP (n)`; upserts use `MERGE`.
#[derive(Debug, Clone, Default)]
pub struct SqlServerGrammar {
    prefix: String,
}

impl SqlServerGrammar {
    /// Creates the grammar without a table prefix.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            prefix: String::new(),
        }
    }

    /// Creates the grammar prefixing every table with `prefix`.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Grammar for SqlServerGrammar {
    fn name(&self) -> &'static str {
        "sqlsrv"
    }

    fn table_prefix(&self) -> &str {
        &self.prefix
    }

    fn visitor<'a>(&'a self, ctx: &'a mut CompileContext) -> Box<dyn QueryVisitor<'a> + 'a> {
        Box::new(SqlServerVisitor::new(VisitState::new(self, ctx)))
    }

    fn update_statement(
        &self,
        query: &QueryBuilder,
        values: Vec<(String, Expr)>,
    ) -> Result<Statement> {
        let target = Target::of(query, "update")?;
        let state = query.state();
        let (update_target, from) = if state.joins.is_empty() {
            (target.table, None)
        } else {
            (
                target.alias,
                Some(FromClause {
                    table: target.table,
                    joins: state.joins.clone(),
                }),
            )
        };
        Ok(Statement::Update(UpdateSpecification {
            target: update_target,
            top: state.limit,
            joins: Vec::new(),
            assignments: assignments(values, false)?,
            from,
            where_clause: where_clause(&state.wheres),
            order_by: None,
            limit: None,
        }))
    }

    fn delete_statement(&self, query: &QueryBuilder) -> Result<Statement> {
        let target = Target::of(query, "delete")?;
        let state = query.state();
        let delete_target = (!state.joins.is_empty()).then(|| target.alias.clone());
        Ok(Statement::Delete(DeleteSpecification {
            target: delete_target,
            top: state.limit,
            from: FromClause {
                table: target.table,
                joins: state.joins.clone(),
            },
            where_clause: where_clause(&state.wheres),
            order_by: None,
            limit: None,
        }))
    }

    fn compile_exists(&self, query: &QueryBuilder) -> Result<CompiledQuery> {
        let probe = query
            .clone_without(&[Property::Columns])
            .select_raw("1 [exists]", Vec::new())
            .limit(1);
        self.compile_select(&probe)
    }

    fn compile_insert_get_id(
        &self,
        query: &QueryBuilder,
        row: &Record,
        sequence: Option<&str>,
    ) -> Result<CompiledQuery> {
        let insert = self.compile_insert(query, std::slice::from_ref(row))?;
        let sql = format!(
            "SET NOCOUNT ON;{};SELECT SCOPE_IDENTITY() AS {}",
            insert.sql,
            self.quote(sequence.unwrap_or("id"))
        );
        Ok(CompiledQuery::new(sql, insert.bindings))
    }

    fn compile_upsert(
        &self,
        query: &QueryBuilder,
        rows: &[Record],
        unique_by: &[&str],
        update: &[&str],
    ) -> Result<CompiledQuery> {
        if rows.is_empty() {
            return Err(QueryError::InvalidArgument(String::from(
                "upsert needs at least one row",
            )));
        }
        check_rows(rows)?;
        let target = Target::of(query, "upsert")?;
        let merge = MergeSpecification {
            table: target.name,
            columns: row_columns(rows),
            rows: rows
                .iter()
                .map(|row| {
                    row.values()
                        .map(|v| Expr::binding(v.clone(), BindingType::Insert))
                        .collect()
                })
                .collect(),
            unique_by: unique_by.iter().map(|c| String::from(*c)).collect(),
            update: update.iter().map(|c| String::from(*c)).collect(),
        };
        self.render(&Statement::Merge(merge), &mut CompileContext::new())
    }
}
