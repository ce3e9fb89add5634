use super::{
    conflict_update, insert_specification, rowid_delete, rowid_update, CompileContext, Grammar,
};
use crate::ast::{ConflictClause, Expr, InsertVerb, Statement};
use crate::binding::CompiledQuery;
use crate::builder::{QueryBuilder, Record};
use crate::error::Result;
use crate::visitor::{PostgresVisitor, QueryVisitor, VisitState};

/// PostgreSQL.
///
/// UPDATE and DELETE with joins or a limit are rewritten to
/// `ctid IN (SELECT ...)`.
#[derive(Debug, Clone, Default)]
pub struct PostgresGrammar {
    prefix: String,
}

impl PostgresGrammar {
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

impl Grammar for PostgresGrammar {
    fn name(&self) -> &'static str {
        "pgsql"
    }

    fn table_prefix(&self) -> &str {
        &self.prefix
    }

    fn visitor<'a>(&'a self, ctx: &'a mut CompileContext) -> Box<dyn QueryVisitor<'a> + 'a> {
        Box::new(PostgresVisitor::new(VisitState::new(self, ctx)))
    }

    fn update_statement(
        &self,
        query: &QueryBuilder,
        values: Vec<(String, Expr)>,
    ) -> Result<Statement> {
        rowid_update(query, values, "ctid")
    }

    fn delete_statement(&self, query: &QueryBuilder) -> Result<Statement> {
        rowid_delete(query, "ctid")
    }

    fn compile_insert_or_ignore(&self, query: &QueryBuilder, rows: &[Record]) -> Result<CompiledQuery> {
        let mut insert = insert_specification(query, rows, InsertVerb::Insert)?;
        insert.conflict = Some(ConflictClause::DoNothing);
        self.render(&Statement::Insert(insert), &mut CompileContext::new())
    }

    fn compile_insert_get_id(
        &self,
        query: &QueryBuilder,
        row: &Record,
        sequence: Option<&str>,
    ) -> Result<CompiledQuery> {
        let mut insert =
            insert_specification(query, std::slice::from_ref(row), InsertVerb::Insert)?;
        insert.returning = vec![Expr::path([sequence.unwrap_or("id")])];
        self.render(&Statement::Insert(insert), &mut CompileContext::new())
    }

    fn compile_upsert(
        &self,
        query: &QueryBuilder,
        rows: &[Record],
        unique_by: &[&str],
        update: &[&str],
    ) -> Result<CompiledQuery> {
        let mut insert = insert_specification(query, rows, InsertVerb::Insert)?;
        insert.conflict = Some(conflict_update(unique_by, update));
        self.render(&Statement::Insert(insert), &mut CompileContext::new())
    }
}
