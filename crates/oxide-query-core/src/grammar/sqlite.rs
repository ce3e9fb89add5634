use super::{
    conflict_update, insert_specification, rowid_delete, rowid_update, CompileContext, Grammar,
    Target,
};
use crate::ast::{BindingType, Expr, InsertVerb, Statement, TruncateSpecification};
use crate::binding::{Bindings, CompiledQuery};
use crate::builder::{QueryBuilder, Record, SqlValue};
use crate::error::Result;
use crate::visitor::{QueryVisitor, SqliteVisitor, VisitState};

/// SQLite.
#[derive(Debug, Clone, Default)]
pub struct SqliteGrammar {
    prefix: String,
}

impl SqliteGrammar {
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

impl Grammar for SqliteGrammar {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn table_prefix(&self) -> &str {
        &self.prefix
    }

    fn visitor<'a>(&'a self, ctx: &'a mut CompileContext) -> Box<dyn QueryVisitor<'a> + 'a> {
        Box::new(SqliteVisitor::new(VisitState::new(self, ctx)))
    }

    fn update_statement(
        &self,
        query: &QueryBuilder,
        values: Vec<(String, Expr)>,
    ) -> Result<Statement> {
        rowid_update(query, values, "rowid")
    }

    fn delete_statement(&self, query: &QueryBuilder) -> Result<Statement> {
        rowid_delete(query, "rowid")
    }

    fn compile_insert_or_ignore(&self, query: &QueryBuilder, rows: &[Record]) -> Result<CompiledQuery> {
        let insert = insert_specification(query, rows, InsertVerb::InsertOrIgnore)?;
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

    /// Resets the autoincrement counter, then deletes every row.
    fn compile_truncate(&self, query: &QueryBuilder) -> Result<Vec<CompiledQuery>> {
        let target = Target::of(query, "truncate")?;
        let mut bindings = Bindings::new();
        bindings.push(
            BindingType::Where,
            SqlValue::Text(format!("{}{}", self.prefix, target.bare)),
        );
        let sequence = CompiledQuery::new(
            format!("DELETE FROM {} WHERE {} = ?", self.quote("sqlite_sequence"), self.quote("name")),
            bindings,
        );
        let statement = Statement::Truncate(TruncateSpecification { table: target.name });
        let delete = self.render(&statement, &mut CompileContext::new())?;
        Ok(vec![sequence, delete])
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::builder::{
        BuilderState, JoinClauseBuilder, LimitOffsetClauseBuilder, UnionClauseBuilder,
        WhereClauseBuilder, WhereDateBuilder,
    };
    use crate::error::QueryError;

    fn query(table: &str) -> QueryBuilder {
        QueryBuilder::new(Arc::new(SqliteGrammar::new()))
            .from(table)
            .unwrap()
    }

    #[test]
    fn test_truncate_resets_sequence() {
        let q = QueryBuilder::new(Arc::new(SqliteGrammar::with_prefix("app_")))
            .from("users")
            .unwrap();
        let statements = q.grammar().compile_truncate(&q).unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[0].sql,
            "DELETE FROM `sqlite_sequence` WHERE `name` = ?"
        );
        assert_eq!(statements[0].values(), &[SqlValue::from("app_users")]);
        assert_eq!(statements[1].sql, "DELETE FROM `app_users`");
    }

    #[test]
    fn test_insert_or_ignore() {
        let q = query("users");
        let mut row = Record::new();
        row.insert(String::from("email"), SqlValue::from("foo"));
        let compiled = q.grammar().compile_insert_or_ignore(&q, &[row]).unwrap();
        assert_eq!(
            compiled.sql,
            "INSERT OR IGNORE INTO `users` (`email`) VALUES (?)"
        );
    }

    #[test]
    fn test_delete_with_join_uses_rowid() {
        let q = query("users")
            .join("contacts", "users.id", "=", "contacts.id")
            .unwrap()
            .where_eq("users.email", "foo")
            .unwrap();
        let compiled = q.grammar().compile_delete(&q).unwrap();
        assert_eq!(
            compiled.sql,
            "DELETE FROM `users` WHERE `rowid` IN (SELECT `users`.`rowid` FROM `users` INNER JOIN `contacts` ON `users`.`id` = `contacts`.`id` WHERE `users`.`email` = ?)"
        );
    }

    #[test]
    fn test_update_with_limit_uses_rowid() {
        let q = query("users").where_eq("id", 1).unwrap().limit(1);
        let values = vec![(
            String::from("votes"),
            Expr::binding(SqlValue::Int(3), BindingType::Update),
        )];
        let compiled = q.grammar().compile_update(&q, values).unwrap();
        assert_eq!(
            compiled.sql,
            "UPDATE `users` SET `votes` = ? WHERE `rowid` IN (SELECT `users`.`rowid` FROM `users` WHERE `id` = ? LIMIT 1)"
        );
    }

    #[test]
    fn test_union_members_are_wrapped() {
        let q = query("users").union(query("admins"));
        let compiled = q.compile().unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT * FROM (SELECT * FROM `users`) UNION SELECT * FROM (SELECT * FROM `admins`)"
        );
    }

    #[test]
    fn test_where_date_casts_binding() {
        let q = query("users").where_date("created_at", "=", "2024-01-01").unwrap();
        let compiled = q.compile().unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT * FROM `users` WHERE strftime('%Y-%m-%d', `created_at`) = CAST(? AS TEXT)"
        );
    }

    #[test]
    fn test_json_contains_is_unsupported() {
        use crate::builder::WhereJsonBuilder;

        let q = query("users")
            .where_json_contains("options->languages", "en")
            .unwrap();
        assert!(matches!(
            q.compile(),
            Err(QueryError::Unsupported { grammar: "sqlite", .. })
        ));
    }
}
