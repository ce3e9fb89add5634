use super::{insert_specification, CompileContext, Grammar};
use crate::ast::{ConflictClause, InsertVerb, Statement};
use crate::binding::CompiledQuery;
use crate::builder::{QueryBuilder, Record};
use crate::error::Result;
use crate::visitor::{MySqlVisitor, QueryVisitor, VisitState};

/// MySQL and MariaDB.
#[derive(Debug, Clone, Default)]
pub struct MySqlGrammar {
    prefix: String,
}

impl MySqlGrammar {
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

impl Grammar for MySqlGrammar {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn table_prefix(&self) -> &str {
        &self.prefix
    }

    fn visitor<'a>(&'a self, ctx: &'a mut CompileContext) -> Box<dyn QueryVisitor<'a> + 'a> {
        Box::new(MySqlVisitor::new(VisitState::new(self, ctx)))
    }

    fn compile_insert_or_ignore(&self, query: &QueryBuilder, rows: &[Record]) -> Result<CompiledQuery> {
        let insert = insert_specification(query, rows, InsertVerb::InsertIgnore)?;
        self.render(&Statement::Insert(insert), &mut CompileContext::new())
    }

    fn compile_upsert(
        &self,
        query: &QueryBuilder,
        rows: &[Record],
        _unique_by: &[&str],
        update: &[&str],
    ) -> Result<CompiledQuery> {
        let mut insert = insert_specification(query, rows, InsertVerb::Insert)?;
        insert.conflict = Some(ConflictClause::DuplicateKeyUpdate {
            update: update.iter().map(|c| String::from(*c)).collect(),
        });
        self.render(&Statement::Insert(insert), &mut CompileContext::new())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::builder::{
        BuilderState, JoinClauseBuilder, LimitOffsetClauseBuilder, OrderByClauseBuilder, SqlValue,
        WhereClauseBuilder,
    };
    use crate::ast::{BindingType, Expr};

    fn query(table: &str) -> QueryBuilder {
        QueryBuilder::new(Arc::new(MySqlGrammar::new()))
            .from(table)
            .unwrap()
    }

    fn row(pairs: &[(&str, SqlValue)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (String::from(*k), v.clone()))
            .collect()
    }

    #[test]
    fn test_select_with_prefix() {
        let grammar = Arc::new(MySqlGrammar::with_prefix("app_"));
        let q = QueryBuilder::new(grammar)
            .from("users as u")
            .unwrap()
            .select(&["u.id"])
            .unwrap();
        let compiled = q.compile().unwrap();
        assert_eq!(compiled.sql, "SELECT `app_u`.`id` FROM `app_users` AS `app_u`");
    }

    #[test]
    fn test_insert_multiple_rows() {
        let q = query("users");
        let rows = [
            row(&[("email", SqlValue::from("a@b")), ("votes", SqlValue::Int(1))]),
            row(&[("email", SqlValue::from("c@d")), ("votes", SqlValue::Int(2))]),
        ];
        let compiled = q.grammar().compile_insert(&q, &rows).unwrap();
        assert_eq!(
            compiled.sql,
            "INSERT INTO `users` (`email`, `votes`) VALUES (?, ?), (?, ?)"
        );
        assert_eq!(compiled.values().len(), 4);
    }

    #[test]
    fn test_insert_default_values() {
        let q = query("users");
        let compiled = q.grammar().compile_insert(&q, &[Record::new()]).unwrap();
        assert_eq!(compiled.sql, "INSERT INTO `users` () VALUES ()");
    }

    #[test]
    fn test_insert_ignore_and_upsert() {
        let q = query("users");
        let rows = [row(&[("email", SqlValue::from("a@b")), ("name", SqlValue::from("A"))])];
        let ignore = q.grammar().compile_insert_or_ignore(&q, &rows).unwrap();
        assert_eq!(
            ignore.sql,
            "INSERT IGNORE INTO `users` (`email`, `name`) VALUES (?, ?)"
        );
        let upsert = q
            .grammar()
            .compile_upsert(&q, &rows, &["email"], &["name"])
            .unwrap();
        assert_eq!(
            upsert.sql,
            "INSERT INTO `users` (`email`, `name`) VALUES (?, ?) ON DUPLICATE KEY UPDATE `name` = VALUES(`name`)"
        );
    }

    #[test]
    fn test_update_with_order_and_limit() {
        let q = query("users")
            .where_eq("id", 1)
            .unwrap()
            .order_by("id", "desc")
            .unwrap()
            .limit(1);
        let values = vec![(
            String::from("votes"),
            Expr::binding(SqlValue::Int(5), BindingType::Update),
        )];
        let compiled = q.grammar().compile_update(&q, values).unwrap();
        assert_eq!(
            compiled.sql,
            "UPDATE `users` SET `votes` = ? WHERE `id` = ? ORDER BY `id` DESC LIMIT 1"
        );
        assert_eq!(compiled.values(), &[SqlValue::Int(5), SqlValue::Int(1)]);
    }

    #[test]
    fn test_update_with_join_drops_order_and_limit() {
        let q = query("users")
            .join("contacts", "users.id", "=", "contacts.id")
            .unwrap()
            .order_by("id", "asc")
            .unwrap()
            .limit(3);
        let values = vec![(
            String::from("users.email"),
            Expr::binding(SqlValue::from("foo"), BindingType::Update),
        )];
        let compiled = q.grammar().compile_update(&q, values).unwrap();
        assert_eq!(
            compiled.sql,
            "UPDATE `users` INNER JOIN `contacts` ON `users`.`id` = `contacts`.`id` SET `users`.`email` = ?"
        );
    }

    #[test]
    fn test_delete_with_join_names_alias() {
        let q = query("users as u")
            .join("contacts as c", "u.id", "=", "c.id")
            .unwrap()
            .where_eq("u.email", "foo")
            .unwrap();
        let compiled = q.grammar().compile_delete(&q).unwrap();
        assert_eq!(
            compiled.sql,
            "DELETE `u` FROM `users` AS `u` INNER JOIN `contacts` AS `c` ON `u`.`id` = `c`.`id` WHERE `u`.`email` = ?"
        );
    }

    #[test]
    fn test_truncate() {
        let q = query("users");
        let statements = q.grammar().compile_truncate(&q).unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].sql, "TRUNCATE TABLE `users`");
    }

    #[test]
    fn test_exists() {
        let q = query("users").where_eq("id", 1).unwrap();
        let compiled = q.grammar().compile_exists(&q).unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT EXISTS(SELECT * FROM `users` WHERE `id` = ?) AS `exists`"
        );
    }
}
