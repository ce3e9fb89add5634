//! Select compilation across the four dialects.

mod common;
use common::*;

use oxide_query_core::ast::{BindingType, Expr, NestedPredicateExpression};
use oxide_query_core::grammar::CompileContext;
use oxide_query_core::prelude::*;
use oxide_query_core::visitor::QueryVisitor;
use oxide_query_core::QueryError;

// ===================================================================
// Quoting and placeholders
// ===================================================================

#[test]
fn star_is_never_quoted() {
    let select = |q: QueryBuilder| sql(&q.select(&["*"]).unwrap());
    assert_eq!(select(mysql("t")), "SELECT * FROM `t`");
    assert_eq!(select(sqlite("t")), "SELECT * FROM `t`");
    assert_eq!(select(pgsql("t")), r#"SELECT * FROM "t""#);
    assert_eq!(select(sqlsrv("t")), "SELECT * FROM [t]");
}

#[test]
fn qualified_columns_and_aliases() {
    let q = pgsql("users as u")
        .select(&["u.id", "u.email as mail"])
        .unwrap();
    assert_eq!(
        sql(&q),
        r#"SELECT "u"."id", "u"."email" AS "mail" FROM "users" AS "u""#
    );
}

#[test]
fn placeholders_are_positional_on_postgres_only() {
    let two = |q: QueryBuilder| q.where_eq("a", 1).unwrap().where_eq("b", 2).unwrap();
    assert_eq!(
        sql(&two(pgsql("t"))),
        r#"SELECT * FROM "t" WHERE "a" = $1 AND "b" = $2"#
    );
    assert_eq!(sql(&two(mysql("t"))), "SELECT * FROM `t` WHERE `a` = ? AND `b` = ?");
    assert_eq!(sql(&two(sqlite("t"))), "SELECT * FROM `t` WHERE `a` = ? AND `b` = ?");
    assert_eq!(sql(&two(sqlsrv("t"))), "SELECT * FROM [t] WHERE [a] = ? AND [b] = ?");
}

#[test]
fn table_prefix_applies_to_tables_and_aliases() {
    let config = DatabaseConfig::new(Driver::Sqlsrv).with_prefix("app_");
    let q = on(config.grammar(), "users as u")
        .join("posts as p", "u.id", "=", "p.user_id")
        .unwrap()
        .select(&["u.id", "p.title"])
        .unwrap();
    assert_eq!(
        sql(&q),
        "SELECT [app_u].[id], [app_p].[title] FROM [app_users] AS [app_u] \
         INNER JOIN [app_posts] AS [app_p] ON [app_u].[id] = [app_p].[user_id]"
    );
}

// ===================================================================
// Predicate trees
// ===================================================================

#[test]
fn consecutive_wheres_fold_into_one_node() {
    let q = mysql("t").where_eq("a", 1).unwrap().where_eq("b", 2).unwrap();
    assert_eq!(q.state().wheres.len(), 1);
    assert!(matches!(
        &q.state().wheres[0],
        Expr::Binary(b) if matches!(b.conjunction, Conjunction::And)
            && matches!(*b.left, Expr::Comparison(_))
            && matches!(*b.right, Expr::Comparison(_))
    ));
}

#[test]
fn null_comparisons_become_is_null() {
    let mut q = mysql("users")
        .where_("deleted_at", "=", SqlValue::Null)
        .unwrap()
        .where_("email", "!=", SqlValue::Null)
        .unwrap();
    assert_eq!(
        q.to_sql().unwrap(),
        "SELECT * FROM `users` WHERE `deleted_at` IS NULL AND `email` IS NOT NULL"
    );
    assert!(q.get_bindings().is_empty());
}

#[test]
fn null_with_ordering_operator_is_rejected() {
    assert!(matches!(
        mysql("users").where_("votes", ">", SqlValue::Null),
        Err(QueryError::InvalidArgument(_))
    ));
}

#[test]
fn nested_where_renders_one_group() {
    let q = mysql("users")
        .where_eq("active", true)
        .unwrap()
        .where_nested(|q| q.where_eq("a", 1)?.or_where_eq("b", 2))
        .unwrap();
    assert_eq!(
        sql(&q),
        "SELECT * FROM `users` WHERE `active` = ? AND (`a` = ? OR `b` = ?)"
    );
}

#[test]
fn subquery_placeholders_continue_the_outer_count() {
    let q = pgsql("users")
        .where_eq("x", 1)
        .unwrap()
        .where_in_sub("id", |q| {
            q.from("posts")?
                .select(&["user_id"])?
                .where_eq("published", true)
        })
        .unwrap()
        .where_eq("y", 2)
        .unwrap();
    assert_eq!(
        sql(&q),
        r#"SELECT * FROM "users" WHERE "x" = $1 AND "id" IN (SELECT "user_id" FROM "posts" WHERE "published" = $2) AND "y" = $3"#
    );
}

#[test]
fn empty_in_lists_are_constant() {
    let q = mysql("t")
        .where_in("a", Vec::<i64>::new())
        .unwrap()
        .where_not_in("b", Vec::<i64>::new())
        .unwrap();
    assert_eq!(sql(&q), "SELECT * FROM `t` WHERE 0 = 1 AND 1 = 1");
}

#[test]
fn raw_placeholders_are_renumbered_on_postgres() {
    let q = pgsql("users")
        .where_eq("a", 1)
        .unwrap()
        .where_raw("b = ? OR c = ?", vec![SqlValue::Int(2), SqlValue::Int(3)]);
    assert_eq!(
        sql(&q),
        r#"SELECT * FROM "users" WHERE "a" = $1 AND b = $2 OR c = $3"#
    );
}

/// The array form reads its second argument as the conjunction joining the
/// group; the pairs inside the group are joined with AND.
#[test]
fn where_columns_array_form_takes_conjunction_in_operator_slot() {
    let q = mysql("users")
        .where_eq("a", 1)
        .unwrap()
        .where_columns(
            &[("first_name", "=", "last_name"), ("updated_at", ">", "created_at")],
            "or",
        )
        .unwrap();
    assert_eq!(
        sql(&q),
        "SELECT * FROM `users` WHERE `a` = ? OR (`first_name` = `last_name` AND `updated_at` > `created_at`)"
    );
    assert!(matches!(
        mysql("users").where_columns(&[("a", "=", "b")], "="),
        Err(QueryError::InvalidArgument(_))
    ));
    assert!(matches!(
        mysql("users").where_columns(&[("a", "=", "b")], "andX"),
        Err(QueryError::Unsupported { .. })
    ));
}

#[test]
fn nested_predicate_is_visited_once_per_compilation() {
    let grammar = MySqlGrammar::new();
    let nested = Expr::NestedPredicate(NestedPredicateExpression {
        query: Box::new(mysql("t").where_eq("a", 1).unwrap()),
    });
    let mut ctx = CompileContext::new();
    let mut visitor = grammar.visitor(&mut ctx);
    assert_eq!(visitor.visit_expr(&nested).unwrap(), "(`a` = ?)");
    assert!(matches!(
        visitor.visit_expr(&nested),
        Err(QueryError::AlreadyVisited)
    ));
}

#[test]
fn self_join_aliases_come_from_the_compilation() {
    let mut ctx = CompileContext::new();
    let parent = ctx.next_alias();
    let q = mysql("users")
        .join(
            &format!("users as {parent}"),
            &format!("{parent}.id"),
            "=",
            "users.parent_id",
        )
        .unwrap();
    let compiled = q.grammar().compile_select_with(&q, &mut ctx).unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT * FROM `users` INNER JOIN `users` AS `oxide_reserved_0` ON `oxide_reserved_0`.`id` = `users`.`parent_id`"
    );
    assert_eq!(ctx.next_alias(), "oxide_reserved_1");
    assert_eq!(CompileContext::new().next_alias(), "oxide_reserved_0");
}

// ===================================================================
// Bindings
// ===================================================================

#[test]
fn bindings_follow_canonical_clause_order() {
    let latest = mysql("posts")
        .select(&["id"])
        .unwrap()
        .where_eq("s", "select")
        .unwrap()
        .limit(1);
    let mut q = mysql("users")
        .select_sub(latest, "latest")
        .unwrap()
        .join_where("contacts", "contacts.kind", "=", "join")
        .unwrap()
        .where_eq("w", "where")
        .unwrap()
        .group_by(&["w"])
        .unwrap()
        .having("h", ">", "having")
        .unwrap()
        .order_by_raw("FIELD(w, ?)", vec![text("order")]);
    let compiled = q.compile().unwrap();
    let expected = ["select", "join", "where", "having", "order"].map(text);
    assert_eq!(compiled.values(), &expected);
    assert_eq!(compiled.bindings.flatten(), expected.to_vec());

    q.to_sql().unwrap();
    let raw = q.get_raw_bindings();
    assert_eq!(raw["select"], vec![text("select")]);
    assert_eq!(raw["join"], vec![text("join")]);
    assert_eq!(raw["order"], vec![text("order")]);
    assert_eq!(compiled.bindings.get(BindingType::Having), &[text("having")]);
}

#[test]
fn compiling_twice_is_deterministic() {
    let mut q = pgsql("users")
        .where_eq("a", 1)
        .unwrap()
        .where_nested(|q| q.where_eq("b", 2)?.or_where_eq("c", 3))
        .unwrap();
    let first = q.to_sql().unwrap();
    let first_bindings = q.get_bindings();
    let second = q.to_sql().unwrap();
    assert_eq!(first, second);
    assert_eq!(first_bindings, q.get_bindings());
    assert_eq!(first_bindings.len(), 3);
}

// ===================================================================
// Pagination
// ===================================================================

#[test]
fn for_page_matches_offset_and_limit() {
    for make in [mysql, pgsql, sqlite, sqlsrv] {
        assert_eq!(
            sql(&make("users").for_page(2, 10)),
            sql(&make("users").offset(10).limit(10))
        );
    }
    assert_eq!(
        sql(&mysql("users").for_page(2, 10)),
        "SELECT * FROM `users` LIMIT 10 OFFSET 10"
    );
    assert_eq!(
        sql(&sqlsrv("users").for_page(2, 10)),
        "SELECT * FROM [users] ORDER BY (SELECT 0) OFFSET 10 ROWS FETCH NEXT 10 ROWS ONLY"
    );
}

#[test]
fn for_page_after_id_replaces_earlier_order_on_column() {
    let q = mysql("users")
        .order_by("id", "desc")
        .unwrap()
        .order_by("name", "asc")
        .unwrap()
        .for_page_after_id(15, Some(20), "id")
        .unwrap();
    assert_eq!(
        sql(&q),
        "SELECT * FROM `users` WHERE `id` > ? ORDER BY `name` ASC, `id` ASC LIMIT 15"
    );
}

// ===================================================================
// Unions and aggregates
// ===================================================================

#[test]
fn union_members_are_wrapped_per_dialect() {
    let union = |make: fn(&str) -> QueryBuilder| {
        let admins = make("admins").where_eq("b", 2).unwrap();
        make("users").where_eq("a", 1).unwrap().union(admins)
    };
    assert_eq!(
        sql(&union(mysql)),
        "(SELECT * FROM `users` WHERE `a` = ?) UNION (SELECT * FROM `admins` WHERE `b` = ?)"
    );
    assert_eq!(
        sql(&union(pgsql)),
        r#"(SELECT * FROM "users" WHERE "a" = $1) UNION (SELECT * FROM "admins" WHERE "b" = $2)"#
    );
    assert_eq!(
        sql(&union(sqlsrv)),
        "SELECT * FROM (SELECT * FROM [users] WHERE [a] = ?) AS [temp_table] UNION \
         SELECT * FROM (SELECT * FROM [admins] WHERE [b] = ?) AS [temp_table]"
    );
}

#[test]
fn union_order_and_limit_apply_to_the_whole_union() {
    let q = mysql("users")
        .union_all(mysql("admins"))
        .order_by("id", "desc")
        .unwrap()
        .limit(5);
    assert_eq!(
        sql(&q),
        "(SELECT * FROM `users`) UNION ALL (SELECT * FROM `admins`) ORDER BY `id` DESC LIMIT 5"
    );
}

#[test]
fn aggregate_over_union_counts_a_derived_table() {
    let q = mysql("users")
        .union(mysql("admins"))
        .to_aggregate_query(AggregateFunction::Count, &["*"])
        .unwrap();
    assert_eq!(
        sql(&q),
        "SELECT COUNT(*) AS aggregate FROM ((SELECT * FROM `users`) UNION (SELECT * FROM `admins`)) AS `temp_table`"
    );
}

#[test]
fn distinct_count() {
    let q = pgsql("users")
        .distinct()
        .to_aggregate_query(AggregateFunction::Count, &["email"])
        .unwrap();
    assert_eq!(
        sql(&q),
        r#"SELECT COUNT(DISTINCT "email") AS aggregate FROM "users""#
    );
}

#[test]
fn exists_per_dialect() {
    let exists = |q: QueryBuilder| {
        let q = q.where_eq("id", 1).unwrap();
        q.grammar().compile_exists(&q).unwrap().sql
    };
    assert_eq!(
        exists(pgsql("users")),
        r#"SELECT EXISTS(SELECT * FROM "users" WHERE "id" = $1) AS "exists""#
    );
    assert_eq!(
        exists(sqlsrv("users")),
        "SELECT TOP 1 1 [exists] FROM [users] WHERE [id] = ?"
    );
}

// ===================================================================
// Dialect functions
// ===================================================================

#[test]
fn date_functions_per_dialect() {
    let year = |q: QueryBuilder| sql(&q.where_year("created_at", "=", 2024).unwrap());
    assert_eq!(year(mysql("t")), "SELECT * FROM `t` WHERE YEAR(`created_at`) = ?");
    assert_eq!(
        year(pgsql("t")),
        r#"SELECT * FROM "t" WHERE EXTRACT(YEAR FROM "created_at") = $1"#
    );
    assert_eq!(
        year(sqlite("t")),
        "SELECT * FROM `t` WHERE strftime('%Y', `created_at`) = CAST(? AS TEXT)"
    );
    assert_eq!(year(sqlsrv("t")), "SELECT * FROM [t] WHERE YEAR([created_at]) = ?");

    let date = sqlsrv("t").where_date("created_at", "=", "2024-01-02").unwrap();
    assert_eq!(
        sql(&date),
        "SELECT * FROM [t] WHERE CAST([created_at] AS date) = ?"
    );
}

#[test]
fn day_and_month_values_are_padded() {
    let mut q = mysql("t")
        .where_day("created_at", "=", 5)
        .unwrap()
        .where_month("created_at", "=", 11)
        .unwrap();
    q.to_sql().unwrap();
    assert_eq!(q.get_bindings(), vec![text("05"), text("11")]);
}

#[test]
fn random_order_per_dialect() {
    let random = |q: QueryBuilder| sql(&q.in_random_order());
    assert_eq!(random(mysql("t")), "SELECT * FROM `t` ORDER BY RAND()");
    assert_eq!(random(pgsql("t")), r#"SELECT * FROM "t" ORDER BY RANDOM()"#);
    assert_eq!(random(sqlite("t")), "SELECT * FROM `t` ORDER BY RANDOM()");
    assert_eq!(random(sqlsrv("t")), "SELECT * FROM [t] ORDER BY NEWID()");
}

#[test]
fn locks_per_dialect() {
    assert_eq!(
        sql(&mysql("t").lock_for_update()),
        "SELECT * FROM `t` FOR UPDATE"
    );
    assert_eq!(
        sql(&mysql("t").shared_lock()),
        "SELECT * FROM `t` LOCK IN SHARE MODE"
    );
    assert_eq!(sql(&pgsql("t").shared_lock()), r#"SELECT * FROM "t" FOR SHARE"#);
    assert_eq!(sql(&sqlite("t").lock_for_update()), "SELECT * FROM `t`");
    assert_eq!(
        sql(&sqlsrv("t").shared_lock()),
        "SELECT * FROM [t] WITH(ROWLOCK,HOLDLOCK)"
    );
}

#[test]
fn distinct_on_is_postgres_only() {
    assert_eq!(
        sql(&pgsql("users").distinct_on(&["email"])),
        r#"SELECT DISTINCT ON ("email") * FROM "users""#
    );
    assert_eq!(
        sql(&mysql("users").distinct_on(&["email"])),
        "SELECT DISTINCT * FROM `users`"
    );
}

#[test]
fn json_predicates_per_dialect() {
    let contains = |q: QueryBuilder| q.where_json_contains("options->languages", "en").unwrap();
    assert_eq!(
        sql(&contains(mysql("users"))),
        r#"SELECT * FROM `users` WHERE json_contains(`options`, ?, '$."languages"')"#
    );
    assert_eq!(
        sql(&contains(sqlsrv("users"))),
        r#"SELECT * FROM [users] WHERE ? IN (SELECT [value] FROM OPENJSON([options], '$."languages"'))"#
    );
    assert!(matches!(
        contains(sqlite("users")).compile(),
        Err(QueryError::Unsupported { grammar: "sqlite", .. })
    ));

    let length = sqlsrv("users")
        .where_json_length("options->languages", ">", 1)
        .unwrap();
    assert_eq!(
        sql(&length),
        r#"SELECT * FROM [users] WHERE (SELECT COUNT(*) FROM OPENJSON([options], '$."languages"')) > ?"#
    );
}

#[test]
fn json_selector_unquotes_on_mysql() {
    let q = mysql("users")
        .where_eq("options->>language", "en")
        .unwrap();
    assert_eq!(
        sql(&q),
        r#"SELECT * FROM `users` WHERE json_unquote(json_extract(`options`, '$."language"')) = ?"#
    );
}

#[test]
fn predicate_helpers_compose() {
    let q = sqlite("users").where_predicate(
        col("age")
            .gt_eq(18)
            .and(col("status").in_list(vec!["active", "pending"])),
    );
    let compiled = q.compile().unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT * FROM `users` WHERE `age` >= ? AND `status` IN (?, ?)"
    );
    assert_eq!(compiled.values().len(), 3);
}
