//! Column, table and join fragments: lexing, parsing and the SQL each
//! dialect renders for them.

mod common;
use common::*;

use oxide_query_core::ast::JoinType;
use oxide_query_core::lexer::Keyword;
use oxide_query_core::prelude::*;
use oxide_query_core::{Lexer, QueryError, TokenKind};

fn kinds(input: &str) -> Vec<TokenKind> {
    Lexer::new(input).tokenize().into_iter().map(|t| t.kind).collect()
}

// ===================================================================
// Lexing
// ===================================================================

#[test]
fn aliased_column_tokens() {
    assert_eq!(
        kinds("users.email as mail"),
        vec![
            TokenKind::Identifier(String::from("users")),
            TokenKind::Character('.'),
            TokenKind::Identifier(String::from("email")),
            TokenKind::Keyword(Keyword::As),
            TokenKind::Identifier(String::from("mail")),
        ]
    );
}

#[test]
fn json_arrows_are_single_operators() {
    let tokens = kinds("options->theme->>color");
    assert_eq!(tokens[1], TokenKind::Operator(String::from("->")));
    assert_eq!(tokens[3], TokenKind::Operator(String::from("->>")));
    assert_eq!(tokens.len(), 5);
}

// ===================================================================
// Columns
// ===================================================================

#[test]
fn keywords_work_as_column_names() {
    let q = mysql("users").select(&["order", "`select`"]).unwrap();
    assert_eq!(sql(&q), "SELECT `order`, `select` FROM `users`");
}

#[test]
fn identifiers_escape_their_quote_character() {
    let q = sqlsrv("users").select(&["`we]ird`"]).unwrap();
    assert_eq!(sql(&q), "SELECT [we]]ird] FROM [users]");
}

#[test]
fn json_columns_per_dialect() {
    let select = |q: QueryBuilder| sql(&q.select(&["options->theme->>color"]).unwrap());
    assert_eq!(
        select(mysql("users")),
        r#"SELECT json_unquote(json_extract(`options`, '$."theme"."color"')) FROM `users`"#
    );
    assert_eq!(
        select(pgsql("users")),
        r#"SELECT "options"->'theme'->>'color' FROM "users""#
    );
    assert_eq!(
        select(sqlite("users")),
        r#"SELECT json_extract(`options`, '$."theme"."color"') FROM `users`"#
    );
    assert_eq!(
        select(sqlsrv("users")),
        r#"SELECT json_value([options], '$."theme"."color"') FROM [users]"#
    );
}

#[test]
fn malformed_columns_surface_parse_errors() {
    assert!(matches!(
        mysql("users").select(&["a b"]),
        Err(QueryError::Parse(_))
    ));
    assert!(matches!(
        mysql("users").where_eq("users.", 1),
        Err(QueryError::Parse(_))
    ));
}

// ===================================================================
// Tables
// ===================================================================

#[test]
fn bare_keyword_table_is_rejected() {
    let q = QueryBuilder::new(std::sync::Arc::new(MySqlGrammar::new()));
    assert!(matches!(q.clone().from("select"), Err(QueryError::Parse(_))));
    assert_eq!(sql(&q.from("`select`").unwrap()), "SELECT * FROM `select`");
}

#[test]
fn schema_qualified_table_prefixes_the_table_only() {
    let grammar = DatabaseConfig::new(Driver::Pgsql).with_prefix("app_").grammar();
    let q = on(grammar, "public.users as u");
    assert_eq!(
        sql(&q),
        r#"SELECT * FROM "public"."app_users" AS "app_u""#
    );
}

// ===================================================================
// Joins
// ===================================================================

#[test]
fn join_fragment_with_on_part() {
    let q = mysql("users")
        .join_fragment("contacts as c on c.user_id = users.id", JoinType::Left)
        .unwrap();
    assert_eq!(
        sql(&q),
        "SELECT * FROM `users` LEFT JOIN `contacts` AS `c` ON `c`.`user_id` = `users`.`id`"
    );
}

#[test]
fn join_fragment_rejects_unknown_operator() {
    assert!(matches!(
        mysql("users").join_fragment("contacts on a like b", JoinType::Inner),
        Err(QueryError::Parse(_))
    ));
}

#[test]
fn cross_join_has_no_condition() {
    let q = sqlsrv("users").cross_join("roles").unwrap();
    assert_eq!(sql(&q), "SELECT * FROM [users] CROSS JOIN [roles]");
}

#[test]
fn join_sub_numbers_placeholders_in_order() {
    let posts = pgsql("posts").where_eq("published", true).unwrap();
    let q = pgsql("users")
        .left_join_sub(posts, "p", "p.user_id", "=", "users.id")
        .unwrap()
        .where_eq("active", true)
        .unwrap();
    let compiled = q.compile().unwrap();
    assert_eq!(
        compiled.sql,
        r#"SELECT * FROM "users" LEFT JOIN (SELECT * FROM "posts" WHERE "published" = $1) AS "p" ON "p"."user_id" = "users"."id" WHERE "active" = $2"#
    );
    assert_eq!(compiled.values().len(), 2);
}

#[test]
fn join_on_closure_mixes_columns_and_values() {
    let q = mysql("users")
        .join_on("contacts", JoinType::Inner, |j| {
            j.on("users.id", "=", "contacts.user_id")?
                .where_eq("contacts.kind", "email")
        })
        .unwrap();
    let compiled = q.compile().unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT * FROM `users` INNER JOIN `contacts` ON `users`.`id` = `contacts`.`user_id` AND `contacts`.`kind` = ?"
    );
    assert_eq!(compiled.bindings.get(oxide_query_core::ast::BindingType::Join), &[text("email")]);
}
