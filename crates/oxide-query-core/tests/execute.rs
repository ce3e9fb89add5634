//! Execution helpers driven through a recording connection.

mod common;
use common::*;

use std::sync::Arc;

use oxide_query_core::prelude::*;
use oxide_query_core::QueryError;

fn mysql_conn() -> RecordingConnection {
    RecordingConnection::new(Arc::new(MySqlGrammar::new()))
}

// ===================================================================
// Reads
// ===================================================================

#[tokio::test]
async fn get_returns_rows_and_sends_bindings() {
    let conn = mysql_conn().with_rows(vec![
        record(&[("id", SqlValue::Int(1))]),
        record(&[("id", SqlValue::Int(2))]),
    ]);
    let rows = conn
        .query()
        .from("users")
        .unwrap()
        .where_eq("active", true)
        .unwrap()
        .get(&conn)
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    let sent = conn.last();
    assert_eq!(sent.kind, "select");
    assert_eq!(sent.sql, "SELECT * FROM `users` WHERE `active` = ?");
    assert_eq!(sent.bindings, vec![SqlValue::Bool(true)]);
}

#[tokio::test]
async fn first_limits_to_one_row() {
    let conn = RecordingConnection::new(Arc::new(SqlServerGrammar::new()))
        .with_rows(vec![record(&[("id", SqlValue::Int(4))])]);
    let found = conn.query().from("users").unwrap().first(&conn).await.unwrap();

    assert_eq!(found, Some(record(&[("id", SqlValue::Int(4))])));
    assert_eq!(conn.last().sql, "SELECT TOP 1 * FROM [users]");
}

#[tokio::test]
async fn value_reads_one_column() {
    let conn = mysql_conn().with_rows(vec![record(&[("email", text("a@x"))])]);
    let email = email_of_user_one(&conn).await;

    assert_eq!(email, Some(text("a@x")));
    assert_eq!(
        conn.last().sql,
        "SELECT `email` FROM `users` WHERE `id` = ? LIMIT 1"
    );
}

async fn email_of_user_one(conn: &RecordingConnection) -> Option<SqlValue> {
    conn.query()
        .from("users")
        .unwrap()
        .where_eq("id", 1)
        .unwrap()
        .value(conn, "email")
        .await
        .unwrap()
}

#[tokio::test]
async fn pluck_uses_alias_and_fills_missing_with_null() {
    let conn = mysql_conn().with_rows(vec![record(&[("mail", text("a@x"))]), Row::new()]);
    let values = conn
        .query()
        .from("users")
        .unwrap()
        .pluck(&conn, "users.email as mail")
        .await
        .unwrap();

    assert_eq!(values, vec![text("a@x"), SqlValue::Null]);
    assert_eq!(
        conn.last().sql,
        "SELECT `users`.`email` AS `mail` FROM `users`"
    );
}

// ===================================================================
// Aggregates
// ===================================================================

#[tokio::test]
async fn count_reads_aggregate_column() {
    let conn = mysql_conn().with_rows(vec![record(&[("aggregate", SqlValue::Int(3))])]);
    let query = conn
        .query()
        .from("users")
        .unwrap()
        .select(&["id", "email"])
        .unwrap()
        .where_eq("active", true)
        .unwrap();
    let count = query.count(&conn, &[]).await.unwrap();

    assert_eq!(count, 3);
    assert_eq!(
        conn.last().sql,
        "SELECT COUNT(*) AS aggregate FROM `users` WHERE `active` = ?"
    );
    // The query the count ran on keeps its columns.
    assert_eq!(query.state().columns.len(), 2);
}

#[tokio::test]
async fn count_without_rows_is_an_error() {
    let conn = mysql_conn();
    let result = conn.query().from("users").unwrap().count(&conn, &[]).await;
    assert!(matches!(result, Err(QueryError::MissingAggregate)));
}

#[tokio::test]
async fn sum_of_nothing_is_zero() {
    let conn = mysql_conn().with_rows(vec![record(&[("aggregate", SqlValue::Null)])]);
    let sum = conn
        .query()
        .from("orders")
        .unwrap()
        .sum(&conn, "total")
        .await
        .unwrap();

    assert_eq!(sum, SqlValue::Int(0));
    assert_eq!(
        conn.last().sql,
        "SELECT SUM(`total`) AS aggregate FROM `orders`"
    );
}

#[tokio::test]
async fn exists_reads_the_exists_column() {
    let conn = mysql_conn().with_rows(vec![record(&[("exists", SqlValue::Int(1))])]);
    let query = conn.query().from("users").unwrap().where_eq("id", 1).unwrap();

    assert!(query.exists(&conn).await.unwrap());
    assert_eq!(
        conn.last().sql,
        "SELECT EXISTS(SELECT * FROM `users` WHERE `id` = ?) AS `exists`"
    );
    // Nothing queued: no row means no match.
    assert!(query.doesnt_exist(&conn).await.unwrap());
}

#[tokio::test]
async fn grouped_pagination_count_uses_derived_table() {
    let conn = mysql_conn().with_rows(vec![record(&[("aggregate", SqlValue::Int(2))])]);
    let total = conn
        .query()
        .from("users")
        .unwrap()
        .group_by(&["role"])
        .unwrap()
        .order_by("role", "asc")
        .unwrap()
        .limit(5)
        .get_count_for_pagination(&conn, &[])
        .await
        .unwrap();

    assert_eq!(total, 2);
    assert_eq!(
        conn.last().sql,
        "SELECT COUNT(*) AS aggregate FROM (SELECT * FROM `users` GROUP BY `role`) AS `aggregate_table`"
    );
}

// ===================================================================
// Writes
// ===================================================================

#[tokio::test]
async fn insert_of_nothing_runs_nothing() {
    let conn = mysql_conn();
    let inserted = conn.query().from("users").unwrap().insert(&conn, &[]).await.unwrap();
    assert!(inserted);
    assert!(conn.executed().is_empty());
}

#[tokio::test]
async fn insert_get_id_asks_connection_for_last_id() {
    let conn = mysql_conn();
    let id = conn
        .query()
        .from("users")
        .unwrap()
        .insert_get_id(&conn, &record(&[("email", text("a@x"))]), None)
        .await
        .unwrap();

    assert_eq!(id, 7);
    let sent = conn.last();
    assert_eq!(sent.kind, "statement");
    assert_eq!(sent.sql, "INSERT INTO `users` (`email`) VALUES (?)");
}

#[tokio::test]
async fn insert_get_id_reads_returning_row() {
    let conn = RecordingConnection::new(Arc::new(PostgresGrammar::new()))
        .returning()
        .with_rows(vec![record(&[("uid", SqlValue::Int(41))])]);
    let id = conn
        .query()
        .from("users")
        .unwrap()
        .insert_get_id(&conn, &record(&[("email", text("a@x"))]), Some("uid"))
        .await
        .unwrap();

    assert_eq!(id, 41);
    let sent = conn.last();
    assert_eq!(sent.kind, "select");
    assert_eq!(
        sent.sql,
        r#"INSERT INTO "users" ("email") VALUES ($1) RETURNING "uid""#
    );
}

#[tokio::test]
async fn upsert_with_no_update_columns_inserts() {
    let conn = mysql_conn();
    let rows = [
        record(&[("email", text("a@x"))]),
        record(&[("email", text("b@x"))]),
    ];
    let affected = conn
        .query()
        .from("users")
        .unwrap()
        .upsert(&conn, &rows, &["email"], Some(&[][..]))
        .await
        .unwrap();

    assert_eq!(affected, 2);
    assert_eq!(conn.last().sql, "INSERT INTO `users` (`email`) VALUES (?), (?)");
}

#[tokio::test]
async fn upsert_defaults_to_updating_every_column() {
    let conn = mysql_conn().affecting(2);
    let rows = [record(&[("email", text("a@x")), ("name", text("A"))])];
    let affected = conn
        .query()
        .from("users")
        .unwrap()
        .upsert(&conn, &rows, &["email"], None)
        .await
        .unwrap();

    assert_eq!(affected, 2);
    let sent = conn.last();
    assert_eq!(sent.kind, "affecting");
    assert_eq!(
        sent.sql,
        "INSERT INTO `users` (`email`, `name`) VALUES (?, ?) \
         ON DUPLICATE KEY UPDATE `email` = VALUES(`email`), `name` = VALUES(`name`)"
    );
}

#[tokio::test]
async fn insert_or_ignore_fails_where_unsupported() {
    let conn = RecordingConnection::new(Arc::new(SqlServerGrammar::new()));
    let result = conn
        .query()
        .from("users")
        .unwrap()
        .insert_or_ignore(&conn, &[record(&[("email", text("a@x"))])])
        .await;

    assert!(matches!(
        result,
        Err(QueryError::Unsupported { grammar: "sqlsrv", .. })
    ));
    assert!(conn.executed().is_empty());
}

#[tokio::test]
async fn increment_adds_to_column() {
    let conn = RecordingConnection::new(Arc::new(PostgresGrammar::new())).affecting(1);
    let affected = conn
        .query()
        .from("users")
        .unwrap()
        .where_eq("id", 9)
        .unwrap()
        .increment(&conn, "votes", 2, &record(&[("name", text("A"))]))
        .await
        .unwrap();

    assert_eq!(affected, 1);
    let sent = conn.last();
    assert_eq!(
        sent.sql,
        r#"UPDATE "users" SET "votes" = "votes" + $1, "name" = $2 WHERE "id" = $3"#
    );
    assert_eq!(sent.bindings, vec![SqlValue::Int(2), text("A"), SqlValue::Int(9)]);
}

#[tokio::test]
async fn delete_reports_affected_rows() {
    let conn = mysql_conn().affecting(3);
    let deleted = conn
        .query()
        .from("users")
        .unwrap()
        .where_eq("active", false)
        .unwrap()
        .delete(&conn)
        .await
        .unwrap();

    assert_eq!(deleted, 3);
    assert_eq!(conn.last().sql, "DELETE FROM `users` WHERE `active` = ?");
}

#[tokio::test]
async fn sqlite_truncate_runs_both_statements() {
    let conn = RecordingConnection::new(Arc::new(SqliteGrammar::new()));
    conn.query()
        .from("users")
        .unwrap()
        .truncate(&conn)
        .await
        .unwrap();

    let executed = conn.executed();
    assert_eq!(executed.len(), 2);
    assert_eq!(
        executed[0].sql,
        "DELETE FROM `sqlite_sequence` WHERE `name` = ?"
    );
    assert_eq!(executed[0].bindings, vec![text("users")]);
    assert_eq!(executed[1].sql, "DELETE FROM `users`");
    assert!(executed.iter().all(|e| e.kind == "statement"));
}
