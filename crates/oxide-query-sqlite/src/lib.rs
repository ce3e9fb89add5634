//! # oxide-query-sqlite
//!
//! SQLite [`Connection`](oxide_query_core::connection::Connection) for
//! `oxide-query-core`, backed by an sqlx pool.
//!
//! Queries built on a [`SqliteConnection`] compile with the SQLite grammar:
//!
//! - identifiers are quoted with backticks
//! - `UPDATE` and `DELETE` with joins or a limit rewrite to
//!   `rowid IN (SELECT ...)`
//! - `truncate` deletes every row and resets the table's `sqlite_sequence`
//!   entry
//! - date parts use `strftime` and compare against `CAST(? AS TEXT)`
//!
//! ## Example
//!
//! ```rust,no_run
//! use oxide_query_core::prelude::*;
//! use oxide_query_sqlite::{connect, SqliteConfig};
//!
//! # async fn run() -> oxide_query_core::Result<()> {
//! let conn = connect(&SqliteConfig::new("sqlite://app.db")).await?;
//! let active = conn
//!     .query()
//!     .from("users")?
//!     .where_eq("active", true)?
//!     .count(&conn, &[])
//!     .await?;
//! # let _ = active;
//! # Ok(())
//! # }
//! ```

mod config;
mod connection;

pub use config::{connect, SqliteConfig};
pub use connection::SqliteConnection;
