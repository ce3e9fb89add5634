//! # oxide-query-core
//!
//! A fluent SQL query builder that compiles to MySQL, PostgreSQL, SQLite and
//! SQL Server.
//!
//! This crate provides:
//! - A fragment lexer and parser for column, table and join strings such as
//!   `users.email as mail` or `options->languages`
//! - An enum AST the builder accumulates and the dialect visitors render
//! - Per-dialect grammars producing SQL plus the bindings in placeholder order
//! - Object-safe [`Connection`](connection::Connection) and
//!   [`Processor`](connection::Processor) traits with async execution helpers
//!
//! ## Building queries
//!
//! ```rust
//! use std::sync::Arc;
//! use oxide_query_core::prelude::*;
//!
//! let query = QueryBuilder::new(Arc::new(PostgresGrammar::new()))
//!     .from("users")?
//!     .where_eq("active", true)?
//!     .where_in("role", ["admin", "owner"])?
//!     .order_by("created_at", "desc")?
//!     .limit(10);
//!
//! let compiled = query.compile()?;
//! assert_eq!(
//!     compiled.sql,
//!     r#"SELECT * FROM "users" WHERE "active" = $1 AND "role" IN ($2, $3) ORDER BY "created_at" DESC LIMIT 10"#
//! );
//! assert_eq!(compiled.values().len(), 3);
//! # Ok::<(), oxide_query_core::QueryError>(())
//! ```
//!
//! ## Values never reach the SQL text
//!
//! ```rust
//! use std::sync::Arc;
//! use oxide_query_core::prelude::*;
//!
//! let user_input = "'; DROP TABLE users; --";
//! let compiled = QueryBuilder::new(Arc::new(MySqlGrammar::new()))
//!     .from("users")?
//!     .where_eq("name", user_input)?
//!     .compile()?;
//!
//! assert_eq!(compiled.sql, "SELECT * FROM `users` WHERE `name` = ?");
//! assert_eq!(compiled.values(), &[SqlValue::Text(user_input.to_string())]);
//! # Ok::<(), oxide_query_core::QueryError>(())
//! ```

pub mod ast;
pub mod binding;
pub mod builder;
pub mod config;
pub mod connection;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod visitor;

pub use binding::{Bindings, CompiledQuery};
pub use builder::{col, QueryBuilder, SqlValue};
pub use error::{QueryError, Result};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{FragmentParser, ParseError};

/// Builder traits and grammars in one import.
pub mod prelude {
    pub use crate::ast::{AggregateFunction, Conjunction, Lock};
    pub use crate::builder::{
        col, AggregateBuilder, BuilderState, GroupByClauseBuilder, HavingClauseBuilder,
        JoinClauseBuilder, LimitOffsetClauseBuilder, OrderByClauseBuilder, QueryBuilder, Record,
        SqlValue, ToSqlValue, UnionClauseBuilder, WhereClauseBuilder, WhereDateBuilder,
        WhereJsonBuilder, WherePredicateBuilder,
    };
    pub use crate::config::{DatabaseConfig, Driver};
    pub use crate::connection::{Connection, Row};
    pub use crate::grammar::{
        Grammar, MySqlGrammar, PostgresGrammar, SqlServerGrammar, SqliteGrammar,
    };
}
