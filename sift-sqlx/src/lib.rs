//! # sift-sqlx — SQLx backend for sift
//!
//! This crate provides the [SQLx](https://github.com/launchbadge/sqlx)-specific
//! driver for sift data sources. It depends on [`sift_core`] for the abstract
//! traits and types, and adds the query template, the SQL field capability, and
//! the driver that runs the count and page statements over an `sqlx::Pool<DB>`.
//!
//! # What's in this crate
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SqlxDriver`] | Driver turning bound fields into a count plus a page select |
//! | [`SqlxFactory`] | [`DriverFactory`](sift_core::DriverFactory) registering the driver under `"sqlx"` |
//! | [`SqlxDriverOptions`] | Per-data-source options the factory consumes: pool, template, count strategy |
//! | [`QueryBuilder`] | Template SELECT with validated identifiers and dialect placeholders |
//! | [`Entity`] | Row type contract: table, columns, identity key |
//! | [`SqlField`] | Built-in field for the text, number, boolean, date, time, datetime kinds |
//! | [`SqlxDriverExtension`] | Extension point contributing field types and pre-build hooks |
//! | [`SqlxResult`] | Executed page keyed by entity identity, with the unbounded count |
//!
//! # Feature flags
//!
//! Enable exactly one database driver:
//!
//! | Feature    | Driver |
//! |------------|--------|
//! | `sqlite`   | SQLite via `sqlx/sqlite` |
//! | `postgres` | PostgreSQL via `sqlx/postgres` |
//! | `mysql`    | MySQL via `sqlx/mysql` |
//!
//! # Quick start
//!
//! ```toml
//! [dependencies]
//! sift-sqlx = { version = "0.1", features = ["sqlite"] }
//! ```
//!
//! ```ignore
//! use sift_core::prelude::*;
//! use sift_sqlx::{Entity, SqlxDriverOptions, SqlxFactory};
//! use sqlx::Sqlite;
//!
//! #[derive(sqlx::FromRow)]
//! struct News { id: i64, title: String }
//!
//! impl Entity for News {
//!     type Id = i64;
//!     fn table_name() -> &'static str { "news" }
//!     fn columns() -> &'static [&'static str] { &["id", "title"] }
//!     fn id(&self) -> &i64 { &self.id }
//! }
//!
//! let mut manager = DriverFactoryManager::<News>::new();
//! manager.register(SqlxFactory::<Sqlite>::core());
//! let factory = DataSourceFactory::new(manager);
//!
//! let mut source = factory.create_data_source(
//!     "sqlx",
//!     Box::new(SqlxDriverOptions::new(pool.clone())),
//!     "news",
//! )?;
//! source.add_field("title", "text", Comparison::Contains)?;
//! let result = source.get_result().await?;
//! ```
//!
//! # Count strategy
//!
//! Every pass runs two statements: the page select and a count with the same
//! restrictions but no bounds. A plain `COUNT(*)` is wrong for templates whose
//! joins fan out rows; switch those to
//! [`CountStrategy::Wrapped`](crate::query::CountStrategy), which counts a
//! subquery instead.

pub mod driver;
pub mod entity;
pub mod error;
pub mod factory;
pub mod fields;
pub mod query;
pub mod result;

pub use driver::{SqlxDriver, DEFAULT_ALIAS, SQLX_DRIVER_TYPE};
pub use entity::Entity;
pub use error::SqlxDriverError;
pub use factory::{SqlxDriverOptions, SqlxFactory};
pub use fields::{CoreExtension, QueryFieldBuilder, SqlField, SqlFieldHandle, SqlxDriverExtension};
pub use query::{CompareOp, CountStrategy, Dialect, QueryBuilder, QueryError};
pub use result::SqlxResult;

/// Re-exports of the most commonly used types from both `sift-core` and this crate.
pub mod prelude {
    pub use crate::{
        CountStrategy, Entity, QueryBuilder, SqlxDriver, SqlxDriverExtension, SqlxDriverOptions,
        SqlxFactory, SqlxResult,
    };
    pub use sift_core::prelude::*;
}
