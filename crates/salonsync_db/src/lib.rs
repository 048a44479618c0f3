//! SQLite persistence for SalonSync
//!
//! Provides [`DbClient`], the schema bootstrap and [`SqlStore`], which
//! implements every storage port of `salonsync_common::services`.
//!
//! # Example
//!
//! ```rust,no_run
//! use salonsync_common::Repositories;
//! use salonsync_db::{init_schema, DbClient, SqlStore};
//! use std::sync::Arc;
//!
//! async fn setup_db() -> Result<Repositories, Box<dyn std::error::Error>> {
//!     let db_client = DbClient::from_url("sqlite://salonsync.db").await?;
//!     init_schema(&db_client).await?;
//!     Ok(Repositories::shared(Arc::new(SqlStore::new(db_client))))
//! }
//! ```

pub mod client;
pub mod error;
pub mod repositories;
pub mod schema;

pub use client::DbClient;
pub use error::DbError;
pub use repositories::SqlStore;
pub use schema::init_schema;
