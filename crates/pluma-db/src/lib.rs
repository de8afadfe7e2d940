//! Pluma Database — SurrealDB connection management and repository
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - SurrealDB implementations of the `pluma-core` repository traits
//!
//! Compound mutations (follow/bookmark toggles, comment creation,
//! cascading deletes) run inside SurrealDB transactions so that
//! reference sets and their denormalized counters can never be
//! observed out of step.

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};
