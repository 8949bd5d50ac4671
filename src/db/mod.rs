//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Lazy connection pool management
//! - Statement execution with positional parameters
//! - Schema introspection over `information_schema`
//! - MySQL to JSON value mapping

pub mod executor;
pub mod params;
pub mod pool;
pub mod schema;
pub mod types;

pub use executor::QueryExecutor;
pub use pool::ConnectionProvider;
pub use schema::{ResolvedTable, SchemaInspector, quote_identifier};
