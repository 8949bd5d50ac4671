//! MCP tool implementations.
//!
//! This module contains the database tool handlers:
//! - `query`: `execute_query`, run one statement with positional parameters
//! - `schema`: `get_table_info` and `describe_database`
//! - `envelope`: uniform success/error tool results
//! - `sql_validator`: statement classification for read-only mode

pub mod envelope;
pub mod query;
pub mod schema;
pub mod sql_validator;

pub use query::{ExecuteQueryInput, QueryParamInput, QueryToolHandler};
pub use schema::{GetTableInfoInput, SchemaToolHandler};

/// Names of every tool the server exposes.
pub const TOOL_NAMES: [&str; 3] = ["execute_query", "get_table_info", "describe_database"];
