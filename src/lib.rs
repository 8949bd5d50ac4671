//! MySQL MCP Server Library
//!
//! This library exposes one MySQL database to AI assistants through the
//! Model Context Protocol: three tools (`execute_query`, `get_table_info`,
//! `describe_database`) and a set of `mysql://` schema resources.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod resources;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::DbError;
pub use mcp::MySqlService;
