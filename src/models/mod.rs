//! Data models for the MySQL MCP Server.
//!
//! This module re-exports all model types used throughout the application.

pub mod query;
pub mod schema;

// Re-export commonly used types
pub use query::{FieldMetadata, QueryParam, QueryResponse, StatementOutcome};
pub use schema::{
    ColumnDefinition, DatabaseOverview, ForeignKey, ForeignKeyAction, IndexInfo, ProcedureInfo,
    TableDescription, TableInfo, TableSample, TableSummary, TableType, ViewInfo,
};
