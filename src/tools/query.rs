//! Statement execution tool.
//!
//! This module implements the `execute_query` MCP tool. Parameters are bound
//! positionally to `?` placeholders; the SQL text is sent as given.

use crate::db::{ConnectionProvider, QueryExecutor};
use crate::error::{DbError, DbResult};
use crate::models::{QueryParam, QueryResponse};
use crate::tools::sql_validator;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::info;

/// Input for the execute_query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExecuteQueryInput {
    /// SQL statement to execute. Use `?` placeholders for parameters.
    pub query: String,
    /// Positional parameters bound to the `?` placeholders, in order
    #[serde(default)]
    pub params: Vec<QueryParamInput>,
}

/// Input parameter that can be various JSON types.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum QueryParamInput {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// String value
    String(String),
    /// Array or object, bound as a JSON document
    Json(JsonValue),
}

impl From<QueryParamInput> for QueryParam {
    fn from(input: QueryParamInput) -> Self {
        match input {
            QueryParamInput::Null => QueryParam::Null,
            QueryParamInput::Bool(v) => QueryParam::Bool(v),
            QueryParamInput::Int(v) => QueryParam::Int(v),
            QueryParamInput::Float(v) => QueryParam::Float(v),
            QueryParamInput::String(v) => QueryParam::String(v),
            QueryParamInput::Json(v) => QueryParam::Json(v),
        }
    }
}

/// Handler for statement execution.
pub struct QueryToolHandler {
    provider: Arc<ConnectionProvider>,
    executor: QueryExecutor,
    read_only: bool,
}

impl QueryToolHandler {
    pub fn new(provider: Arc<ConnectionProvider>, executor: QueryExecutor, read_only: bool) -> Self {
        Self {
            provider,
            executor,
            read_only,
        }
    }

    /// Handle the execute_query tool call.
    ///
    /// In read-only mode the statement is classified before the database is
    /// touched, so a rejected write never opens a connection.
    pub async fn execute_query(&self, input: ExecuteQueryInput) -> DbResult<QueryResponse> {
        if input.query.trim().is_empty() {
            return Err(DbError::invalid_input("query must not be empty"));
        }

        if self.read_only {
            sql_validator::validate_readonly(&input.query)?;
        }

        let params: Vec<QueryParam> = input.params.into_iter().map(Into::into).collect();
        let pool = self.provider.get_pool().await?;

        let outcome = self.executor.execute(&pool, &input.query, &params).await?;

        info!(
            rows = outcome.row_count(),
            affected = outcome.rows_affected,
            params = params.len(),
            elapsed_ms = outcome.execution_time_ms,
            "execute_query completed"
        );

        Ok(QueryResponse::new(input.query, params, outcome))
    }
}
