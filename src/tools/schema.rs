//! Schema introspection tools.
//!
//! This module implements the `get_table_info` and `describe_database` MCP tools.

use crate::db::{ConnectionProvider, QueryExecutor, SchemaInspector};
use crate::error::DbResult;
use crate::models::{DatabaseOverview, TableDescription};
use chrono::{SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Input for the get_table_info tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetTableInfoInput {
    /// Name of a table or view in the configured database
    #[serde(rename = "tableName")]
    pub table_name: String,
}

/// Handler for schema introspection operations.
pub struct SchemaToolHandler {
    provider: Arc<ConnectionProvider>,
    executor: QueryExecutor,
}

impl SchemaToolHandler {
    pub fn new(provider: Arc<ConnectionProvider>, executor: QueryExecutor) -> Self {
        Self { provider, executor }
    }

    /// Columns, keys, indexes and DDL of one table.
    pub async fn get_table_info(&self, input: GetTableInfoInput) -> DbResult<TableDescription> {
        let pool = self.provider.get_pool().await?;
        let inspector = SchemaInspector::new(&pool, self.provider.database(), &self.executor);

        let description = inspector.describe_table(&input.table_name).await?;

        info!(
            table = %description.table_name,
            columns = description.columns.len(),
            indexes = description.indexes.len(),
            foreign_keys = description.foreign_keys.len(),
            "get_table_info completed"
        );

        Ok(description)
    }

    /// Base tables, views and procedures of the configured database.
    pub async fn describe_database(&self) -> DbResult<DatabaseOverview> {
        let pool = self.provider.get_pool().await?;
        let database = self.provider.database();
        let inspector = SchemaInspector::new(&pool, database, &self.executor);

        let tables = inspector.list_table_summaries().await?;
        let views = inspector.list_views().await?;
        let procedures = inspector.list_procedures().await?;

        let overview = DatabaseOverview::new(
            database,
            tables,
            views,
            procedures,
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        );

        info!(
            database = %overview.database,
            tables = overview.tables,
            views = overview.views,
            procedures = overview.procedures,
            "describe_database completed"
        );

        Ok(overview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConnectionSettings, PoolOptions};
    use crate::error::DbError;

    #[test]
    fn test_get_table_info_input_uses_camel_case() {
        let input: GetTableInfoInput =
            serde_json::from_value(serde_json::json!({ "tableName": "users" })).unwrap();
        assert_eq!(input.table_name, "users");

        let missing = serde_json::from_value::<GetTableInfoInput>(serde_json::json!({
            "table_name": "users"
        }));
        assert!(missing.is_err());
    }

    #[test]
    fn test_get_table_info_schema_requires_table_name() {
        let schema = serde_json::to_value(schemars::schema_for!(GetTableInfoInput)).unwrap();
        let required = schema["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "tableName"));
    }

    #[tokio::test]
    async fn test_describe_database_reports_connection_failure() {
        let provider = Arc::new(ConnectionProvider::new(
            ConnectionSettings::new("127.0.0.1", 1, "root", None, "app"),
            PoolOptions {
                acquire_timeout_secs: 1,
                ..PoolOptions::default()
            },
        ));
        let handler = SchemaToolHandler::new(provider, QueryExecutor::default());

        let err = handler.describe_database().await.unwrap_err();
        assert!(matches!(err, DbError::Connection { .. }));
    }
}
