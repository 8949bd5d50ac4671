//! Resource listing and reading.

use crate::db::{ConnectionProvider, QueryExecutor, SchemaInspector};
use crate::error::{DbError, DbResult};
use crate::models::TableSample;
use crate::resources::uri::ResourceUri;
use rmcp::model::{AnnotateAble, RawResource, Resource, ResourceContents};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

pub const JSON_MIME_TYPE: &str = "application/json";

fn descriptor(uri: ResourceUri, name: String, description: String) -> Resource {
    let mut raw = RawResource::new(uri.to_string(), name);
    raw.description = Some(description);
    raw.mime_type = Some(JSON_MIME_TYPE.to_string());
    raw.no_annotation()
}

/// Descriptors for the fixed catalog resources followed by two per table.
pub fn build_descriptors<S: AsRef<str>>(table_names: &[S]) -> Vec<Resource> {
    let mut resources = Vec::with_capacity(3 + 2 * table_names.len());

    resources.push(descriptor(
        ResourceUri::Tables,
        "Database Tables".to_string(),
        "List of all tables in the database".to_string(),
    ));
    resources.push(descriptor(
        ResourceUri::Views,
        "Database Views".to_string(),
        "List of all views in the database".to_string(),
    ));
    resources.push(descriptor(
        ResourceUri::Procedures,
        "Stored Procedures".to_string(),
        "List of all stored procedures in the database".to_string(),
    ));

    for name in table_names {
        let name = name.as_ref();
        resources.push(descriptor(
            ResourceUri::table(name),
            format!("Table: {}", name),
            format!("Structure and sample data for table {}", name),
        ));
        resources.push(descriptor(
            ResourceUri::table_schema(name),
            format!("Schema: {}", name),
            format!("Schema information for table {}", name),
        ));
    }

    resources
}

/// Wrap a JSON payload as the single content item of a resource read.
pub fn json_contents<T: Serialize>(uri: &str, payload: &T) -> DbResult<ResourceContents> {
    let text = serde_json::to_string_pretty(payload)
        .map_err(|e| DbError::internal(format!("Failed to serialize resource {}: {}", uri, e)))?;

    let mut contents = ResourceContents::text(text, uri);
    if let ResourceContents::TextResourceContents { mime_type, .. } = &mut contents {
        *mime_type = Some(JSON_MIME_TYPE.to_string());
    }
    Ok(contents)
}

/// Handler behind `resources/list` and `resources/read`.
pub struct ResourceHandler {
    provider: Arc<ConnectionProvider>,
    executor: QueryExecutor,
}

impl ResourceHandler {
    pub fn new(provider: Arc<ConnectionProvider>, executor: QueryExecutor) -> Self {
        Self { provider, executor }
    }

    /// Regenerate the descriptor list from the live catalog.
    pub async fn list(&self) -> DbResult<Vec<Resource>> {
        let pool = self.provider.get_pool().await?;
        let inspector = SchemaInspector::new(&pool, self.provider.database(), &self.executor);

        let names: Vec<String> = inspector
            .list_table_summaries()
            .await?
            .into_iter()
            .map(|t| t.name)
            .collect();

        let resources = build_descriptors(&names);
        debug!(tables = names.len(), resources = resources.len(), "Listed resources");
        Ok(resources)
    }

    /// Read one resource. Unrecognised URIs fail before the database is touched.
    pub async fn read(&self, uri: &str) -> DbResult<ResourceContents> {
        let resource = ResourceUri::parse(uri).ok_or_else(|| DbError::unknown_resource(uri))?;

        let pool = self.provider.get_pool().await?;
        let inspector = SchemaInspector::new(&pool, self.provider.database(), &self.executor);

        let contents = match &resource {
            ResourceUri::Tables => json_contents(uri, &inspector.list_tables().await?),
            ResourceUri::Views => json_contents(uri, &inspector.list_views().await?),
            ResourceUri::Procedures => json_contents(uri, &inspector.list_procedures().await?),
            ResourceUri::Table(name) => {
                let table = inspector.resolve_table(name).await?;
                let structure = inspector.describe_columns(&table).await?;
                let sample_data = inspector.sample_rows(&table).await?;
                json_contents(
                    uri,
                    &TableSample {
                        table_name: table.name,
                        structure,
                        sample_size: sample_data.len(),
                        sample_data,
                    },
                )
            }
            ResourceUri::TableSchema(name) => {
                json_contents(uri, &inspector.describe_table(name).await?)
            }
        }?;

        info!(uri = %uri, "Resource read");
        Ok(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConnectionSettings, PoolOptions};

    #[test]
    fn test_descriptor_count_is_three_plus_two_per_table() {
        assert_eq!(build_descriptors::<&str>(&[]).len(), 3);

        let resources = build_descriptors(&["customers", "orders"]);
        assert_eq!(resources.len(), 7);

        let uris: Vec<&str> = resources.iter().map(|r| r.uri.as_str()).collect();
        assert_eq!(
            uris,
            vec![
                "mysql://tables",
                "mysql://views",
                "mysql://procedures",
                "mysql://table/customers",
                "mysql://table/customers/schema",
                "mysql://table/orders",
                "mysql://table/orders/schema",
            ]
        );
    }

    #[test]
    fn test_descriptors_are_json() {
        for resource in build_descriptors(&["t"]) {
            assert_eq!(resource.mime_type.as_deref(), Some(JSON_MIME_TYPE));
            assert!(resource.description.is_some());
        }
    }

    #[test]
    fn test_json_contents_sets_mime_type() {
        let contents = json_contents("mysql://views", &Vec::<u8>::new()).unwrap();
        match contents {
            ResourceContents::TextResourceContents {
                uri,
                mime_type,
                text,
                ..
            } => {
                assert_eq!(uri, "mysql://views");
                assert_eq!(mime_type.as_deref(), Some(JSON_MIME_TYPE));
                assert_eq!(text, "[]");
            }
            other => panic!("unexpected contents: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_uri_fails_without_connecting() {
        let provider = Arc::new(ConnectionProvider::new(
            ConnectionSettings::new("127.0.0.1", 1, "root", None, "app"),
            PoolOptions::default(),
        ));
        let handler = ResourceHandler::new(provider.clone(), QueryExecutor::default());

        let err = handler.read("mysql://functions").await.unwrap_err();
        assert!(matches!(err, DbError::UnknownResource { .. }));
        assert_eq!(err.to_string(), "Unknown resource: mysql://functions");
        assert!(!provider.is_connected());
    }
}
