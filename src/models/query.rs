//! Query-related data models.
//!
//! This module defines the parameter, field and result types for
//! `execute_query`.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A parameter value for parameterized queries.
///
/// Deserialized from whatever JSON the caller sends; arrays and objects are
/// bound as MySQL JSON values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryParam {
    Null,
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    Float(f64),
    String(String),
    Json(JsonValue),
}

/// Name and MySQL type of one result column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadata {
    pub name: String,
    /// MySQL type name as reported by the driver (e.g. "VARCHAR", "BIGINT UNSIGNED")
    #[serde(rename = "type")]
    pub type_name: String,
}

impl FieldMetadata {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Everything one executed statement produced.
#[derive(Debug, Clone, Default)]
pub struct StatementOutcome {
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    pub fields: Vec<FieldMetadata>,
    pub rows_affected: u64,
    /// Only set when the statement generated an AUTO_INCREMENT value.
    pub last_insert_id: Option<u64>,
    pub execution_time_ms: u64,
}

impl StatementOutcome {
    /// Get the number of rows in the result.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Success payload of `execute_query`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub success: bool,
    pub query: String,
    pub params: Vec<QueryParam>,
    /// Always equals `data.len()`
    pub row_count: usize,
    pub data: Vec<serde_json::Map<String, JsonValue>>,
    pub fields: Vec<FieldMetadata>,
    pub affected_rows: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_insert_id: Option<u64>,
    pub execution_time_ms: u64,
}

impl QueryResponse {
    pub fn new(query: impl Into<String>, params: Vec<QueryParam>, outcome: StatementOutcome) -> Self {
        Self {
            success: true,
            query: query.into(),
            params,
            row_count: outcome.rows.len(),
            data: outcome.rows,
            fields: outcome.fields,
            affected_rows: outcome.rows_affected,
            last_insert_id: outcome.last_insert_id,
            execution_time_ms: outcome.execution_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_param_deserialize_untagged() {
        let params: Vec<QueryParam> =
            serde_json::from_value(json!([null, true, 7, 1.5, "x", [1, 2]])).unwrap();
        assert_eq!(
            params,
            vec![
                QueryParam::Null,
                QueryParam::Bool(true),
                QueryParam::Int(7),
                QueryParam::Float(1.5),
                QueryParam::String("x".to_string()),
                QueryParam::Json(json!([1, 2])),
            ]
        );
    }

    #[test]
    fn test_field_metadata_serializes_type_key() {
        let value = serde_json::to_value(FieldMetadata::new("id", "BIGINT")).unwrap();
        assert_eq!(value, json!({"name": "id", "type": "BIGINT"}));
    }

    #[test]
    fn test_response_row_count_matches_data() {
        let mut row = serde_json::Map::new();
        row.insert("id".to_string(), json!(1));
        let outcome = StatementOutcome {
            rows: vec![row.clone(), row],
            fields: vec![FieldMetadata::new("id", "INT")],
            ..Default::default()
        };

        let response = QueryResponse::new("SELECT id FROM t", Vec::new(), outcome);
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["success"], true);
        assert_eq!(value["rowCount"], 2);
        assert_eq!(value["data"].as_array().unwrap().len(), 2);
        assert_eq!(value["affectedRows"], 0);
        assert!(value.get("lastInsertId").is_none());
    }

    #[test]
    fn test_response_includes_last_insert_id_when_set() {
        let outcome = StatementOutcome {
            rows_affected: 1,
            last_insert_id: Some(42),
            ..Default::default()
        };
        let value = serde_json::to_value(QueryResponse::new(
            "INSERT INTO t VALUES (?)",
            vec![QueryParam::Int(5)],
            outcome,
        ))
        .unwrap();

        assert_eq!(value["rowCount"], 0);
        assert_eq!(value["affectedRows"], 1);
        assert_eq!(value["lastInsertId"], 42);
        assert_eq!(value["params"], json!([5]));
    }
}
