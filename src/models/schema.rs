//! Schema-related data models.
//!
//! Payload types for catalog listings and table descriptions. All of them
//! serialize with camelCase keys.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Type of a table-like object in `information_schema.TABLES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableType {
    Table,
    View,
    SystemView,
}

impl TableType {
    /// Parse table type from the `TABLE_TYPE` column.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "VIEW" => Self::View,
            "SYSTEM VIEW" => Self::SystemView,
            _ => Self::Table, // BASE TABLE and anything unexpected
        }
    }
}

impl std::fmt::Display for TableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::View => write!(f, "view"),
            Self::SystemView => write!(f, "system_view"),
        }
    }
}

/// Detailed table entry served by the `tables` resource.
///
/// Row counts and sizes are InnoDB estimates and change over time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub name: String,
    pub table_type: TableType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
    /// Estimated row count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u64>,
    /// Bytes (excluding indexes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_size: Option<u64>,
    /// Bytes (data + indexes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_increment: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl TableInfo {
    pub fn new(name: impl Into<String>, table_type: TableType) -> Self {
        Self {
            name: name.into(),
            table_type,
            engine: None,
            collation: None,
            row_count: None,
            data_size: None,
            index_size: None,
            total_size: None,
            auto_increment: None,
            created_at: None,
            updated_at: None,
            comment: None,
        }
    }

    /// Set data and index sizes; the total is derived from both.
    pub fn with_sizes(mut self, data_size: Option<u64>, index_size: Option<u64>) -> Self {
        self.data_size = data_size;
        self.index_size = index_size;
        self.total_size = match (data_size, index_size) {
            (Some(d), Some(i)) => Some(d + i),
            (Some(d), None) => Some(d),
            _ => None,
        };
        self
    }
}

/// Stable table entry used by `describe_database`.
///
/// Only columns that do not drift while the schema is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewInfo {
    pub name: String,
    /// May be empty when the current user lacks SHOW VIEW on it.
    pub definition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_option: Option<String>,
    pub is_updatable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_altered: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_data_access: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    pub name: String,
    /// Full type (e.g., `varchar(30)`, `bigint unsigned`)
    pub data_type: String,
    pub nullable: bool,
    /// Default value with appropriate JSON type based on column data type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<JsonValue>,
    pub is_primary_key: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_set: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
    /// e.g. `auto_increment`, `DEFAULT_GENERATED on update CURRENT_TIMESTAMP`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
            default_value: None,
            is_primary_key: false,
            character_set: None,
            collation: None,
            extra: None,
            comment: None,
        }
    }

    pub fn with_primary_key(mut self, is_pk: bool) -> Self {
        self.is_primary_key = is_pk;
        self
    }

    /// Set the default value from a string, converting to appropriate JSON type
    /// based on the column's data_type.
    pub fn with_default_str(mut self, default_str: &str) -> Self {
        self.default_value = Some(parse_default_value(default_str, &self.data_type));
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    pub name: String,
    pub column: String,
    pub references_table: String,
    pub references_column: String,
    pub on_delete: ForeignKeyAction,
    pub on_update: ForeignKeyAction,
}

/// Foreign key referential action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForeignKeyAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ForeignKeyAction {
    /// Parse from `REFERENTIAL_CONSTRAINTS.UPDATE_RULE` / `DELETE_RULE`.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "CASCADE" => Self::Cascade,
            "SET NULL" => Self::SetNull,
            "SET DEFAULT" => Self::SetDefault,
            "RESTRICT" => Self::Restrict,
            _ => Self::NoAction,
        }
    }
}

/// One index, with its columns in `SEQ_IN_INDEX` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexInfo {
    pub name: String,
    pub columns: Vec<String>,
    pub is_unique: bool,
    pub is_primary: bool,
    /// BTREE, HASH, FULLTEXT, SPATIAL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_type: Option<String>,
}

impl IndexInfo {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let is_primary = name == "PRIMARY";
        Self {
            name,
            columns: Vec::new(),
            is_unique: is_primary,
            is_primary,
            index_type: None,
        }
    }

    pub fn with_unique(mut self, is_unique: bool) -> Self {
        self.is_unique = is_unique || self.is_primary;
        self
    }

    pub fn with_index_type(mut self, index_type: impl Into<String>) -> Self {
        self.index_type = Some(index_type.into());
        self
    }
}

/// Full description of one table: `get_table_info` and the table schema resource.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescription {
    pub table_name: String,
    pub table_type: TableType,
    pub columns: Vec<ColumnDefinition>,
    pub primary_key: Vec<String>,
    pub indexes: Vec<IndexInfo>,
    pub foreign_keys: Vec<ForeignKey>,
    /// Verbatim `SHOW CREATE TABLE` / `SHOW CREATE VIEW` output
    pub create_statement: String,
}

/// Structure plus a bounded sample of rows, served by the table resource.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSample {
    pub table_name: String,
    pub structure: Vec<ColumnDefinition>,
    pub sample_data: Vec<serde_json::Map<String, JsonValue>>,
    pub sample_size: usize,
}

/// Payload of `describe_database`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseOverview {
    pub database: String,
    pub tables: usize,
    pub views: usize,
    pub procedures: usize,
    pub table_list: Vec<TableSummary>,
    pub view_list: Vec<ViewInfo>,
    pub procedure_list: Vec<ProcedureInfo>,
    /// RFC 3339 timestamp of the snapshot
    pub analyzed_at: String,
}

impl DatabaseOverview {
    /// Build an overview whose counts always match the list lengths.
    pub fn new(
        database: impl Into<String>,
        table_list: Vec<TableSummary>,
        view_list: Vec<ViewInfo>,
        procedure_list: Vec<ProcedureInfo>,
        analyzed_at: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            tables: table_list.len(),
            views: view_list.len(),
            procedures: procedure_list.len(),
            table_list,
            view_list,
            procedure_list,
            analyzed_at: analyzed_at.into(),
        }
    }
}

/// Parse a default value string into the appropriate JSON type based on column data type.
///
/// - Integer types (int, bigint, smallint, tinyint) → JSON Number
/// - Float types (float, double, real) → JSON Number
/// - `tinyint(1)` / boolean → JSON Number (MySQL stores booleans as integers)
/// - JSON → Parsed JSON value
/// - Decimal → JSON String (preserve precision)
/// - String types and expressions (CURRENT_TIMESTAMP, ...) → JSON String
pub fn parse_default_value(default_str: &str, data_type: &str) -> JsonValue {
    let dt_lower = data_type.to_lowercase();

    if dt_lower.contains("int") {
        if let Ok(n) = default_str.parse::<i64>() {
            return JsonValue::Number(n.into());
        }
    }

    if (dt_lower.starts_with("float") || dt_lower.starts_with("double") || dt_lower == "real")
        && !dt_lower.contains("decimal")
    {
        if let Some(num) = default_str
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
        {
            return JsonValue::Number(num);
        }
    }

    if dt_lower == "json" {
        if let Ok(parsed) = serde_json::from_str(default_str) {
            return parsed;
        }
    }

    JsonValue::String(default_str.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_type_parsing() {
        assert_eq!(TableType::parse("BASE TABLE"), TableType::Table);
        assert_eq!(TableType::parse("VIEW"), TableType::View);
        assert_eq!(TableType::parse("SYSTEM VIEW"), TableType::SystemView);
        assert_eq!(TableType::parse("base table"), TableType::Table);
    }

    #[test]
    fn test_foreign_key_action_parsing() {
        assert_eq!(
            ForeignKeyAction::parse("CASCADE"),
            ForeignKeyAction::Cascade
        );
        assert_eq!(
            ForeignKeyAction::parse("SET NULL"),
            ForeignKeyAction::SetNull
        );
        assert_eq!(
            ForeignKeyAction::parse("UNKNOWN"),
            ForeignKeyAction::NoAction
        );
        assert_eq!(
            serde_json::to_value(ForeignKeyAction::SetNull).unwrap(),
            json!("SET_NULL")
        );
    }

    #[test]
    fn test_primary_index_is_unique() {
        let index = IndexInfo::new("PRIMARY").with_unique(false);
        assert!(index.is_primary);
        assert!(index.is_unique);

        let secondary = IndexInfo::new("idx_email").with_unique(true);
        assert!(!secondary.is_primary);
        assert!(secondary.is_unique);
    }

    #[test]
    fn test_table_info_sizes() {
        let table = TableInfo::new("users", TableType::Table).with_sizes(Some(16384), Some(8192));
        assert_eq!(table.total_size, Some(24576));

        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["dataSize"], 16384);
        assert_eq!(json["tableType"], "table");
        assert!(json.get("createdAt").is_none());
    }

    #[test]
    fn test_overview_counts_match_lists() {
        let overview = DatabaseOverview::new(
            "shop",
            vec![
                TableSummary {
                    name: "orders".into(),
                    engine: Some("InnoDB".into()),
                    comment: None,
                },
                TableSummary {
                    name: "users".into(),
                    engine: Some("InnoDB".into()),
                    comment: None,
                },
            ],
            Vec::new(),
            Vec::new(),
            "2025-01-01T00:00:00Z",
        );

        let json = serde_json::to_value(&overview).unwrap();
        assert_eq!(json["tables"], 2);
        assert_eq!(json["views"], 0);
        assert_eq!(json["procedures"], 0);
        assert_eq!(json["tableList"].as_array().unwrap().len(), 2);
        assert_eq!(json["analyzedAt"], "2025-01-01T00:00:00Z");
    }

    #[test]
    fn test_parse_default_value_integer_types() {
        assert_eq!(parse_default_value("0", "tinyint unsigned"), json!(0));
        assert_eq!(parse_default_value("42", "int"), json!(42));
        assert_eq!(parse_default_value("-100", "bigint"), json!(-100));
    }

    #[test]
    fn test_parse_default_value_float_types() {
        assert_eq!(parse_default_value("1.5", "float"), json!(1.5));
        assert_eq!(parse_default_value("99.99", "double"), json!(99.99));
    }

    #[test]
    fn test_parse_default_value_decimal_stays_string() {
        assert_eq!(
            parse_default_value("123.456789", "decimal(10,6)"),
            json!("123.456789")
        );
    }

    #[test]
    fn test_parse_default_value_expressions() {
        assert_eq!(
            parse_default_value("CURRENT_TIMESTAMP", "timestamp"),
            json!("CURRENT_TIMESTAMP")
        );
        assert_eq!(parse_default_value("hello", "varchar(255)"), json!("hello"));
    }

    #[test]
    fn test_parse_default_value_json() {
        assert_eq!(parse_default_value("{}", "json"), json!({}));
        assert_eq!(
            parse_default_value("not valid json", "json"),
            json!("not valid json")
        );
    }
}
