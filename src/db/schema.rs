//! Schema introspection module.
//!
//! Every catalog query the server issues lives here, scoped to the
//! configured database and ordered by name so repeated calls on an unchanged
//! schema return identical lists.
//!
//! Caller-supplied table names never reach SQL text directly: they are first
//! resolved against `information_schema.TABLES` and only the canonical name
//! that comes back is quoted into `SHOW CREATE TABLE` / `SELECT ... FROM`.

use crate::db::executor::QueryExecutor;
use crate::db::types::RowToJson;
use crate::error::{DbError, DbResult};
use crate::models::{
    ColumnDefinition, ForeignKey, ForeignKeyAction, IndexInfo, ProcedureInfo, TableDescription,
    TableInfo, TableSummary, TableType, ViewInfo,
};
use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;
use sqlx::mysql::MySqlRow;
use sqlx::{Executor, MySqlPool, Row};
use tracing::debug;

/// Maximum rows returned by [`SchemaInspector::sample_rows`].
pub const SAMPLE_ROW_LIMIT: u32 = 10;

// =============================================================================
// SQL Query Templates
// =============================================================================

mod queries {
    pub const LIST_TABLES_DETAILED: &str = r#"
        SELECT
            CONVERT(TABLE_NAME USING utf8mb4) AS TABLE_NAME,
            CONVERT(TABLE_TYPE USING utf8mb4) AS TABLE_TYPE,
            CONVERT(ENGINE USING utf8mb4) AS ENGINE,
            CONVERT(TABLE_COLLATION USING utf8mb4) AS TABLE_COLLATION,
            DATA_LENGTH AS DATA_SIZE,
            INDEX_LENGTH AS INDEX_SIZE,
            TABLE_ROWS AS ROW_COUNT,
            AUTO_INCREMENT,
            CREATE_TIME AS CREATED_AT,
            UPDATE_TIME AS UPDATED_AT,
            CONVERT(TABLE_COMMENT USING utf8mb4) AS TABLE_COMMENT
        FROM information_schema.TABLES
        WHERE TABLE_SCHEMA = ?
        AND TABLE_TYPE = 'BASE TABLE'
        ORDER BY TABLE_NAME
        "#;

    // Stable columns only: no row estimates, sizes or timestamps
    pub const LIST_TABLE_SUMMARIES: &str = r#"
        SELECT
            CONVERT(TABLE_NAME USING utf8mb4) AS TABLE_NAME,
            CONVERT(ENGINE USING utf8mb4) AS ENGINE,
            CONVERT(TABLE_COMMENT USING utf8mb4) AS TABLE_COMMENT
        FROM information_schema.TABLES
        WHERE TABLE_SCHEMA = ?
        AND TABLE_TYPE = 'BASE TABLE'
        ORDER BY TABLE_NAME
        "#;

    pub const LIST_VIEWS: &str = r#"
        SELECT
            CONVERT(TABLE_NAME USING utf8mb4) AS TABLE_NAME,
            CONVERT(VIEW_DEFINITION USING utf8mb4) AS VIEW_DEFINITION,
            CONVERT(CHECK_OPTION USING utf8mb4) AS CHECK_OPTION,
            CONVERT(IS_UPDATABLE USING utf8mb4) AS IS_UPDATABLE,
            CONVERT(DEFINER USING utf8mb4) AS DEFINER,
            CONVERT(SECURITY_TYPE USING utf8mb4) AS SECURITY_TYPE
        FROM information_schema.VIEWS
        WHERE TABLE_SCHEMA = ?
        ORDER BY TABLE_NAME
        "#;

    pub const LIST_PROCEDURES: &str = r#"
        SELECT
            CONVERT(ROUTINE_NAME USING utf8mb4) AS ROUTINE_NAME,
            CONVERT(ROUTINE_DEFINITION USING utf8mb4) AS ROUTINE_DEFINITION,
            CREATED,
            LAST_ALTERED,
            CONVERT(ROUTINE_COMMENT USING utf8mb4) AS ROUTINE_COMMENT,
            CONVERT(DEFINER USING utf8mb4) AS DEFINER,
            CONVERT(SECURITY_TYPE USING utf8mb4) AS SECURITY_TYPE,
            CONVERT(SQL_DATA_ACCESS USING utf8mb4) AS SQL_DATA_ACCESS
        FROM information_schema.ROUTINES
        WHERE ROUTINE_SCHEMA = ?
        AND ROUTINE_TYPE = 'PROCEDURE'
        ORDER BY ROUTINE_NAME
        "#;

    pub const RESOLVE_TABLE: &str = r#"
        SELECT
            CONVERT(TABLE_NAME USING utf8mb4) AS TABLE_NAME,
            CONVERT(TABLE_TYPE USING utf8mb4) AS TABLE_TYPE
        FROM information_schema.TABLES
        WHERE TABLE_SCHEMA = ?
        AND TABLE_NAME = ?
        AND TABLE_TYPE IN ('BASE TABLE', 'VIEW')
        "#;

    pub const DESCRIBE_COLUMNS: &str = r#"
        SELECT
            CONVERT(COLUMN_NAME USING utf8mb4) AS COLUMN_NAME,
            CONVERT(COLUMN_TYPE USING utf8mb4) AS COLUMN_TYPE,
            CONVERT(IS_NULLABLE USING utf8mb4) AS IS_NULLABLE,
            CONVERT(COLUMN_DEFAULT USING utf8mb4) AS COLUMN_DEFAULT,
            CONVERT(COLUMN_KEY USING utf8mb4) AS COLUMN_KEY,
            CONVERT(EXTRA USING utf8mb4) AS EXTRA,
            CONVERT(CHARACTER_SET_NAME USING utf8mb4) AS CHARACTER_SET_NAME,
            CONVERT(COLLATION_NAME USING utf8mb4) AS COLLATION_NAME,
            CONVERT(COLUMN_COMMENT USING utf8mb4) AS COLUMN_COMMENT
        FROM information_schema.COLUMNS
        WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
        ORDER BY ORDINAL_POSITION
        "#;

    pub const DESCRIBE_FOREIGN_KEYS: &str = r#"
        SELECT
            CONVERT(k.CONSTRAINT_NAME USING utf8mb4) AS CONSTRAINT_NAME,
            CONVERT(k.COLUMN_NAME USING utf8mb4) AS COLUMN_NAME,
            CONVERT(k.REFERENCED_TABLE_NAME USING utf8mb4) AS REFERENCED_TABLE_NAME,
            CONVERT(k.REFERENCED_COLUMN_NAME USING utf8mb4) AS REFERENCED_COLUMN_NAME,
            CONVERT(r.UPDATE_RULE USING utf8mb4) AS UPDATE_RULE,
            CONVERT(r.DELETE_RULE USING utf8mb4) AS DELETE_RULE
        FROM information_schema.KEY_COLUMN_USAGE k
        JOIN information_schema.REFERENTIAL_CONSTRAINTS r
            ON r.CONSTRAINT_SCHEMA = k.CONSTRAINT_SCHEMA
            AND r.CONSTRAINT_NAME = k.CONSTRAINT_NAME
            AND r.TABLE_NAME = k.TABLE_NAME
        WHERE k.TABLE_SCHEMA = ? AND k.TABLE_NAME = ?
        AND k.REFERENCED_TABLE_NAME IS NOT NULL
        ORDER BY k.CONSTRAINT_NAME, k.ORDINAL_POSITION
        "#;

    // One row per indexed column; grouped into indexes in Rust.
    // Functional indexes (8.0.13+) have no COLUMN_NAME, only an EXPRESSION.
    pub const DESCRIBE_INDEXES: &str = r#"
        SELECT
            CONVERT(INDEX_NAME USING utf8mb4) AS INDEX_NAME,
            CONVERT(COALESCE(COLUMN_NAME, EXPRESSION) USING utf8mb4) AS COLUMN_NAME,
            NON_UNIQUE,
            CONVERT(INDEX_TYPE USING utf8mb4) AS INDEX_TYPE
        FROM information_schema.STATISTICS
        WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
        ORDER BY INDEX_NAME = 'PRIMARY' DESC, INDEX_NAME, SEQ_IN_INDEX
        "#;

    // MySQL 5.7 has no STATISTICS.EXPRESSION column
    pub const DESCRIBE_INDEXES_LEGACY: &str = r#"
        SELECT
            CONVERT(INDEX_NAME USING utf8mb4) AS INDEX_NAME,
            CONVERT(COLUMN_NAME USING utf8mb4) AS COLUMN_NAME,
            NON_UNIQUE,
            CONVERT(INDEX_TYPE USING utf8mb4) AS INDEX_TYPE
        FROM information_schema.STATISTICS
        WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
        ORDER BY INDEX_NAME = 'PRIMARY' DESC, INDEX_NAME, SEQ_IN_INDEX
        "#;
}

// =============================================================================
// Identifier handling
// =============================================================================

/// Quote an identifier with backticks, doubling any embedded backtick.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// `` `database`.`table` `` with both parts quoted.
pub fn qualified_name(database: &str, table: &str) -> String {
    format!("{}.{}", quote_identifier(database), quote_identifier(table))
}

/// A table name that was found in the live catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTable {
    /// Name exactly as the catalog spells it
    pub name: String,
    pub table_type: TableType,
}

// =============================================================================
// Row helpers
// =============================================================================

/// Try to get a u64 value from a row, handling MySQL version differences.
/// MySQL 5.x may return BIGINT (i64), MySQL 8.x returns BIGINT UNSIGNED (u64).
fn try_get_u64(row: &MySqlRow, column: &str) -> Option<u64> {
    if let Ok(Some(v)) = row.try_get::<Option<u64>, _>(column) {
        return Some(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(column) {
        return u64::try_from(v).ok();
    }
    None
}

/// Safely get a string from a MySQL row.
/// MySQL may return VARBINARY instead of VARCHAR depending on charset configuration.
fn get_string(row: &MySqlRow, column: &str) -> String {
    get_optional_string(row, column).unwrap_or_default()
}

fn get_optional_string(row: &MySqlRow, column: &str) -> Option<String> {
    row.try_get::<Option<String>, _>(column)
        .ok()
        .flatten()
        .or_else(|| {
            row.try_get::<Option<Vec<u8>>, _>(column)
                .ok()
                .flatten()
                .and_then(|bytes| String::from_utf8(bytes).ok())
        })
}

/// Optional string with empty values collapsed to `None`.
fn get_non_empty(row: &MySqlRow, column: &str) -> Option<String> {
    get_optional_string(row, column).filter(|s| !s.is_empty())
}

fn get_string_by_index(row: &MySqlRow, index: usize) -> Option<String> {
    row.try_get::<String, _>(index).ok().or_else(|| {
        row.try_get::<Vec<u8>, _>(index)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
    })
}

fn get_datetime(row: &MySqlRow, column: &str) -> Option<NaiveDateTime> {
    row.try_get::<Option<NaiveDateTime>, _>(column).ok().flatten()
}

/// One row of `information_schema.STATISTICS`.
#[derive(Debug, Clone)]
pub struct IndexColumnRow {
    pub index_name: String,
    pub column_name: String,
    pub non_unique: bool,
    pub index_type: Option<String>,
}

/// Fold per-column rows (ordered by index then sequence) into one entry per index.
pub fn group_index_rows(rows: impl IntoIterator<Item = IndexColumnRow>) -> Vec<IndexInfo> {
    let mut indexes: Vec<IndexInfo> = Vec::new();
    for row in rows {
        match indexes.last_mut() {
            Some(current) if current.name == row.index_name => {
                current.columns.push(row.column_name);
            }
            _ => {
                let mut index = IndexInfo::new(row.index_name).with_unique(!row.non_unique);
                if let Some(index_type) = row.index_type.filter(|t| !t.is_empty()) {
                    index = index.with_index_type(index_type);
                }
                index.columns.push(row.column_name);
                indexes.push(index);
            }
        }
    }
    indexes
}

// =============================================================================
// Inspector
// =============================================================================

/// Schema inspector bound to one pool and one database.
pub struct SchemaInspector<'a> {
    pool: &'a MySqlPool,
    database: &'a str,
    executor: &'a QueryExecutor,
}

impl<'a> SchemaInspector<'a> {
    pub fn new(pool: &'a MySqlPool, database: &'a str, executor: &'a QueryExecutor) -> Self {
        Self {
            pool,
            database,
            executor,
        }
    }

    pub fn database(&self) -> &str {
        self.database
    }

    async fn catalog_rows(&self, operation: &str, sql: &str) -> DbResult<Vec<MySqlRow>> {
        self.executor
            .run(
                operation,
                sqlx::query(sql).bind(self.database).fetch_all(self.pool),
            )
            .await
    }

    async fn table_rows(&self, operation: &str, sql: &str, table: &str) -> DbResult<Vec<MySqlRow>> {
        self.executor
            .run(
                operation,
                sqlx::query(sql)
                    .bind(self.database)
                    .bind(table)
                    .fetch_all(self.pool),
            )
            .await
    }

    /// Base tables with engine, size and row estimates.
    pub async fn list_tables(&self) -> DbResult<Vec<TableInfo>> {
        let rows = self
            .catalog_rows("list tables", queries::LIST_TABLES_DETAILED)
            .await?;

        let tables = rows
            .iter()
            .filter_map(|row| {
                let name = get_string(row, "TABLE_NAME");
                if name.is_empty() {
                    return None;
                }

                let mut table = TableInfo::new(name, TableType::parse(&get_string(row, "TABLE_TYPE")))
                    .with_sizes(try_get_u64(row, "DATA_SIZE"), try_get_u64(row, "INDEX_SIZE"));
                table.engine = get_non_empty(row, "ENGINE");
                table.collation = get_non_empty(row, "TABLE_COLLATION");
                table.row_count = try_get_u64(row, "ROW_COUNT");
                table.auto_increment = try_get_u64(row, "AUTO_INCREMENT");
                table.created_at = get_datetime(row, "CREATED_AT");
                table.updated_at = get_datetime(row, "UPDATED_AT");
                table.comment = get_non_empty(row, "TABLE_COMMENT");
                Some(table)
            })
            .collect::<Vec<_>>();

        debug!(count = tables.len(), "Listed tables");
        Ok(tables)
    }

    /// Base tables with stable attributes only.
    pub async fn list_table_summaries(&self) -> DbResult<Vec<TableSummary>> {
        let rows = self
            .catalog_rows("list tables", queries::LIST_TABLE_SUMMARIES)
            .await?;

        Ok(rows
            .iter()
            .map(|row| TableSummary {
                name: get_string(row, "TABLE_NAME"),
                engine: get_non_empty(row, "ENGINE"),
                comment: get_non_empty(row, "TABLE_COMMENT"),
            })
            .filter(|t| !t.name.is_empty())
            .collect())
    }

    pub async fn list_views(&self) -> DbResult<Vec<ViewInfo>> {
        let rows = self.catalog_rows("list views", queries::LIST_VIEWS).await?;

        let views = rows
            .iter()
            .map(|row| ViewInfo {
                name: get_string(row, "TABLE_NAME"),
                definition: get_string(row, "VIEW_DEFINITION"),
                check_option: get_non_empty(row, "CHECK_OPTION"),
                is_updatable: get_string(row, "IS_UPDATABLE").eq_ignore_ascii_case("YES"),
                definer: get_non_empty(row, "DEFINER"),
                security_type: get_non_empty(row, "SECURITY_TYPE"),
            })
            .collect::<Vec<_>>();

        debug!(count = views.len(), "Listed views");
        Ok(views)
    }

    pub async fn list_procedures(&self) -> DbResult<Vec<ProcedureInfo>> {
        let rows = self
            .catalog_rows("list procedures", queries::LIST_PROCEDURES)
            .await?;

        let procedures = rows
            .iter()
            .map(|row| ProcedureInfo {
                name: get_string(row, "ROUTINE_NAME"),
                definition: get_optional_string(row, "ROUTINE_DEFINITION"),
                created: get_datetime(row, "CREATED"),
                last_altered: get_datetime(row, "LAST_ALTERED"),
                comment: get_non_empty(row, "ROUTINE_COMMENT"),
                definer: get_non_empty(row, "DEFINER"),
                security_type: get_non_empty(row, "SECURITY_TYPE"),
                sql_data_access: get_non_empty(row, "SQL_DATA_ACCESS"),
            })
            .collect::<Vec<_>>();

        debug!(count = procedures.len(), "Listed procedures");
        Ok(procedures)
    }

    /// Look a caller-supplied name up in the catalog.
    ///
    /// Only names that exist as a base table or view in the configured
    /// database pass; everything else is a `Schema` error.
    pub async fn resolve_table(&self, table_name: &str) -> DbResult<ResolvedTable> {
        if table_name.trim().is_empty() {
            return Err(DbError::invalid_input("tableName must not be empty"));
        }

        let rows = self
            .table_rows("resolve table", queries::RESOLVE_TABLE, table_name)
            .await?;

        rows.first()
            .map(|row| ResolvedTable {
                name: get_string(row, "TABLE_NAME"),
                table_type: TableType::parse(&get_string(row, "TABLE_TYPE")),
            })
            .filter(|t| !t.name.is_empty())
            .ok_or_else(|| {
                DbError::schema(
                    format!(
                        "Table '{}' not found in database '{}'",
                        table_name, self.database
                    ),
                    table_name,
                )
            })
    }

    /// Full description of a table or view.
    pub async fn describe_table(&self, table_name: &str) -> DbResult<TableDescription> {
        let table = self.resolve_table(table_name).await?;

        let columns = self.describe_columns(&table).await?;
        let primary_key = columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.name.clone())
            .collect();
        let indexes = self.fetch_indexes(&table).await?;
        let foreign_keys = self.fetch_foreign_keys(&table).await?;
        let create_statement = self.show_create_table(&table).await?;

        debug!(
            table = %table.name,
            columns = columns.len(),
            indexes = indexes.len(),
            "Described table"
        );

        Ok(TableDescription {
            table_name: table.name,
            table_type: table.table_type,
            columns,
            primary_key,
            indexes,
            foreign_keys,
            create_statement,
        })
    }

    pub async fn describe_columns(&self, table: &ResolvedTable) -> DbResult<Vec<ColumnDefinition>> {
        let rows = self
            .table_rows("describe columns", queries::DESCRIBE_COLUMNS, &table.name)
            .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let mut col = ColumnDefinition::new(
                    get_string(row, "COLUMN_NAME"),
                    get_string(row, "COLUMN_TYPE"),
                    get_string(row, "IS_NULLABLE") == "YES",
                )
                .with_primary_key(get_string(row, "COLUMN_KEY") == "PRI");

                if let Some(def) = get_optional_string(row, "COLUMN_DEFAULT") {
                    col = col.with_default_str(&def);
                }
                col.extra = get_non_empty(row, "EXTRA");
                col.character_set = get_non_empty(row, "CHARACTER_SET_NAME");
                col.collation = get_non_empty(row, "COLLATION_NAME");
                col.comment = get_non_empty(row, "COLUMN_COMMENT");
                col
            })
            .collect())
    }

    async fn fetch_indexes(&self, table: &ResolvedTable) -> DbResult<Vec<IndexInfo>> {
        let rows = match self
            .table_rows("describe indexes", queries::DESCRIBE_INDEXES, &table.name)
            .await
        {
            Ok(rows) => rows,
            Err(DbError::Database { .. }) => {
                self.table_rows(
                    "describe indexes",
                    queries::DESCRIBE_INDEXES_LEGACY,
                    &table.name,
                )
                .await?
            }
            Err(e) => return Err(e),
        };

        Ok(group_index_rows(rows.iter().map(|row| IndexColumnRow {
            index_name: get_string(row, "INDEX_NAME"),
            column_name: get_string(row, "COLUMN_NAME"),
            non_unique: try_get_u64(row, "NON_UNIQUE").unwrap_or(1) != 0,
            index_type: get_optional_string(row, "INDEX_TYPE"),
        })))
    }

    async fn fetch_foreign_keys(&self, table: &ResolvedTable) -> DbResult<Vec<ForeignKey>> {
        let rows = self
            .table_rows(
                "describe foreign keys",
                queries::DESCRIBE_FOREIGN_KEYS,
                &table.name,
            )
            .await?;

        Ok(rows
            .iter()
            .map(|row| ForeignKey {
                name: get_string(row, "CONSTRAINT_NAME"),
                column: get_string(row, "COLUMN_NAME"),
                references_table: get_string(row, "REFERENCED_TABLE_NAME"),
                references_column: get_string(row, "REFERENCED_COLUMN_NAME"),
                on_update: ForeignKeyAction::parse(&get_string(row, "UPDATE_RULE")),
                on_delete: ForeignKeyAction::parse(&get_string(row, "DELETE_RULE")),
            })
            .collect())
    }

    /// Verbatim DDL. Column 1 is `Create Table` for tables and `Create View` for views.
    async fn show_create_table(&self, table: &ResolvedTable) -> DbResult<String> {
        let sql = format!(
            "SHOW CREATE TABLE {}",
            qualified_name(self.database, &table.name)
        );
        let row = self
            .executor
            .run("show create table", self.pool.fetch_one(sql.as_str()))
            .await?;

        get_string_by_index(&row, 1).ok_or_else(|| {
            DbError::internal(format!(
                "SHOW CREATE TABLE returned no DDL for '{}'",
                table.name
            ))
        })
    }

    /// First rows of a table in storage order, at most [`SAMPLE_ROW_LIMIT`].
    pub async fn sample_rows(
        &self,
        table: &ResolvedTable,
    ) -> DbResult<Vec<serde_json::Map<String, JsonValue>>> {
        let sql = format!(
            "SELECT * FROM {} LIMIT {}",
            qualified_name(self.database, &table.name),
            SAMPLE_ROW_LIMIT
        );
        let rows = self
            .executor
            .run("sample rows", self.pool.fetch_all(sql.as_str()))
            .await?;

        Ok(rows
            .iter()
            .map(|row| row.to_json_map_with_options(true))
            .collect())
    }
}
