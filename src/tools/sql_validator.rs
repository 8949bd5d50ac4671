//! SQL statement classification for read-only mode.
//!
//! By default `execute_query` runs any statement the connected user may run.
//! When the server is started with `--read-only`, every statement is parsed
//! with the MySQL dialect of [sqlparser](https://docs.rs/sqlparser/) and only
//! reads (SELECT, SHOW, DESCRIBE, EXPLAIN of a read) are let through. A batch
//! is rejected as a whole if any statement in it writes.

use crate::error::{DbError, DbResult};
use sqlparser::ast::Statement;
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

/// Coarse category of a parsed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlStatementType {
    /// SELECT, SHOW, DESCRIBE, EXPLAIN
    Read,
    /// INSERT, UPDATE, DELETE, REPLACE
    DmlWrite,
    /// CREATE, DROP, ALTER, TRUNCATE, RENAME
    Ddl,
    /// START TRANSACTION, COMMIT, ROLLBACK, SAVEPOINT
    Transaction,
    /// CALL, PREPARE, EXECUTE
    ProcedureCall,
    /// GRANT, REVOKE, SET, LOCK, FLUSH, ...
    Administrative,
    Unknown,
}

impl SqlStatementType {
    pub fn is_read(self) -> bool {
        self == Self::Read
    }
}

mod error_messages {
    pub const DML_WRITE: &str = "Data modification is disabled: the server runs in read-only mode.";
    pub const DDL: &str = "Schema changes are disabled: the server runs in read-only mode.";
    pub const TRANSACTION: &str =
        "Transaction control is disabled: the server runs in read-only mode.";
    pub const PROCEDURE: &str =
        "Procedure calls are disabled in read-only mode because their effects cannot be verified.";
    pub const ADMINISTRATIVE: &str =
        "Administrative statements are disabled: the server runs in read-only mode.";
    pub const UNKNOWN: &str =
        "Unrecognized statement. Only SELECT, SHOW, DESCRIBE and EXPLAIN run in read-only mode.";
    pub const PARSE_ERROR: &str = "Failed to parse SQL statement.";
}

/// Parse `sql` and classify each statement it contains.
pub fn classify(sql: &str) -> DbResult<Vec<(SqlStatementType, &'static str)>> {
    let statements = Parser::parse_sql(&MySqlDialect {}, sql).map_err(|e| {
        DbError::invalid_input(format!("{} Error: {}", error_messages::PARSE_ERROR, e))
    })?;

    if statements.is_empty() {
        return Err(DbError::invalid_input("Empty SQL statement"));
    }

    Ok(statements.iter().map(classify_statement).collect())
}

/// Reject anything that is not a read.
///
/// Returns `Err(DbError::Permission)` naming the first offending statement.
///
/// ```
/// use mysql_mcp_server::tools::sql_validator::validate_readonly;
///
/// assert!(validate_readonly("SELECT * FROM users WHERE id = ?").is_ok());
/// assert!(validate_readonly("DELETE FROM users").is_err());
/// ```
pub fn validate_readonly(sql: &str) -> DbResult<()> {
    for (stmt_type, operation) in classify(sql)? {
        let reason = match stmt_type {
            SqlStatementType::Read => continue,
            SqlStatementType::DmlWrite => error_messages::DML_WRITE,
            SqlStatementType::Ddl => error_messages::DDL,
            SqlStatementType::Transaction => error_messages::TRANSACTION,
            SqlStatementType::ProcedureCall => error_messages::PROCEDURE,
            SqlStatementType::Administrative => error_messages::ADMINISTRATIVE,
            SqlStatementType::Unknown => error_messages::UNKNOWN,
        };
        return Err(DbError::permission(operation, reason));
    }
    Ok(())
}

fn classify_statement(stmt: &Statement) -> (SqlStatementType, &'static str) {
    match stmt {
        // =====================================================================
        // Reads
        // =====================================================================
        Statement::Query(_) => (SqlStatementType::Read, "SELECT"),
        Statement::ShowTables { .. } => (SqlStatementType::Read, "SHOW TABLES"),
        Statement::ShowColumns { .. } => (SqlStatementType::Read, "SHOW COLUMNS"),
        Statement::ShowDatabases { .. } => (SqlStatementType::Read, "SHOW DATABASES"),
        Statement::ShowCreate { .. } => (SqlStatementType::Read, "SHOW CREATE"),
        Statement::ShowFunctions { .. } => (SqlStatementType::Read, "SHOW FUNCTIONS"),
        Statement::ShowVariable { .. } => (SqlStatementType::Read, "SHOW VARIABLE"),
        Statement::ShowVariables { .. } => (SqlStatementType::Read, "SHOW VARIABLES"),
        Statement::ShowStatus { .. } => (SqlStatementType::Read, "SHOW STATUS"),
        Statement::ShowCollation { .. } => (SqlStatementType::Read, "SHOW COLLATION"),
        Statement::ExplainTable { .. } => (SqlStatementType::Read, "DESCRIBE"),

        // EXPLAIN takes the category of what it explains
        Statement::Explain { statement, .. } => match classify_statement(statement) {
            (SqlStatementType::Read, _) => (SqlStatementType::Read, "EXPLAIN"),
            other => other,
        },

        // =====================================================================
        // Writes
        // =====================================================================
        Statement::Insert(_) => (SqlStatementType::DmlWrite, "INSERT"),
        Statement::Update { .. } => (SqlStatementType::DmlWrite, "UPDATE"),
        Statement::Delete(_) => (SqlStatementType::DmlWrite, "DELETE"),
        Statement::Merge { .. } => (SqlStatementType::DmlWrite, "MERGE"),

        Statement::CreateTable { .. } => (SqlStatementType::Ddl, "CREATE TABLE"),
        Statement::CreateView { .. } => (SqlStatementType::Ddl, "CREATE VIEW"),
        Statement::CreateIndex(_) => (SqlStatementType::Ddl, "CREATE INDEX"),
        Statement::CreateSchema { .. } => (SqlStatementType::Ddl, "CREATE SCHEMA"),
        Statement::CreateDatabase { .. } => (SqlStatementType::Ddl, "CREATE DATABASE"),
        Statement::CreateFunction { .. } => (SqlStatementType::Ddl, "CREATE FUNCTION"),
        Statement::CreateProcedure { .. } => (SqlStatementType::Ddl, "CREATE PROCEDURE"),
        Statement::CreateTrigger { .. } => (SqlStatementType::Ddl, "CREATE TRIGGER"),
        Statement::CreateRole { .. } => (SqlStatementType::Ddl, "CREATE ROLE"),
        Statement::AlterTable { .. } => (SqlStatementType::Ddl, "ALTER TABLE"),
        Statement::AlterView { .. } => (SqlStatementType::Ddl, "ALTER VIEW"),
        Statement::AlterIndex { .. } => (SqlStatementType::Ddl, "ALTER INDEX"),
        Statement::Drop { .. } => (SqlStatementType::Ddl, "DROP"),
        Statement::DropFunction { .. } => (SqlStatementType::Ddl, "DROP FUNCTION"),
        Statement::DropProcedure { .. } => (SqlStatementType::Ddl, "DROP PROCEDURE"),
        Statement::DropTrigger { .. } => (SqlStatementType::Ddl, "DROP TRIGGER"),
        Statement::Truncate { .. } => (SqlStatementType::Ddl, "TRUNCATE"),
        Statement::Comment { .. } => (SqlStatementType::Ddl, "COMMENT"),

        Statement::StartTransaction { .. } => (SqlStatementType::Transaction, "START TRANSACTION"),
        Statement::Commit { .. } => (SqlStatementType::Transaction, "COMMIT"),
        Statement::Rollback { .. } => (SqlStatementType::Transaction, "ROLLBACK"),
        Statement::Savepoint { .. } => (SqlStatementType::Transaction, "SAVEPOINT"),
        Statement::ReleaseSavepoint { .. } => (SqlStatementType::Transaction, "RELEASE SAVEPOINT"),

        Statement::Call { .. } => (SqlStatementType::ProcedureCall, "CALL"),
        Statement::Execute { .. } => (SqlStatementType::ProcedureCall, "EXECUTE"),
        Statement::Prepare { .. } => (SqlStatementType::ProcedureCall, "PREPARE"),
        Statement::Deallocate { .. } => (SqlStatementType::ProcedureCall, "DEALLOCATE"),

        Statement::Grant { .. } => (SqlStatementType::Administrative, "GRANT"),
        Statement::Revoke { .. } => (SqlStatementType::Administrative, "REVOKE"),
        Statement::Set(_) => (SqlStatementType::Administrative, "SET"),
        Statement::Use(_) => (SqlStatementType::Administrative, "USE"),
        Statement::Kill { .. } => (SqlStatementType::Administrative, "KILL"),
        Statement::Analyze { .. } => (SqlStatementType::Administrative, "ANALYZE"),
        Statement::LockTables { .. } => (SqlStatementType::Administrative, "LOCK"),
        Statement::UnlockTables => (SqlStatementType::Administrative, "UNLOCK"),
        Statement::Flush { .. } => (SqlStatementType::Administrative, "FLUSH"),
        Statement::Load { .. } => (SqlStatementType::Administrative, "LOAD"),
        Statement::Install { .. } => (SqlStatementType::Administrative, "INSTALL"),
        Statement::OptimizeTable { .. } => (SqlStatementType::Administrative, "OPTIMIZE"),

        _ => (SqlStatementType::Unknown, "Unknown"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_are_allowed() {
        for sql in [
            "SELECT * FROM users",
            "SELECT id FROM users WHERE email = ?",
            "SHOW TABLES",
            "SHOW CREATE TABLE users",
            "DESCRIBE users",
            "EXPLAIN SELECT * FROM users",
        ] {
            assert!(validate_readonly(sql).is_ok(), "should allow: {sql}");
        }
    }

    #[test]
    fn test_writes_are_permission_errors() {
        for sql in [
            "INSERT INTO users (name) VALUES ('a')",
            "UPDATE users SET name = 'b'",
            "DELETE FROM users",
            "DROP TABLE users",
            "CREATE TABLE t (id INT)",
            "TRUNCATE TABLE users",
            "COMMIT",
        ] {
            let err = validate_readonly(sql).unwrap_err();
            assert!(
                matches!(err, DbError::Permission { .. }),
                "should reject {sql}: {err:?}"
            );
        }
    }

    #[test]
    fn test_explain_of_write_is_rejected() {
        let err = validate_readonly("EXPLAIN DELETE FROM users").unwrap_err();
        assert!(err.to_string().contains("DELETE"));
    }

    #[test]
    fn test_batch_with_a_write_is_rejected() {
        assert!(validate_readonly("SELECT 1; DELETE FROM users").is_err());
    }

    #[test]
    fn test_insert_select_is_rejected() {
        let sql = "INSERT INTO archive SELECT * FROM users WHERE created_at < '2020-01-01'";
        assert!(validate_readonly(sql).is_err());
    }

    #[test]
    fn test_unparseable_sql_is_invalid_input() {
        let err = validate_readonly("SELEC nonsense FROM").unwrap_err();
        assert!(matches!(err, DbError::InvalidInput { .. }));
    }

    #[test]
    fn test_classify_reports_each_statement() {
        let kinds = classify("SELECT 1; UPDATE t SET a = 1").unwrap();
        assert_eq!(kinds.len(), 2);
        assert!(kinds[0].0.is_read());
        assert_eq!(kinds[1], (SqlStatementType::DmlWrite, "UPDATE"));
    }
}
