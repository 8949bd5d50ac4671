//! Query execution engine.
//!
//! Runs caller-supplied statements with positional parameters under a
//! timeout, collecting every row, the result field list, and the affected-row
//! count. Catalog queries issued by the schema inspector go through
//! [`QueryExecutor::run`] so they share the same timeout.

use crate::config::DEFAULT_QUERY_TIMEOUT_SECS;
use crate::db::params::bind_all;
use crate::db::types::{RowToJson, columns_to_fields};
use crate::error::{DbError, DbResult};
use crate::models::{QueryParam, StatementOutcome};
use futures_util::TryStreamExt;
use sqlx::mysql::MySqlQueryResult;
use sqlx::{Either, Executor, MySqlPool, Statement};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::debug;

/// Query executor that handles database query execution.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    timeout: Duration,
}

impl QueryExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute one statement and collect everything it produced.
    ///
    /// Any statement kind is accepted. Rows are returned in full (no row
    /// limit). When the statement yields no rows, the field list is taken
    /// from a prepare round-trip so callers still see the column names.
    pub async fn execute(
        &self,
        pool: &MySqlPool,
        sql: &str,
        params: &[QueryParam],
    ) -> DbResult<StatementOutcome> {
        let start = Instant::now();

        debug!(
            sql = %sql,
            params = params.len(),
            timeout_secs = self.timeout.as_secs(),
            "Executing statement"
        );

        let run = async {
            let mut outcome = StatementOutcome::default();

            // When params is empty, use raw SQL to avoid prepared statement issues
            // (CREATE PROCEDURE and friends cannot be prepared)
            let mut stream = if params.is_empty() {
                pool.fetch_many(sql)
            } else {
                pool.fetch_many(bind_all(sqlx::query(sql), params))
            };

            while let Some(item) = stream.try_next().await? {
                match item {
                    Either::Left(result) => record_result(&mut outcome, &result),
                    Either::Right(row) => {
                        if outcome.fields.is_empty() {
                            outcome.fields = row.field_metadata();
                        }
                        outcome.rows.push(row.to_json_map_with_options(true));
                    }
                }
            }

            Ok::<_, DbError>(outcome)
        };

        let mut outcome = match timeout(self.timeout, run).await {
            Ok(result) => result?,
            Err(_) => return Err(timeout_error("query execution", self.timeout)),
        };

        if outcome.rows.is_empty() && outcome.rows_affected == 0 {
            outcome.fields = self.describe_fields(pool, sql).await;
        }

        outcome.execution_time_ms = start.elapsed().as_millis() as u64;
        debug!(
            rows = outcome.row_count(),
            affected = outcome.rows_affected,
            elapsed_ms = outcome.execution_time_ms,
            "Statement finished"
        );
        Ok(outcome)
    }

    /// Run a driver future under the configured timeout.
    pub async fn run<T, F>(&self, operation: &str, fut: F) -> DbResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(DbError::from),
            Err(_) => Err(timeout_error(operation, self.timeout)),
        }
    }

    /// Column names and types of a statement without running it.
    ///
    /// Statements that cannot be prepared simply report no fields.
    async fn describe_fields(
        &self,
        pool: &MySqlPool,
        sql: &str,
    ) -> Vec<crate::models::FieldMetadata> {
        match timeout(self.timeout, pool.prepare(sql)).await {
            Ok(Ok(statement)) => columns_to_fields(statement.columns()),
            Ok(Err(e)) => {
                debug!(error = %e, "Statement cannot be prepared; no field metadata");
                Vec::new()
            }
            Err(_) => Vec::new(),
        }
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS))
    }
}

fn record_result(outcome: &mut StatementOutcome, result: &MySqlQueryResult) {
    outcome.rows_affected += result.rows_affected();
    let id = result.last_insert_id();
    if id > 0 {
        outcome.last_insert_id = Some(id);
    }
}

fn timeout_error(operation: &str, timeout: Duration) -> DbError {
    DbError::timeout(operation, timeout.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_defaults() {
        let executor = QueryExecutor::default();
        assert_eq!(
            executor.timeout(),
            Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_executor_custom_timeout() {
        let executor = QueryExecutor::new(Duration::from_secs(60));
        assert_eq!(executor.timeout(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_run_maps_elapsed_timeout() {
        let executor = QueryExecutor::new(Duration::from_millis(10));
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, sqlx::Error>(())
        };

        let err = executor.run("catalog query", slow).await.unwrap_err();
        assert!(matches!(err, DbError::Timeout { .. }));
        assert!(err.to_string().contains("catalog query"));
    }

    #[tokio::test]
    async fn test_run_maps_driver_errors() {
        let executor = QueryExecutor::default();
        let failing = async { Err::<(), _>(sqlx::Error::RowNotFound) };

        let err = executor.run("lookup", failing).await.unwrap_err();
        assert!(matches!(err, DbError::Database { .. }));
    }

    #[test]
    fn test_record_result_without_insert_id() {
        let mut outcome = StatementOutcome::default();
        record_result(&mut outcome, &MySqlQueryResult::default());
        assert_eq!(outcome.rows_affected, 0);
        assert!(outcome.last_insert_id.is_none());
    }
}
