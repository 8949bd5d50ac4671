//! Integration tests for UTF-8 encoding in MySQL.
//!
//! Set TEST_MYSQL_URL environment variable to run these tests.

use mysql_mcp_server::config::{ConnectionSettings, PoolOptions};
use mysql_mcp_server::db::{ConnectionProvider, QueryExecutor};
use mysql_mcp_server::tools::query::{ExecuteQueryInput, QueryParamInput, QueryToolHandler};
use mysql_mcp_server::tools::schema::{GetTableInfoInput, SchemaToolHandler};
use std::sync::Arc;

fn test_provider() -> Option<Arc<ConnectionProvider>> {
    let mysql_url = match std::env::var("TEST_MYSQL_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: TEST_MYSQL_URL not set");
            return None;
        }
    };
    let settings = ConnectionSettings::from_url(&mysql_url, None).unwrap();
    Some(Arc::new(ConnectionProvider::new(
        settings,
        PoolOptions::default(),
    )))
}

fn input(sql: &str, params: Vec<QueryParamInput>) -> ExecuteQueryInput {
    ExecuteQueryInput {
        query: sql.to_string(),
        params,
    }
}

#[tokio::test]
async fn test_mysql_utf8_chinese_characters() {
    let Some(provider) = test_provider() else {
        return;
    };
    let query = QueryToolHandler::new(provider, QueryExecutor::default(), false);

    let _ = query
        .execute_query(input("DROP TABLE IF EXISTS utf8_test", vec![]))
        .await;

    query
        .execute_query(input(
            r#"CREATE TABLE utf8_test (
                id INT PRIMARY KEY COMMENT '主键ID',
                name VARCHAR(100) COMMENT '用户名称',
                description TEXT COMMENT '详细描述'
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COMMENT='中文测试表'"#,
            vec![],
        ))
        .await
        .expect("Failed to create table");

    // Bound through parameters rather than literals
    query
        .execute_query(input(
            "INSERT INTO utf8_test (id, name, description) VALUES (?, ?, ?)",
            vec![
                QueryParamInput::Int(1),
                QueryParamInput::String("张三".into()),
                QueryParamInput::String("这是中文描述 🚀".into()),
            ],
        ))
        .await
        .expect("Failed to insert Chinese data");

    let result = query
        .execute_query(input("SELECT * FROM utf8_test WHERE id = 1", vec![]))
        .await
        .expect("Failed to query");

    assert_eq!(result.row_count, 1);
    let row = &result.data[0];
    let name = row.get("name").and_then(|v| v.as_str()).unwrap();
    let description = row.get("description").and_then(|v| v.as_str()).unwrap();

    assert_eq!(name, "张三", "Chinese name should be '张三' but got '{}'", name);
    assert_eq!(
        description, "这是中文描述 🚀",
        "Description should round-trip but got '{}'",
        description
    );

    let _ = query
        .execute_query(input("DROP TABLE utf8_test", vec![]))
        .await;
}

#[tokio::test]
async fn test_mysql_comments_utf8_in_table_info() {
    let Some(provider) = test_provider() else {
        return;
    };
    let executor = QueryExecutor::default();
    let query = QueryToolHandler::new(provider.clone(), executor.clone(), false);
    let schema = SchemaToolHandler::new(provider, executor);

    let _ = query
        .execute_query(input("DROP TABLE IF EXISTS comment_utf8_test", vec![]))
        .await;

    query
        .execute_query(input(
            r#"CREATE TABLE comment_utf8_test (
                id INT PRIMARY KEY COMMENT '主键ID'
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COMMENT='用户操作日志表'"#,
            vec![],
        ))
        .await
        .expect("Failed to create table");

    let info = schema
        .get_table_info(GetTableInfoInput {
            table_name: "comment_utf8_test".to_string(),
        })
        .await
        .expect("Failed to describe table");

    assert_eq!(info.columns[0].comment.as_deref(), Some("主键ID"));
    assert!(
        info.create_statement.contains("用户操作日志表"),
        "DDL should carry the table comment: {}",
        info.create_statement
    );

    let _ = query
        .execute_query(input("DROP TABLE comment_utf8_test", vec![]))
        .await;
}
