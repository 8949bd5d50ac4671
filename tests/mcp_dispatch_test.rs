//! Tool dispatch through a real MCP session.
//!
//! The server and an rmcp client talk over an in-memory duplex pipe. None of
//! these calls reach the database: unknown names and malformed arguments are
//! rejected by the dispatcher before a connection is requested.

use mysql_mcp_server::MySqlService;
use mysql_mcp_server::config::{ConnectionSettings, PoolOptions};
use mysql_mcp_server::db::{ConnectionProvider, QueryExecutor};
use rmcp::model::{CallToolRequestParam, CallToolResult};
use rmcp::service::RunningService;
use rmcp::{RoleClient, ServiceExt};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;

async fn connect_client() -> RunningService<RoleClient, ()> {
    let provider = Arc::new(ConnectionProvider::new(
        ConnectionSettings::new("127.0.0.1", 1, "root", None, "app"),
        PoolOptions {
            acquire_timeout_secs: 1,
            ..PoolOptions::default()
        },
    ));
    let service = MySqlService::new(provider, QueryExecutor::default(), false);

    let (server_io, client_io) = tokio::io::duplex(64 * 1024);
    tokio::spawn(async move {
        if let Ok(running) = service.serve(server_io).await {
            let _ = running.waiting().await;
        }
    });

    ().serve(client_io).await.expect("client handshake")
}

fn request(name: &str, arguments: JsonValue) -> CallToolRequestParam {
    serde_json::from_value(json!({ "name": name, "arguments": arguments }))
        .expect("valid call_tool params")
}

fn envelope(result: &CallToolResult) -> JsonValue {
    assert_eq!(result.is_error, Some(true));
    assert_eq!(result.content.len(), 1);
    let text = &result.content[0].as_text().expect("text content").text;
    serde_json::from_str(text).expect("envelope is JSON")
}

#[tokio::test]
async fn test_tools_are_listed_over_the_wire() {
    let client = connect_client().await;

    let tools = client.list_all_tools().await.unwrap();
    let names: Vec<String> = tools.iter().map(|t| t.name.to_string()).collect();
    assert_eq!(names, ["execute_query", "get_table_info", "describe_database"]);

    client.cancel().await.unwrap();
}

#[tokio::test]
async fn test_unknown_tool_yields_error_envelope() {
    let client = connect_client().await;

    let result = client
        .call_tool(request("drop_database", json!({})))
        .await
        .expect("unknown tools are answered, not rejected");
    let body = envelope(&result);
    assert!(body["error"].as_str().unwrap().contains("drop_database"));
    assert_eq!(body["retryable"], false);

    client.cancel().await.unwrap();
}

#[tokio::test]
async fn test_missing_arguments_yield_error_envelopes() {
    let client = connect_client().await;

    let result = client
        .call_tool(request("execute_query", json!({})))
        .await
        .expect("bad arguments are answered, not rejected");
    let body = envelope(&result);
    assert!(body["error"].as_str().unwrap().contains("execute_query"));
    assert!(body["detail"].as_str().unwrap().contains("InvalidInput"));

    let result = client
        .call_tool(request("get_table_info", json!({ "table": "users" })))
        .await
        .expect("bad arguments are answered, not rejected");
    let body = envelope(&result);
    assert!(body["error"].as_str().unwrap().contains("get_table_info"));

    client.cancel().await.unwrap();
}
