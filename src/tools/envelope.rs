//! Tool response envelope.
//!
//! Every tool call answers with exactly one text content block holding a JSON
//! document: either the tool's payload, or `{error, detail, retryable, suggestion?}`
//! with `isError` set.

use crate::error::DbError;
use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Serialize)]
struct ErrorPayload<'a> {
    error: String,
    detail: String,
    retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<&'a str>,
}

/// Wrap a payload as a successful tool result.
pub fn success<T: Serialize>(payload: &T) -> CallToolResult {
    match serde_json::to_string_pretty(payload) {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(e) => failure(&DbError::internal(format!(
            "Failed to serialize tool result: {}",
            e
        ))),
    }
}

/// Render an error as a tool result with `isError = true`.
pub fn failure(err: &DbError) -> CallToolResult {
    warn!(error = %err, "Tool call failed");

    let payload = ErrorPayload {
        error: err.to_string(),
        detail: format!("{:?}", err),
        retryable: err.is_retryable(),
        suggestion: err.suggestion(),
    };
    let text = serde_json::to_string_pretty(&payload)
        .unwrap_or_else(|_| format!("{{\"error\":{:?}}}", err.to_string()));
    CallToolResult::error(vec![Content::text(text)])
}

/// Collapse a handler result into an envelope.
pub fn from_result<T: Serialize>(result: Result<T, DbError>) -> CallToolResult {
    match result {
        Ok(payload) => success(&payload),
        Err(err) => failure(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value as JsonValue;

    fn single_text(result: &CallToolResult) -> JsonValue {
        assert_eq!(result.content.len(), 1);
        let text = &result.content[0]
            .as_text()
            .expect("text content")
            .text;
        serde_json::from_str(text).expect("envelope is JSON")
    }

    #[test]
    fn test_success_envelope() {
        let result = success(&serde_json::json!({ "rowCount": 2 }));
        assert_eq!(result.is_error, Some(false));
        assert_eq!(single_text(&result)["rowCount"], 2);
    }

    #[test]
    fn test_failure_envelope_carries_suggestion() {
        let result = failure(&DbError::unknown_tool("nope"));
        assert_eq!(result.is_error, Some(true));

        let body = single_text(&result);
        assert_eq!(body["error"], "Unknown tool: nope");
        assert!(body["detail"].as_str().unwrap().contains("UnknownTool"));
        assert!(body["suggestion"].as_str().unwrap().contains("execute_query"));
        assert_eq!(body["retryable"], false);
    }

    #[test]
    fn test_failure_marks_transient_errors_retryable() {
        let body = single_text(&failure(&DbError::timeout("query", 30)));
        assert_eq!(body["retryable"], true);
    }

    #[test]
    fn test_failure_without_suggestion_omits_key() {
        let body = single_text(&failure(&DbError::invalid_input("query must not be empty")));
        assert!(body.get("suggestion").is_none());
        assert!(body.get("data").is_none());
    }

    #[test]
    fn test_from_result_never_mixes() {
        let ok = from_result::<u32>(Ok(7));
        assert_eq!(ok.is_error, Some(false));
        let err = from_result::<u32>(Err(DbError::internal("boom")));
        assert_eq!(err.is_error, Some(true));
        assert!(single_text(&err).get("error").is_some());
    }
}
