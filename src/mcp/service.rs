//! MCP service implementation using rmcp.
//!
//! This module defines the MySqlService struct with the database tools
//! exposed via the MCP protocol using the rmcp framework's macros, plus the
//! `mysql://` resources.
//!
//! Tool failures of any kind (unknown name, bad arguments, SQL errors) are
//! answered with an error envelope rather than a protocol error. Resource
//! failures are protocol errors.

use crate::db::{ConnectionProvider, QueryExecutor};
use crate::error::DbError;
use crate::resources::ResourceHandler;
use crate::tools::TOOL_NAMES;
use crate::tools::envelope;
use crate::tools::query::{ExecuteQueryInput, QueryToolHandler};
use crate::tools::schema::{GetTableInfoInput, SchemaToolHandler};
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::tool::{ToolCallContext, ToolRouter},
    handler::server::wrapper::Parameters,
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListResourcesResult,
        ListToolsResult, PaginatedRequestParam, ProtocolVersion, ReadResourceRequestParam,
        ReadResourceResult, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
    tool, tool_router,
};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct MySqlService {
    /// Lazily connected pool for the configured database
    provider: Arc<ConnectionProvider>,
    executor: QueryExecutor,
    read_only: bool,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl MySqlService {
    pub fn new(provider: Arc<ConnectionProvider>, executor: QueryExecutor, read_only: bool) -> Self {
        Self {
            provider,
            executor,
            read_only,
            tool_router: Self::tool_router(),
        }
    }

    pub fn provider(&self) -> &Arc<ConnectionProvider> {
        &self.provider
    }

    /// Tool definitions in a fixed order.
    pub fn tools(&self) -> Vec<Tool> {
        let mut tools = self.tool_router.list_all();
        tools.sort_by_key(|t| {
            TOOL_NAMES
                .iter()
                .position(|name| *name == t.name)
                .unwrap_or(TOOL_NAMES.len())
        });
        tools
    }

    fn has_tool(&self, name: &str) -> bool {
        TOOL_NAMES.contains(&name)
    }

    fn resources(&self) -> ResourceHandler {
        ResourceHandler::new(self.provider.clone(), self.executor.clone())
    }
}

#[tool_router]
impl MySqlService {
    #[tool(
        description = "Execute a SQL statement against the MySQL database.\nUse `?` placeholders and pass values in `params`; they are bound, never interpolated.\nReturns rows, field names and types, affected row count and last insert id."
    )]
    async fn execute_query(
        &self,
        Parameters(input): Parameters<ExecuteQueryInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler =
            QueryToolHandler::new(self.provider.clone(), self.executor.clone(), self.read_only);
        Ok(envelope::from_result(handler.execute_query(input).await))
    }

    #[tool(
        description = "Get detailed schema information for a table.\nReturns columns, primary key, indexes, foreign keys and the CREATE TABLE statement."
    )]
    async fn get_table_info(
        &self,
        Parameters(input): Parameters<GetTableInfoInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = SchemaToolHandler::new(self.provider.clone(), self.executor.clone());
        Ok(envelope::from_result(handler.get_table_info(input).await))
    }

    #[tool(
        description = "Summarize the database: base tables, views and stored procedures with their counts."
    )]
    async fn describe_database(&self) -> Result<CallToolResult, McpError> {
        let handler = SchemaToolHandler::new(self.provider.clone(), self.executor.clone());
        Ok(envelope::from_result(handler.describe_database().await))
    }
}

impl ServerHandler for MySqlService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: "mysql-mcp-server".to_owned(),
                title: Some("MySQL MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(format!(
                "Tools and resources for the MySQL database `{}`.\n\
                \n\
                ## Tools\n\
                - `describe_database`: tables, views and procedures at a glance\n\
                - `get_table_info`: columns, keys, indexes and DDL of one table (`tableName`)\n\
                - `execute_query`: run SQL with `?` placeholders bound from `params`{}\n\
                \n\
                ## Resources\n\
                - `mysql://tables`, `mysql://views`, `mysql://procedures`\n\
                - `mysql://table/<name>`: structure plus up to 10 sample rows\n\
                - `mysql://table/<name>/schema`: same as `get_table_info`",
                self.provider.database(),
                if self.read_only {
                    " (read-only: only SELECT, SHOW, DESCRIBE and EXPLAIN are accepted)"
                } else {
                    ""
                }
            )),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let name = request.name.to_string();
        if !self.has_tool(&name) {
            return Ok(envelope::failure(&DbError::unknown_tool(name)));
        }

        debug!(tool = %name, "Calling tool");
        let ctx = ToolCallContext::new(self, request, context);
        match self.tool_router.call(ctx).await {
            Ok(result) => Ok(result),
            // Argument deserialization failures land here
            Err(e) => Ok(envelope::failure(&DbError::invalid_input(format!(
                "{}: {}",
                name, e.message
            )))),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let resources = self.resources().list().await?;
        Ok(ListResourcesResult::with_all_items(resources))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        info!(uri = %request.uri, "Reading resource");
        let contents = self.resources().read(&request.uri).await?;
        Ok(ReadResourceResult {
            contents: vec![contents],
        })
    }
}
