use super::tools::{QuickBooksTools, tool_definitions};
use crate::error::BridgeError;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, ErrorData, Implementation, ListToolsResult,
    PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{ServerHandler, ServiceExt};
use serde_json::json;
use tracing::{info, warn};

pub const SERVER_NAME: &str = "quickbooks-mcp-server";

/// MCP front end over the shared QuickBooks session.
#[derive(Clone)]
pub struct QuickBooksMcpServer {
    tools: QuickBooksTools,
}

impl QuickBooksMcpServer {
    pub fn new(tools: QuickBooksTools) -> Self {
        Self { tools }
    }

    /// Serves MCP over stdin/stdout until the host closes the stream.
    pub async fn run_stdio(self) -> Result<(), BridgeError> {
        info!("Starting MCP server on stdio");
        let service = self
            .serve((tokio::io::stdin(), tokio::io::stdout()))
            .await
            .map_err(|e| BridgeError::Mcp(e.to_string()))?;
        let reason = service
            .waiting()
            .await
            .map_err(|e| BridgeError::Mcp(e.to_string()))?;
        info!(?reason, "MCP server stopped");
        Ok(())
    }
}

fn to_error_data(err: BridgeError) -> ErrorData {
    let message = err.to_string();
    match err {
        BridgeError::Validation(_) => ErrorData::invalid_params(message, None),
        other => {
            warn!(error = %message, "MCP tool call failed");
            ErrorData::internal_error(message, Some(json!({ "status": other.status().as_u16() })))
        }
    }
}

impl ServerHandler for QuickBooksMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                website_url: None,
                icons: None,
            },
            instructions: Some(
                "Read-only access to the connected QuickBooks company. \
                 Tools: getCustomers, getInvoices, getAccounts, getProfitAndLoss, \
                 getBalanceSheet, getAuthStatus, initiateAuth"
                    .to_string(),
            ),
        }
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let args = request.arguments.unwrap_or_default();
        let text = self
            .tools
            .dispatch(&request.name, args)
            .await
            .map_err(to_error_data)?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: tool_definitions(),
            next_cursor: None,
        })
    }
}
