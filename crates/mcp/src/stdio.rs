use crate::McpServer;
use rmcp::{ServiceExt, transport::stdio};
use std::sync::Arc;
use tracing::info;
use xcpilot_core::XcpilotEngine;

/// Serve the tools over stdin/stdout until the client disconnects.
pub async fn run_stdio_server(
    engine: Arc<XcpilotEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting MCP server on stdio");
    let service = McpServer::new(engine).serve(stdio()).await?;
    service.waiting().await?;
    info!("MCP client disconnected");
    Ok(())
}
