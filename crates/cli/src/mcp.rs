use std::sync::Arc;
use xcpilot_core::XcpilotEngine;

pub async fn run(engine: XcpilotEngine) -> Result<(), Box<dyn std::error::Error>> {
    xcpilot_mcp::stdio::run_stdio_server(Arc::new(engine)).await
}
