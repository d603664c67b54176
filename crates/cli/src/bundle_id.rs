use std::path::Path;
use xcpilot_core::XcpilotEngine;

pub async fn run(
    engine: &XcpilotEngine,
    project: &Path,
    scheme: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let bundle_id = engine.bundles().bundle_id(project, scheme).await?;
    println!("{bundle_id}");
    Ok(())
}
