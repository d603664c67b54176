use xcpilot_core::XcpilotEngine;

pub async fn run(engine: &XcpilotEngine) -> Result<(), Box<dyn std::error::Error>> {
    for (i, installation) in engine.installations().list().await.iter().enumerate() {
        let marker = if i == 0 { "*" } else { " " };
        println!("{marker} {installation}");
    }
    Ok(())
}
