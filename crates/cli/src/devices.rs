use tabled::{Table, Tabled};
use tracing::info;
use xcpilot_api::DeviceRecord;
use xcpilot_core::XcpilotEngine;

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "UDID")]
    udid: String,
    #[tabled(rename = "CoreDevice ID")]
    coredevice_id: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "OS")]
    os: String,
    #[tabled(rename = "Status")]
    status: &'static str,
}

impl From<DeviceRecord> for DeviceRow {
    fn from(d: DeviceRecord) -> Self {
        let dash = || "-".to_string();
        Self {
            name: d.name,
            udid: d.udid.unwrap_or_else(dash),
            coredevice_id: d.coredevice_id.unwrap_or_else(dash),
            model: d.model.unwrap_or_else(dash),
            os: d.os_version.unwrap_or_else(dash),
            status: if d.available { "available" } else { "unavailable" },
        }
    }
}

pub async fn run(engine: &XcpilotEngine, refresh: bool) -> Result<(), Box<dyn std::error::Error>> {
    let devices = engine.devices().all_devices(refresh).await;
    if devices.is_empty() {
        info!("No physical devices found. Connect a device and make sure it is trusted.");
        return Ok(());
    }

    let rows: Vec<DeviceRow> = devices.into_iter().map(DeviceRow::from).collect();
    println!("{}", Table::new(rows));
    Ok(())
}
