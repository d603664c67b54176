use crate::error::{IdentifierKind, PilotError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified identity of one physical device, reconciled from `xctrace` and `devicectl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub name: String,
    /// 36-character dashed UUID, the `xcodebuild -destination id=` key.
    pub udid: Option<String>,
    /// CoreDevice identifier, the `devicectl --device` key.
    pub coredevice_id: Option<String>,
    pub available: bool,
    pub model: Option<String>,
    pub os_version: Option<String>,
}

impl DeviceRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            udid: None,
            coredevice_id: None,
            available: false,
            model: None,
            os_version: None,
        }
    }

    pub fn identifier(&self, kind: IdentifierKind) -> Option<&str> {
        match kind {
            IdentifierKind::Primary => self.udid.as_deref(),
            IdentifierKind::Secondary => self.coredevice_id.as_deref(),
        }
    }

    /// The identifier of `kind`, or `MissingIdentifier`.
    pub fn require(&self, kind: IdentifierKind) -> Result<&str, PilotError> {
        self.identifier(kind)
            .ok_or_else(|| PilotError::MissingIdentifier {
                device: self.name.clone(),
                kind,
            })
    }

    /// Both identifiers are known.
    pub fn is_reconciled(&self) -> bool {
        self.udid.is_some() && self.coredevice_id.is_some()
    }
}

impl fmt::Display for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "- {}", self.name)?;
        writeln!(f, "  UDID: {}", self.udid.as_deref().unwrap_or("(unknown)"))?;
        writeln!(
            f,
            "  CoreDevice ID: {}",
            self.coredevice_id.as_deref().unwrap_or("(unknown)")
        )?;
        if let Some(model) = &self.model {
            writeln!(f, "  Model: {model}")?;
        }
        if let Some(os) = &self.os_version {
            writeln!(f, "  OS: {os}")?;
        }
        write!(
            f,
            "  Status: {}",
            if self.available { "available" } else { "unavailable" }
        )
    }
}

/// Render a device list the way the `list_devices` tool reports it.
pub fn format_device_list(devices: &[DeviceRecord]) -> String {
    if devices.is_empty() {
        return "No physical devices found. Connect a device and make sure it is trusted."
            .to_string();
    }
    let mut out = format!("Found {} device(s):\n", devices.len());
    for device in devices {
        out.push_str(&device.to_string());
        out.push('\n');
    }
    out
}
