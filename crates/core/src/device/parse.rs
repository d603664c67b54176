//! Parsers for the two device listings.
//!
//! Neither tool documents its text format, so both parsers skip anything they
//! don't recognise instead of failing.

use once_cell::sync::Lazy;
use regex::Regex;
use xcpilot_api::DeviceRecord;

static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(([0-9A-Fa-f]{8}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{12})\)")
        .expect("static regex")
});

static HARDWARE_MODEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b((?:iPhone|iPad|iPod|Watch|AppleTV|Mac|RealityDevice)\d+,\d+)\b")
        .expect("static regex")
});

static OS_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((\d+(?:\.\d+)+)\)").expect("static regex"));

static COLUMN_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{3,}").expect("static regex"));

/// Physical devices from `xcrun xctrace list devices`.
///
/// ```text
/// == Devices ==
/// Jane's iPhone (17.4) (AAAAAAAA-BBBB-CCCC-DDDD-EEEEEEEEEEEE)
/// == Simulators ==
/// iPhone 15 Simulator (17.4) (11111111-2222-3333-4444-555555555555)
/// ```
pub fn parse_xctrace(output: &str) -> Vec<DeviceRecord> {
    output.lines().filter_map(parse_xctrace_line).collect()
}

fn parse_xctrace_line(line: &str) -> Option<DeviceRecord> {
    if !line.contains('(') || line.contains("Simulator") || line.contains("==") {
        return None;
    }

    let name = line.split('(').next()?.trim();
    let udid = UUID.captures(line)?.get(1)?.as_str();
    if name.is_empty() {
        return None;
    }

    let mut record = DeviceRecord::new(name);
    record.udid = Some(udid.to_string());
    record.available = !line.contains("Offline");
    record.model = HARDWARE_MODEL
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    record.os_version = OS_VERSION
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    Some(record)
}

/// Devices from `devicectl list devices`.
///
/// ```text
/// Devices:
/// Name            Hostname                        Identifier                             State                Model
/// -------------   -----------------------------   ------------------------------------   ------------------   ---------------------------
/// Jane's iPhone   Janes-iPhone.coredevice.local   00008110-001234567890ABCD              available (paired)   iPhone 15 Pro (iPhone16,1)
/// ```
pub fn parse_devicectl(output: &str) -> Vec<DeviceRecord> {
    let mut lines = output.lines();
    if !lines
        .by_ref()
        .any(|line| line.contains("Name") && line.contains("Identifier"))
    {
        return Vec::new();
    }

    lines.filter_map(parse_devicectl_row).collect()
}

fn parse_devicectl_row(line: &str) -> Option<DeviceRecord> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with("--") {
        return None;
    }

    let columns: Vec<&str> = COLUMN_GAP.split(trimmed).collect();
    if columns.len() < 4 {
        return None;
    }

    let mut record = DeviceRecord::new(columns[0].trim());
    record.coredevice_id = Some(columns[2].trim().to_string());
    record.available = state_is_available(columns[3]);
    record.model = columns.get(4).and_then(|model| {
        HARDWARE_MODEL
            .captures(model)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    });
    Some(record)
}

/// `available (paired)` and `connected` count; `unavailable` and `disconnected` don't.
fn state_is_available(state: &str) -> bool {
    let state = state.to_lowercase();
    if state.contains("unavailable") || state.contains("disconnected") {
        return false;
    }
    state.contains("available") || state.contains("connected")
}
