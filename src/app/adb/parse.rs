use crate::app::models::DeviceListEntry;

pub const CONNECTED_STATE: &str = "device";

/// Picks the first attached device out of `adb devices` output.
///
/// The line right after the header must carry the `device` status; any other
/// status (`unauthorized`, `offline`, `no permissions`) means nothing usable is
/// attached. Daemon start-up chatter (`* daemon ...`) is skipped.
pub fn parse_device_listing(output: &str) -> Option<DeviceListEntry> {
    let line = output
        .trim()
        .lines()
        .filter(|line| !line.trim_start().starts_with('*'))
        .nth(1)?;

    let serial = line.split('\t').next().unwrap_or_default().trim();
    let state = line.split_whitespace().nth(1).unwrap_or_default();
    if serial.is_empty() || state != CONNECTED_STATE {
        return None;
    }
    Some(DeviceListEntry {
        serial: serial.to_string(),
        state: state.to_string(),
    })
}

pub fn parse_getprop_value(output: &str) -> String {
    output.trim().to_string()
}
