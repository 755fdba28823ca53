use serde::{Deserialize, Serialize};

/// Identity of the attached device, rebuilt from scratch on every probe.
/// Fields the device did not report stay empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceInfo {
    pub model: String,
    pub brand: String,
    pub android_version: String,
    pub serial: String,
}

impl DeviceInfo {
    pub fn summary_text(&self) -> String {
        format!(
            "Device: {}\nBrand: {}\nAndroid Version: {}\nSerial: {}",
            self.model, self.brand, self.android_version, self.serial
        )
    }
}

/// The first attached-device line of `adb devices`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceListEntry {
    pub serial: String,
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MirrorSession {
    pub session_id: String,
    pub pid: u32,
    pub started_at: String,
    pub trace_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MirrorEvent {
    Exited {
        session_id: String,
        exit_code: Option<i32>,
        last_error: Option<String>,
        trace_id: String,
    },
    WaitFailed {
        session_id: String,
        error: String,
        trace_id: String,
    },
}

impl MirrorEvent {
    pub fn session_id(&self) -> &str {
        match self {
            MirrorEvent::Exited { session_id, .. } | MirrorEvent::WaitFailed { session_id, .. } => {
                session_id
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolInfo {
    pub label: String,
    pub available: bool,
    pub version_output: String,
    pub command_path: String,
    pub error: Option<String>,
}
