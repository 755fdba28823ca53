use serde::Serialize;
use tracing::{debug, info};

use crate::app::error::AppError;
use crate::app::models::{DeviceInfo, MirrorEvent, MirrorSession};

pub const CONNECT_HINT: &str = "Connect your device via USB";
pub const DEBUGGING_HINT: &str = "You must enable USB debugging on your device!";
pub const NO_DEVICE_TEXT: &str = "No device detected. Please connect your Android device via USB.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisabledReason {
    NoDevice,
    Mirroring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum MirrorButton {
    Enabled,
    Disabled(DisabledReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerView {
    pub device: Option<DeviceInfo>,
    pub device_text: String,
    pub button: MirrorButton,
    pub notice: Option<String>,
    pub session: Option<MirrorSession>,
}

/// UI-side state: the device panel text, the mirror button and the running
/// session. Owned and mutated only by the UI thread.
#[derive(Debug)]
pub struct MirrorController {
    device: Option<DeviceInfo>,
    device_text: String,
    button: MirrorButton,
    notice: Option<String>,
    session: Option<MirrorSession>,
}

impl Default for MirrorController {
    fn default() -> Self {
        Self::new()
    }
}

impl MirrorController {
    pub fn new() -> Self {
        Self {
            device: None,
            device_text: String::new(),
            button: MirrorButton::Disabled(DisabledReason::NoDevice),
            notice: None,
            session: None,
        }
    }

    pub fn button(&self) -> MirrorButton {
        self.button
    }

    pub fn device(&self) -> Option<&DeviceInfo> {
        self.device.as_ref()
    }

    pub fn is_mirroring(&self) -> bool {
        self.session.is_some()
    }

    pub fn apply_probe(&mut self, result: Result<DeviceInfo, AppError>) {
        match result {
            Ok(info) => {
                self.device_text = info.summary_text();
                self.device = Some(info);
            }
            Err(err) if err.is_not_connected() => {
                self.device = None;
                self.device_text = NO_DEVICE_TEXT.to_string();
            }
            Err(err) => {
                self.device = None;
                self.device_text = format!("Error detecting device: {}", err.error);
            }
        }
        self.refresh_button();
    }

    /// Disables the button before `start` runs; a failed start restores it.
    pub fn begin_mirror<F>(&mut self, trace_id: &str, start: F) -> Result<(), AppError>
    where
        F: FnOnce() -> Result<MirrorSession, AppError>,
    {
        let rejection = match self.button {
            MirrorButton::Enabled => None,
            MirrorButton::Disabled(DisabledReason::Mirroring) => Some("Screen mirror is already running"),
            MirrorButton::Disabled(DisabledReason::NoDevice) => Some("No device connected"),
        };
        if let Some(message) = rejection {
            self.notice = Some(message.to_string());
            debug!(trace_id = %trace_id, reason = message, "mirror start refused");
            return Err(AppError::validation(message, trace_id));
        }

        self.button = MirrorButton::Disabled(DisabledReason::Mirroring);
        match start() {
            Ok(session) => {
                info!(trace_id = %trace_id, session_id = %session.session_id, "mirror session active");
                self.notice = Some("Screen mirror running".to_string());
                self.session = Some(session);
                Ok(())
            }
            Err(err) => {
                self.notice = Some(format!("Error starting screen mirror: {}", err.error));
                self.refresh_button();
                Err(err)
            }
        }
    }

    /// Returns `true` when the event ended the current session; events for
    /// any other session are ignored.
    pub fn handle_mirror_event(&mut self, event: &MirrorEvent) -> bool {
        let is_current = self
            .session
            .as_ref()
            .is_some_and(|session| session.session_id == event.session_id());
        if !is_current {
            debug!(session_id = %event.session_id(), "ignoring stale mirror event");
            return false;
        }

        self.session = None;
        self.notice = Some(match event {
            MirrorEvent::Exited {
                exit_code: Some(0), ..
            } => "Screen mirror closed".to_string(),
            MirrorEvent::Exited {
                exit_code,
                last_error: Some(line),
                ..
            } => format!("Screen mirror exited ({}): {line}", describe_exit(*exit_code)),
            MirrorEvent::Exited { exit_code, .. } => {
                format!("Screen mirror exited ({})", describe_exit(*exit_code))
            }
            MirrorEvent::WaitFailed { error, .. } => error.clone(),
        });
        self.refresh_button();
        true
    }

    pub fn view(&self) -> ControllerView {
        ControllerView {
            device: self.device.clone(),
            device_text: self.device_text.clone(),
            button: self.button,
            notice: self.notice.clone(),
            session: self.session.clone(),
        }
    }

    fn refresh_button(&mut self) {
        self.button = if self.session.is_some() {
            MirrorButton::Disabled(DisabledReason::Mirroring)
        } else if self.device.is_some() {
            MirrorButton::Enabled
        } else {
            MirrorButton::Disabled(DisabledReason::NoDevice)
        };
    }
}

fn describe_exit(exit_code: Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("code {code}"),
        None => "terminated by signal".to_string(),
    }
}
