use serde::Serialize;
use std::fmt;

pub const ERR_VALIDATION: &str = "ERR_VALIDATION";
pub const ERR_SYSTEM: &str = "ERR_SYSTEM";
pub const ERR_NOT_CONNECTED: &str = "ERR_NOT_CONNECTED";
pub const ERR_LAUNCH: &str = "ERR_LAUNCH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppError {
    pub error: String,
    pub code: String,
    pub trace_id: String,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
            trace_id: trace_id.into(),
        }
    }

    pub fn validation(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ERR_VALIDATION, message, trace_id)
    }

    pub fn system(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ERR_SYSTEM, message, trace_id)
    }

    /// The bridge tool answered, but no attached device is in the `device` state.
    pub fn not_connected(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ERR_NOT_CONNECTED, message, trace_id)
    }

    /// An external tool could not be started, polled, or finished in time.
    pub fn launch(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ERR_LAUNCH, message, trace_id)
    }

    pub fn is_not_connected(&self) -> bool {
        self.code == ERR_NOT_CONNECTED
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.error, self.code)
    }
}

impl std::error::Error for AppError {}
