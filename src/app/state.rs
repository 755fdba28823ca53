use std::path::Path;
use std::time::Duration;

use crate::app::adb::locator::{check_tool, validate_tool_program, ToolPaths};
use crate::app::adb::prober::probe_device;
use crate::app::adb::scrcpy::{build_scrcpy_args, version_args};
use crate::app::config::AppConfig;
use crate::app::error::AppError;
use crate::app::mirror::{MirrorEmitter, MirrorSupervisor};
use crate::app::models::{DeviceInfo, MirrorSession, ToolInfo};

pub struct AppState {
    pub config: AppConfig,
    pub tools: ToolPaths,
    pub supervisor: MirrorSupervisor,
}

impl AppState {
    pub fn new(config: AppConfig, base_dir: &Path) -> Self {
        let tools = ToolPaths::resolve(&config.tools, base_dir);
        let supervisor = MirrorSupervisor::new(tools.scrcpy.clone(), build_scrcpy_args(&config.scrcpy));
        Self {
            config,
            tools,
            supervisor,
        }
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.config.tools.command_timeout_secs)
    }

    pub fn probe(&self, trace_id: &str) -> Result<DeviceInfo, AppError> {
        validate_tool_program("adb", &self.tools.adb)
            .map_err(|message| AppError::launch(message, trace_id))?;
        probe_device(&self.tools.adb, self.command_timeout(), trace_id)
    }

    pub fn start_mirror(&self, trace_id: &str, emitter: MirrorEmitter) -> Result<MirrorSession, AppError> {
        validate_tool_program("scrcpy", &self.tools.scrcpy)
            .map_err(|message| AppError::launch(message, trace_id))?;
        self.supervisor.start(trace_id, emitter)
    }

    pub fn check_tools(&self, trace_id: &str) -> Vec<ToolInfo> {
        let timeout = self.command_timeout();
        vec![
            check_tool("adb", &self.tools.adb, &["version".to_string()], timeout, trace_id),
            check_tool("scrcpy", &self.tools.scrcpy, &version_args(), timeout, trace_id),
        ]
    }
}
