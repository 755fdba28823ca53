use std::path::PathBuf;
use std::process::ExitCode;

use android_mirror_lib::app::adb::locator::application_dir;
use android_mirror_lib::app::adb::scrcpy::parse_scrcpy_major;
use android_mirror_lib::app::config::{
    backup_config_path, config_path, load_config_from_path, save_config_to_path,
};
use android_mirror_lib::app::controller::MirrorController;
use android_mirror_lib::app::gui::{run_gui, GuiOptions};
use android_mirror_lib::app::logging::{init_logging, new_trace_id};
use android_mirror_lib::app::models::ToolInfo;
use android_mirror_lib::app::state::AppState;
use serde::Serialize;
use tracing::{error, info, warn};

const HELP: &str = "\
Usage: android_mirror [options]

Opens the AndroidMirror window unless --probe, --check or --init-config is given.

Options:
  --config <path>       Read settings from <path>
  --init-config         Write the effective settings to the config path and exit
  --probe               Check for a device once, print the result and exit 0 when connected
  --json                Print the --probe result as JSON
  --check               Report adb/scrcpy availability and exit
  --start               Start mirroring as soon as the window opens
  --exit-after-mirror   Close the window when the mirror session ends
  -h, --help            Show this help";

#[derive(Debug, Clone, Default)]
struct Args {
    config: Option<PathBuf>,
    init_config: bool,
    json: bool,
    probe: bool,
    check: bool,
    start: bool,
    exit_after_mirror: bool,
}

#[derive(Serialize)]
struct ToolReport {
    trace_id: String,
    tools: Vec<ToolInfo>,
    scrcpy_major_version: Option<i32>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => {
                let value = it
                    .next()
                    .ok_or_else(|| "--config requires a value".to_string())?;
                args.config = Some(PathBuf::from(value));
            }
            "--init-config" => args.init_config = true,
            "--json" => args.json = true,
            "--probe" => args.probe = true,
            "--check" => args.check = true,
            "--start" => args.start = true,
            "--exit-after-mirror" => args.exit_after_mirror = true,
            "-h" | "--help" => return Err(String::new()),
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(args)
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(message) if message.is_empty() => {
            println!("{HELP}");
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("{message}\n\n{HELP}");
            return ExitCode::from(2);
        }
    };

    let path = args.config.clone().unwrap_or_else(config_path);
    let config = match load_config_from_path(&path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{} ({})", err.error, path.display());
            return ExitCode::from(2);
        }
    };
    init_logging(&config.logging);

    if args.init_config {
        return match save_config_to_path(&config, &path, &backup_config_path(&path)) {
            Ok(()) => {
                println!("{}", path.display());
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("{}", err.error);
                ExitCode::FAILURE
            }
        };
    }

    let state = AppState::new(config, &application_dir());
    info!(adb = %state.tools.adb, scrcpy = %state.tools.scrcpy, "tools resolved");

    if args.check {
        return print_tool_report(&state);
    }
    if args.probe {
        return print_device_report(&state, args.json);
    }

    let options = GuiOptions {
        start_on_launch: args.start,
        exit_after_mirror: args.exit_after_mirror,
    };
    match run_gui(state, options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(trace_id = %err.trace_id, error = %err.error, "window closed with error");
            eprintln!("{}", err.error);
            ExitCode::FAILURE
        }
    }
}

fn print_device_report(state: &AppState, json: bool) -> ExitCode {
    let mut controller = MirrorController::new();
    controller.apply_probe(state.probe(&new_trace_id()));
    let view = controller.view();
    if json {
        match serde_json::to_string(&view) {
            Ok(line) => println!("{line}"),
            Err(err) => warn!(error = %err, "failed to serialize view"),
        }
    } else {
        println!("{}", view.device_text);
    }
    if controller.device().is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_tool_report(state: &AppState) -> ExitCode {
    let trace_id = new_trace_id();
    let tools = state.check_tools(&trace_id);
    let scrcpy_major_version = tools
        .iter()
        .find(|tool| tool.label == "scrcpy" && tool.available)
        .map(|tool| parse_scrcpy_major(&tool.version_output));
    let all_available = tools.iter().all(|tool| tool.available);
    let report = ToolReport {
        trace_id,
        tools,
        scrcpy_major_version,
    };
    match serde_json::to_string_pretty(&report) {
        Ok(payload) => println!("{payload}"),
        Err(err) => eprintln!("Failed to serialize report: {err}"),
    }
    if all_available {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
