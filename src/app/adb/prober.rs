use std::time::Duration;

use tracing::{info, warn};

use crate::app::adb::parse::{parse_device_listing, parse_getprop_value};
use crate::app::adb::runner::{run_command_with_timeout, CommandOutput};
use crate::app::error::AppError;
use crate::app::models::DeviceInfo;

pub const PROP_MODEL: &str = "ro.product.model";
pub const PROP_BRAND: &str = "ro.product.brand";
pub const PROP_ANDROID_VERSION: &str = "ro.build.version.release";

pub fn probe_device(adb_program: &str, timeout: Duration, trace_id: &str) -> Result<DeviceInfo, AppError> {
    probe_device_with(
        |args| run_command_with_timeout(adb_program, args, timeout, trace_id),
        trace_id,
    )
}

/// One probe cycle: `devices`, then three `shell getprop` queries in order.
/// `run` executes a single bridge invocation with the given arguments.
pub fn probe_device_with<F>(mut run: F, trace_id: &str) -> Result<DeviceInfo, AppError>
where
    F: FnMut(&[String]) -> Result<CommandOutput, AppError>,
{
    let devices_args = vec!["devices".to_string()];
    let listing = run(devices_args.as_slice())?;
    if !listing.success() {
        warn!(
            trace_id = %trace_id,
            exit_code = ?listing.exit_code,
            stderr = %listing.stderr.trim(),
            "adb devices exited with an error"
        );
    }

    let Some(entry) = parse_device_listing(&listing.stdout) else {
        info!(trace_id = %trace_id, "no connected device");
        return Err(AppError::not_connected(
            "No device detected. Please connect your Android device via USB.",
            trace_id,
        ));
    };

    let mut getprop = |key: &str| -> Result<String, AppError> {
        let args = vec!["shell".to_string(), "getprop".to_string(), key.to_string()];
        let output = run(args.as_slice())?;
        if !output.success() {
            warn!(
                trace_id = %trace_id,
                key = %key,
                exit_code = ?output.exit_code,
                stderr = %output.stderr.trim(),
                "getprop failed"
            );
        }
        Ok(parse_getprop_value(&output.stdout))
    };

    let model = getprop(PROP_MODEL)?;
    let brand = getprop(PROP_BRAND)?;
    let android_version = getprop(PROP_ANDROID_VERSION)?;

    info!(trace_id = %trace_id, serial = %entry.serial, model = %model, "device detected");
    Ok(DeviceInfo {
        model,
        brand,
        android_version,
        serial: entry.serial,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn ok(stdout: &str) -> CommandOutput {
        CommandOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    struct FakeAdb {
        responses: HashMap<String, Result<CommandOutput, AppError>>,
        calls: Vec<String>,
    }

    impl FakeAdb {
        fn connected() -> Self {
            let mut responses = HashMap::new();
            responses.insert(
                "devices".to_string(),
                Ok(ok("List of devices attached\nR58M123ABC\tdevice\n\n")),
            );
            responses.insert("shell getprop ro.product.model".to_string(), Ok(ok("SM-G991B\n")));
            responses.insert("shell getprop ro.product.brand".to_string(), Ok(ok("samsung\n")));
            responses.insert("shell getprop ro.build.version.release".to_string(), Ok(ok("14\n")));
            Self {
                responses,
                calls: Vec::new(),
            }
        }

        fn run(&mut self, args: &[String]) -> Result<CommandOutput, AppError> {
            let key = args.join(" ");
            self.calls.push(key.clone());
            self.responses
                .get(&key)
                .cloned()
                .unwrap_or_else(|| Ok(ok("")))
        }
    }

    #[test]
    fn header_only_output_is_not_connected() {
        let mut adb = FakeAdb::connected();
        adb.responses
            .insert("devices".to_string(), Ok(ok("List of devices attached\n\n")));

        let err = probe_device_with(|args| adb.run(args), "trace-1").expect_err("expected not connected");
        assert!(err.is_not_connected());
        assert_eq!(err.trace_id, "trace-1");
        assert_eq!(adb.calls, vec!["devices".to_string()]);
    }

    #[test]
    fn connected_device_is_populated_from_getprop_and_listing() {
        let mut adb = FakeAdb::connected();
        let info = probe_device_with(|args| adb.run(args), "trace-2").expect("probe");
        assert_eq!(
            info,
            DeviceInfo {
                model: "SM-G991B".to_string(),
                brand: "samsung".to_string(),
                android_version: "14".to_string(),
                serial: "R58M123ABC".to_string(),
            }
        );
        assert_eq!(
            adb.calls,
            vec![
                "devices",
                "shell getprop ro.product.model",
                "shell getprop ro.product.brand",
                "shell getprop ro.build.version.release",
            ]
        );
    }

    #[test]
    fn failing_getprop_leaves_field_empty() {
        let mut adb = FakeAdb::connected();
        adb.responses.insert(
            "shell getprop ro.product.brand".to_string(),
            Ok(CommandOutput {
                stdout: String::new(),
                stderr: "error: device offline".to_string(),
                exit_code: Some(1),
            }),
        );
        let info = probe_device_with(|args| adb.run(args), "trace-3").expect("probe");
        assert_eq!(info.brand, "");
        assert_eq!(info.model, "SM-G991B");
    }

    #[test]
    fn launch_failure_propagates_as_launch_error() {
        let err = probe_device_with(
            |_args| Err(AppError::launch("Failed to launch adb: not found", "trace-4")),
            "trace-4",
        )
        .expect_err("expected launch failure");
        assert_eq!(err.code, "ERR_LAUNCH");
        assert!(!err.is_not_connected());
    }

    #[test]
    fn getprop_launch_failure_aborts_probe() {
        let mut adb = FakeAdb::connected();
        adb.responses.insert(
            "shell getprop ro.product.model".to_string(),
            Err(AppError::launch("adb timed out after 10s", "trace-5")),
        );
        let err = probe_device_with(|args| adb.run(args), "trace-5").expect_err("expected failure");
        assert_eq!(err.code, "ERR_LAUNCH");
        assert_eq!(adb.calls.len(), 2);
    }

    #[test]
    fn repeated_probes_are_identical() {
        let mut adb = FakeAdb::connected();
        let first = probe_device_with(|args| adb.run(args), "trace-6").expect("first");
        let second = probe_device_with(|args| adb.run(args), "trace-6").expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn missing_adb_binary_is_a_launch_error() {
        let err = probe_device(
            "/this/path/should/not/exist/adb",
            Duration::from_secs(1),
            "trace-7",
        )
        .expect_err("expected launch failure");
        assert_eq!(err.code, "ERR_LAUNCH");
    }

    #[cfg(unix)]
    #[test]
    fn probes_through_a_real_bridge_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let script = dir.path().join("adb");
        std::fs::write(
            &script,
            "#!/bin/sh\n\
             if [ \"$1\" = \"devices\" ]; then\n\
               printf 'List of devices attached\\nemulator-5554\\tdevice\\n\\n'\n\
               exit 0\n\
             fi\n\
             case \"$3\" in\n\
               ro.product.model) echo 'sdk_gphone64' ;;\n\
               ro.product.brand) echo 'google' ;;\n\
               ro.build.version.release) echo '15' ;;\n\
             esac\n",
        )
        .expect("write script");
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).expect("chmod");

        let program = script.to_string_lossy().into_owned();
        let info = probe_device(&program, Duration::from_secs(5), "trace-8").expect("probe");
        assert_eq!(info.serial, "emulator-5554");
        assert_eq!(info.model, "sdk_gphone64");
        assert_eq!(info.brand, "google");
        assert_eq!(info.android_version, "15");
    }
}
