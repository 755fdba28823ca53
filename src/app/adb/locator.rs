use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app::adb::runner::run_command_with_timeout;
use crate::app::config::ToolSettings;
use crate::app::models::ToolInfo;

/// Resolved executables for the bridge and mirroring tools, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub adb: String,
    pub scrcpy: String,
}

impl ToolPaths {
    pub fn resolve(settings: &ToolSettings, base_dir: &Path) -> Self {
        let deps_dir = dependencies_dir(&settings.dependencies_dir, base_dir);
        Self {
            adb: resolve_tool_program(&settings.adb_path, &deps_dir, "adb"),
            scrcpy: resolve_tool_program(&settings.scrcpy_path, &deps_dir, "scrcpy"),
        }
    }
}

/// Directory of the running executable; falls back to the working directory.
pub fn application_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn normalize_command_path(value: &str) -> String {
    let trimmed = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|candidate| candidate.strip_suffix(quote))
        {
            return inner.trim().to_string();
        }
    }
    trimmed.to_string()
}

fn dependencies_dir(configured: &str, base_dir: &Path) -> PathBuf {
    let configured = normalize_command_path(configured);
    let path = Path::new(&configured);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn resolve_tool_program(configured: &str, deps_dir: &Path, name: &str) -> String {
    let normalized = normalize_command_path(configured);
    if !normalized.is_empty() {
        return normalized;
    }
    deps_dir
        .join(format!("{name}{}", std::env::consts::EXE_SUFFIX))
        .to_string_lossy()
        .into_owned()
}

fn is_bare_command(program: &str) -> bool {
    !program.contains('/') && !program.contains('\\')
}

pub fn validate_tool_program(label: &str, program: &str) -> Result<(), String> {
    if program.trim().is_empty() {
        return Err(format!("{label} command is empty"));
    }
    if is_bare_command(program) {
        return Ok(());
    }
    let path = Path::new(program);
    if path.is_dir() {
        return Err(format!("{label} path must point to an executable file"));
    }
    if !path.exists() {
        return Err(format!("{label} executable not found at {program}"));
    }
    Ok(())
}

pub fn check_tool(
    label: &str,
    program: &str,
    version_args: &[String],
    timeout: Duration,
    trace_id: &str,
) -> ToolInfo {
    let mut info = ToolInfo {
        label: label.to_string(),
        available: false,
        version_output: String::new(),
        command_path: program.to_string(),
        error: None,
    };

    if let Err(message) = validate_tool_program(label, program) {
        info.error = Some(message);
        return info;
    }

    match run_command_with_timeout(program, version_args, timeout, trace_id) {
        Ok(output) => {
            let mut version_output = output.stdout.trim().to_string();
            let stderr = output.stderr.trim();
            if !stderr.is_empty() {
                if !version_output.is_empty() {
                    version_output.push('\n');
                }
                version_output.push_str(stderr);
            }
            info.available = output.success();
            if !info.available {
                info.error = Some(format!("{label} exited with code {:?}", output.exit_code));
            }
            info.version_output = version_output;
        }
        Err(err) => info.error = Some(err.error),
    }
    info
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_wrapping_quotes() {
        assert_eq!(
            normalize_command_path("  \"/opt/android/platform-tools/adb\"  "),
            "/opt/android/platform-tools/adb"
        );
        assert_eq!(
            normalize_command_path("  '/opt/scrcpy/scrcpy'  "),
            "/opt/scrcpy/scrcpy"
        );
    }

    #[test]
    fn resolves_bundled_tools_next_to_application() {
        let settings = ToolSettings::default();
        let tools = ToolPaths::resolve(&settings, Path::new("/apps/mirror"));
        let suffix = std::env::consts::EXE_SUFFIX;
        assert_eq!(
            PathBuf::from(&tools.adb),
            Path::new("/apps/mirror").join("dependencies").join(format!("adb{suffix}"))
        );
        assert_eq!(
            PathBuf::from(&tools.scrcpy),
            Path::new("/apps/mirror").join("dependencies").join(format!("scrcpy{suffix}"))
        );
    }

    #[test]
    fn explicit_paths_override_bundled_tools() {
        let settings = ToolSettings {
            adb_path: "'/usr/bin/adb'".to_string(),
            scrcpy_path: "scrcpy".to_string(),
            ..ToolSettings::default()
        };
        let tools = ToolPaths::resolve(&settings, Path::new("/apps/mirror"));
        assert_eq!(tools.adb, "/usr/bin/adb");
        assert_eq!(tools.scrcpy, "scrcpy");
    }

    #[test]
    fn absolute_dependencies_dir_is_used_as_is() {
        let deps = tempfile::tempdir().expect("tempdir");
        let settings = ToolSettings {
            dependencies_dir: deps.path().to_string_lossy().into_owned(),
            ..ToolSettings::default()
        };
        let tools = ToolPaths::resolve(&settings, Path::new("/elsewhere"));
        assert!(Path::new(&tools.adb).starts_with(deps.path()));
    }

    #[test]
    fn validates_missing_and_directory_paths() {
        let err = validate_tool_program("adb", "/this/path/should/not/exist/adb").unwrap_err();
        assert!(err.to_lowercase().contains("not found"));

        let dir = tempfile::tempdir().expect("tempdir");
        let dir_path = dir.path().to_string_lossy().into_owned();
        let err = validate_tool_program("scrcpy", &dir_path).unwrap_err();
        assert!(err.contains("executable file"));

        assert!(validate_tool_program("adb", " ").is_err());
        assert!(validate_tool_program("adb", "adb").is_ok());
    }

    #[test]
    fn check_tool_reports_missing_binary_without_spawning() {
        let info = check_tool(
            "scrcpy",
            "/this/path/should/not/exist/scrcpy",
            &["--version".to_string()],
            Duration::from_secs(1),
            "trace",
        );
        assert!(!info.available);
        assert!(info.error.unwrap_or_default().contains("not found"));
    }

    #[cfg(unix)]
    #[test]
    fn check_tool_collects_version_output() {
        let info = check_tool(
            "sh",
            "sh",
            &["-c".to_string(), "echo 'scrcpy 2.4'".to_string()],
            Duration::from_secs(5),
            "trace",
        );
        assert!(info.available);
        assert_eq!(info.version_output, "scrcpy 2.4");
        assert!(info.error.is_none());
    }
}
