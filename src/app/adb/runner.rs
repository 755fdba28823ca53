use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::app::error::AppError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn run_command_with_timeout(
    program: &str,
    args: &[String],
    timeout: Duration,
    trace_id: &str,
) -> Result<CommandOutput, AppError> {
    debug!(trace_id = %trace_id, program = %program, args = ?args, "run command");
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| AppError::launch(format!("Failed to launch {program}: {err}"), trace_id))?;

    // Both pipes are drained while we poll; a child that fills a pipe buffer
    // would otherwise stall until the timeout.
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::launch("Failed to capture stdout", trace_id))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| AppError::launch("Failed to capture stderr", trace_id))?;
    let stdout_handle = drain(stdout);
    let stderr_handle = drain(stderr);

    let start = Instant::now();
    let exit_code = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status.code(),
            Ok(None) if start.elapsed() > timeout => {
                let _ = child.kill();
                let _ = child.wait();
                let _ = stdout_handle.join();
                let _ = stderr_handle.join();
                return Err(AppError::launch(
                    format!("{program} timed out after {}s", timeout.as_secs()),
                    trace_id,
                ));
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(err) => {
                let _ = child.kill();
                let _ = child.wait();
                let _ = stdout_handle.join();
                let _ = stderr_handle.join();
                return Err(AppError::launch(
                    format!("Failed to poll {program}: {err}"),
                    trace_id,
                ));
            }
        }
    };

    let stdout_bytes = stdout_handle.join().unwrap_or_default();
    let stderr_bytes = stderr_handle.join().unwrap_or_default();

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
        stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
        exit_code,
    })
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = reader.read_to_end(&mut buffer);
        buffer
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn shell(script: &str) -> (String, Vec<String>) {
        ("sh".to_string(), vec!["-c".to_string(), script.to_string()])
    }

    #[test]
    fn missing_binary_is_a_launch_error() {
        let err = run_command_with_timeout(
            "/this/path/should/not/exist/adb",
            &["devices".to_string()],
            Duration::from_secs(1),
            "trace-missing",
        )
        .expect_err("expected spawn failure");
        assert_eq!(err.code, "ERR_LAUNCH");
        assert_eq!(err.trace_id, "trace-missing");
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout_stderr_and_exit_code() {
        let (program, args) = shell("echo out; echo err >&2; exit 3");
        let output = run_command_with_timeout(&program, &args, Duration::from_secs(5), "trace")
            .expect("run");
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
    }

    #[cfg(unix)]
    #[test]
    fn does_not_deadlock_on_large_stdout() {
        let (program, args) =
            shell("i=0; while [ $i -lt 100000 ]; do echo 1234567890; i=$((i+1)); done");
        let output = run_command_with_timeout(&program, &args, Duration::from_secs(10), "trace")
            .expect("expected large-output command to complete without timing out");
        assert_eq!(output.exit_code, Some(0));
        assert!(output.stdout.len() >= 1_000_000);
    }

    #[cfg(unix)]
    #[test]
    fn kills_child_on_timeout() {
        let (program, args) = shell("exec sleep 30");
        let start = Instant::now();
        let err = run_command_with_timeout(&program, &args, Duration::from_millis(200), "trace")
            .expect_err("expected timeout");
        assert_eq!(err.code, "ERR_LAUNCH");
        assert!(err.error.contains("timed out"));
        assert!(start.elapsed() < Duration::from_secs(10));
    }
}
