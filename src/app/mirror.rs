use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app::error::AppError;
use crate::app::models::{MirrorEvent, MirrorSession};

pub type MirrorEmitter = Arc<dyn Fn(MirrorEvent) + Send + Sync>;

/// How long the worker waits for the output readers after the child exits.
/// A helper process that inherited the pipes can hold them open far longer.
const STREAM_DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Runs the mirroring tool as a supervised child, one session at a time.
///
/// `start` spawns the child on the calling thread, then hands it to a worker
/// that blocks on exit and reports back through the emitter. The active slot
/// is cleared before the exit event is emitted, so a consumer reacting to the
/// event can start a new session right away.
pub struct MirrorSupervisor {
    program: String,
    args: Vec<String>,
    active: Arc<Mutex<Option<MirrorSession>>>,
}

impl MirrorSupervisor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            active: Arc::new(Mutex::new(None)),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn is_running(&self) -> bool {
        self.active_session().is_some()
    }

    pub fn active_session(&self) -> Option<MirrorSession> {
        self.active.lock().ok().and_then(|guard| guard.clone())
    }

    pub fn start(&self, trace_id: &str, emitter: MirrorEmitter) -> Result<MirrorSession, AppError> {
        let mut guard = self
            .active
            .lock()
            .map_err(|_| AppError::system("Mirror session state is unavailable", trace_id))?;
        if let Some(session) = guard.as_ref() {
            warn!(
                trace_id = %trace_id,
                session_id = %session.session_id,
                "mirror start rejected"
            );
            return Err(AppError::validation(
                "Screen mirror is already running",
                trace_id,
            ));
        }

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                AppError::launch(format!("Failed to launch {}: {err}", self.program), trace_id)
            })?;

        let session = MirrorSession {
            session_id: Uuid::new_v4().to_string(),
            pid: child.id(),
            started_at: Utc::now().to_rfc3339(),
            trace_id: trace_id.to_string(),
        };
        info!(
            trace_id = %trace_id,
            session_id = %session.session_id,
            pid = session.pid,
            program = %self.program,
            "mirror started"
        );

        let last_error = Arc::new(Mutex::new(None::<String>));
        let (drained_tx, drained_rx) = mpsc::channel::<()>();
        let mut streams = 0;
        if let Some(stdout) = child.stdout.take() {
            log_stream(stdout, "stdout", session.session_id.clone(), None, drained_tx.clone());
            streams += 1;
        }
        if let Some(stderr) = child.stderr.take() {
            log_stream(
                stderr,
                "stderr",
                session.session_id.clone(),
                Some(Arc::clone(&last_error)),
                drained_tx,
            );
            streams += 1;
        }

        *guard = Some(session.clone());
        drop(guard);

        let active = Arc::clone(&self.active);
        let worker_session = session.clone();
        thread::spawn(move || {
            let event = wait_for_exit(child, &worker_session, &drained_rx, streams, &last_error);
            if let Ok(mut guard) = active.lock() {
                if guard
                    .as_ref()
                    .is_some_and(|current| current.session_id == worker_session.session_id)
                {
                    *guard = None;
                }
            }
            emitter(event);
        });

        Ok(session)
    }
}

fn wait_for_exit(
    mut child: Child,
    session: &MirrorSession,
    drained: &Receiver<()>,
    streams: usize,
    last_error: &Mutex<Option<String>>,
) -> MirrorEvent {
    let status = child.wait();
    // Readers are never joined: the exit is reported once the child is gone.
    let deadline = Instant::now() + STREAM_DRAIN_GRACE;
    for _ in 0..streams {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if drained.recv_timeout(remaining).is_err() {
            debug!(session_id = %session.session_id, "mirror output still open after exit");
            break;
        }
    }

    match status {
        Ok(status) => {
            let exit_code = status.code();
            let last_error = if status.success() {
                None
            } else {
                last_error.lock().ok().and_then(|guard| guard.clone())
            };
            info!(
                trace_id = %session.trace_id,
                session_id = %session.session_id,
                exit_code = ?exit_code,
                "mirror exited"
            );
            MirrorEvent::Exited {
                session_id: session.session_id.clone(),
                exit_code,
                last_error,
                trace_id: session.trace_id.clone(),
            }
        }
        Err(err) => {
            warn!(
                trace_id = %session.trace_id,
                session_id = %session.session_id,
                error = %err,
                "failed to wait for mirror"
            );
            MirrorEvent::WaitFailed {
                session_id: session.session_id.clone(),
                error: format!("Failed to wait for mirror process: {err}"),
                trace_id: session.trace_id.clone(),
            }
        }
    }
}

fn log_stream<R: Read + Send + 'static>(
    stream: R,
    name: &'static str,
    session_id: String,
    last_line: Option<Arc<Mutex<Option<String>>>>,
    drained: Sender<()>,
) {
    thread::spawn(move || {
        let reader = BufReader::new(stream);
        for line in reader.lines() {
            let Ok(line) = line else {
                break;
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            debug!(session_id = %session_id, stream = name, line = %trimmed, "mirror output");
            if let Some(slot) = last_line.as_ref() {
                if let Ok(mut guard) = slot.lock() {
                    *guard = Some(trimmed.to_string());
                }
            }
        }
        let _ = drained.send(());
    });
}
