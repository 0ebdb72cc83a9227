//! The job controller: shared run state plus the broadcast hub.
//!
//! Exactly one `JobController` exists per process, created at startup
//! and injected into the HTTP layer. All state lives behind one mutex;
//! every operation below is a single critical section, so status
//! snapshots are always consistent and a subscriber's replay can never
//! miss or duplicate a record.

use std::sync::{Mutex, MutexGuard};

use tokio::process::Child;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use fdlctl_core::LogRecord;

use super::error::JobError;

/// Consistent snapshot of the running flag and the log buffer.
#[derive(Debug, Clone)]
pub struct JobStatus {
    pub running: bool,
    pub log: Vec<LogRecord>,
}

#[derive(Default)]
struct JobState {
    running: bool,
    buffer: Vec<LogRecord>,
    child: Option<Child>,
    subscribers: Vec<mpsc::UnboundedSender<LogRecord>>,
}

/// Single-flight job state owner and record broadcaster.
#[derive(Default)]
pub struct JobController {
    state: Mutex<JobState>,
}

impl JobController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the run slot. Clears the previous run's buffer on success.
    pub fn begin_run(&self) -> Result<(), JobError> {
        let mut state = self.lock();
        if state.running {
            return Err(JobError::AlreadyRunning);
        }
        state.buffer.clear();
        state.child = None;
        state.running = true;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// Append a record to the buffer and fan it out to every live
    /// subscriber. A subscriber whose channel is gone is pruned here.
    pub fn append(&self, record: LogRecord) {
        let mut state = self.lock();
        push_record(&mut state, record);
    }

    /// Hand the controller the subprocess handle for the active run.
    /// Only meaningful while running, at the main-execution step.
    pub fn attach_child(&self, child: Child) {
        let mut state = self.lock();
        if !state.running {
            warn!("child attached with no active run; dropping handle");
            return;
        }
        state.child = Some(child);
    }

    /// Take the subprocess handle back, if it is still there. Returns
    /// `None` when the run was cancelled in the meantime.
    pub fn take_child(&self) -> Option<Child> {
        self.lock().child.take()
    }

    /// End the active run: append the terminal `complete` record, push
    /// it to subscribers, clear the handle, flip the running flag and
    /// close every subscriber stream. The single completion path for
    /// success, failure and cancellation; no-op if no run is active.
    pub fn end_run(&self, message: impl Into<String>) {
        let mut state = self.lock();
        if !state.running {
            return;
        }
        finish(&mut state, message.into());
    }

    /// Forcibly terminate the active subprocess and end the run.
    /// Returns `false` when no subprocess handle exists ("nothing to
    /// cancel") - including during pipeline steps that have not yet
    /// spawned the main process.
    pub fn cancel(&self) -> bool {
        let mut state = self.lock();
        match state.child.take() {
            Some(mut child) => {
                if let Err(e) = child.start_kill() {
                    warn!(error = %e, "failed to signal pipeline process");
                }
                // Reap off to the side; cancellation does not wait for
                // the process to exit before flipping state.
                tokio::spawn(async move {
                    let _ = child.wait().await;
                });
                finish(&mut state, "Execution cancelled by user".to_string());
                true
            }
            None => false,
        }
    }

    /// Clear the buffer and handle between runs. Subscribers stay
    /// attached in anticipation of the next run.
    pub fn reset(&self) -> Result<(), JobError> {
        let mut state = self.lock();
        if state.running {
            return Err(JobError::Busy);
        }
        state.buffer.clear();
        state.child = None;
        Ok(())
    }

    pub fn status(&self) -> JobStatus {
        let state = self.lock();
        JobStatus {
            running: state.running,
            log: state.buffer.clone(),
        }
    }

    /// Attach a new subscriber. The entire existing buffer is replayed
    /// into the channel before the sender is registered, all under one
    /// lock acquisition, so the subscriber sees every record exactly
    /// once and in order.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<LogRecord> {
        let mut state = self.lock();
        let (tx, rx) = mpsc::unbounded_channel();
        for record in &state.buffer {
            let _ = tx.send(record.clone());
        }
        state.subscribers.push(tx);
        debug!(subscribers = state.subscribers.len(), "stream subscriber attached");
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, JobState> {
        self.state.lock().unwrap()
    }
}

fn push_record(state: &mut JobState, record: LogRecord) {
    state.buffer.push(record.clone());
    state.subscribers.retain(|tx| tx.send(record.clone()).is_ok());
}

fn finish(state: &mut JobState, message: String) {
    push_record(state, LogRecord::complete(message));
    state.child = None;
    state.running = false;
    // Dropping the senders terminates every subscriber stream.
    state.subscribers.clear();
}
