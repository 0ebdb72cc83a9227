//! Job lifecycle errors.

use thiserror::Error;

/// Errors surfaced by `JobController` operations.
///
/// Pipeline step failures never appear here: they are converted to
/// `error` log records and terminate the run through the normal
/// completion path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// A start was requested while a run is active. Benign: the
    /// current run continues untouched.
    #[error("a run is already in progress")]
    AlreadyRunning,

    /// A reset was requested while a run is active. The buffer is
    /// left unchanged.
    #[error("cannot reset while a run is in progress")]
    Busy,
}
