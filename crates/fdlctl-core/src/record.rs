//! Job log records - the canonical event vocabulary for all adapters.
//!
//! Every line the pipeline produces becomes exactly one `LogRecord`,
//! appended to the run buffer and fanned out to stream subscribers.
//!
//! # Wire Format
//!
//! Records are serialized with a `type` tag for the web viewer:
//!
//! ```json
//! { "type": "output", "message": "Compressed maps/de_dust2.bsp" }
//! ```

use serde::{Deserialize, Serialize};

/// Classification of a single job log record.
///
/// This is a closed union: producers (the pipeline runner) and
/// consumers (the normalizer, the stream viewer) match on it
/// exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    /// Environment preparation and dependency installation progress.
    Setup,
    /// Main script invocation markers.
    Execute,
    /// A stdout line from the running pipeline.
    Output,
    /// A stderr line or a step failure.
    Error,
    /// Terminal record - exactly one per run, appended when the run ends.
    Complete,
    /// Informational notices with no better home.
    Info,
}

impl LogKind {
    /// Uppercase display tag, as shown in bracketed log prefixes.
    pub fn label(self) -> &'static str {
        match self {
            Self::Setup => "SETUP",
            Self::Execute => "EXECUTE",
            Self::Output => "OUTPUT",
            Self::Error => "ERROR",
            Self::Complete => "COMPLETE",
            Self::Info => "INFO",
        }
    }
}

/// One buffered log record. Immutable once created; ordered by append
/// time within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Record classification.
    #[serde(rename = "type")]
    pub kind: LogKind,
    /// Human-readable payload.
    pub message: String,
}

impl LogRecord {
    pub fn new(kind: LogKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn setup(message: impl Into<String>) -> Self {
        Self::new(LogKind::Setup, message)
    }

    pub fn execute(message: impl Into<String>) -> Self {
        Self::new(LogKind::Execute, message)
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::new(LogKind::Output, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogKind::Error, message)
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(LogKind::Complete, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogKind::Info, message)
    }
}
