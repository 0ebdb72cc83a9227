//! Core domain types and port-free logic for fdlctl.
//!
//! This crate holds the job log vocabulary (`LogKind`, `LogRecord`),
//! the run option types handed from the HTTP layer to the pipeline
//! runner, and the display-side log normalizer. Nothing here touches
//! the network or spawns processes.

#![deny(unused_crate_dependencies)]

pub mod normalize;
pub mod options;
pub mod record;

// Re-export commonly used types for convenience
pub use normalize::{NormalizedLine, Normalizer};
pub use options::{RemoteSource, RunOptions};
pub use record::{LogKind, LogRecord};
