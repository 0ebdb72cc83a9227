//! Shared application state type.

use crate::bootstrap::AppContext;
use std::sync::Arc;

/// Application state shared across all handlers: the job controller,
/// the pipeline runner and the auth gate, wrapped in one `Arc`.
pub type AppState = Arc<AppContext>;
