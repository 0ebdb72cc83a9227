//! Job control handlers - start/cancel/status/log/reset.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;

use fdlctl_runtime::JobError;

use crate::dto::{ActionResponse, LogResponse, StartRequest, StatusResponse};
use crate::error::HttpError;
use crate::state::AppState;

/// Kick off a pipeline run. Fire-and-forget: the response only says
/// whether the run was accepted; progress arrives over the stream.
pub async fn start(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<StartRequest>,
) -> Result<Json<ActionResponse>, HttpError> {
    state.auth.require(&headers, None)?;

    let options = req.into_options();
    if options.remote_source && !options.use_default_source && options.remote.is_none() {
        return Err(HttpError::BadRequest(
            "remote run requested without coordinates".to_string(),
        ));
    }

    let response = match state.runner.start(&state.controller, options) {
        Ok(()) => ActionResponse {
            success: true,
            message: "Execution started".to_string(),
        },
        // Benign: the active run continues untouched.
        Err(JobError::AlreadyRunning) => ActionResponse {
            success: false,
            message: "A run is already in progress".to_string(),
        },
        Err(e) => ActionResponse {
            success: false,
            message: e.to_string(),
        },
    };
    Ok(Json(response))
}

/// Terminate the running pipeline process, if there is one.
pub async fn cancel(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ActionResponse>, HttpError> {
    state.auth.require(&headers, None)?;

    let response = if state.controller.cancel() {
        ActionResponse {
            success: true,
            message: "Execution cancelled".to_string(),
        }
    } else {
        ActionResponse {
            success: false,
            message: "No execution was running".to_string(),
        }
    };
    Ok(Json(response))
}

/// Consistent snapshot of the running flag and the full log buffer.
pub async fn status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>, HttpError> {
    state.auth.require(&headers, None)?;

    let status = state.controller.status();
    Ok(Json(StatusResponse {
        is_running: status.running,
        log: status.log,
    }))
}

/// The buffered log only.
pub async fn log(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<LogResponse>, HttpError> {
    state.auth.require(&headers, None)?;

    Ok(Json(LogResponse {
        log: state.controller.status().log,
    }))
}

/// Clear the buffer between runs. Reported as a failure (not an HTTP
/// error) while a run is in progress.
pub async fn reset(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ActionResponse>, HttpError> {
    state.auth.require(&headers, None)?;

    let response = match state.controller.reset() {
        Ok(()) => ActionResponse {
            success: true,
            message: "Log cleared".to_string(),
        },
        Err(e) => ActionResponse {
            success: false,
            message: e.to_string(),
        },
    };
    Ok(Json(response))
}
