//! SSE stream handler - buffer replay plus live records.

use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::dto::StreamQuery;
use crate::error::HttpError;
use crate::state::AppState;

/// Turn the connection into a job log subscription.
///
/// The subscriber first receives a replay of the entire existing
/// buffer, then live records as they are appended; the stream ends
/// when the run completes. Each frame is an `event: log` line followed
/// by a `data:` line carrying `{"type": ..., "message": ...}`.
/// The credential may arrive as a `token` query parameter because
/// EventSource cannot set request headers. Includes a keep-alive ping
/// every 30 seconds to prevent proxy timeouts.
pub async fn stream(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
    headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static>, HttpError> {
    state.auth.require(&headers, query.token.as_deref())?;

    let receiver = state.controller.subscribe();
    let stream = UnboundedReceiverStream::new(receiver).filter_map(|record| {
        match serde_json::to_string(&record) {
            Ok(json) => Some(Ok(Event::default().event("log").data(json))),
            Err(e) => {
                tracing::warn!("Failed to serialize log record: {}", e);
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(std::time::Duration::from_secs(30))
            .text("ping"),
    ))
}
