//! Server-sent stream of gateway events

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;

/// GET /admin/events
///
/// Lagging subscribers skip the events they missed.
pub async fn stream_events(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!(admin = %admin.identifier(), "Admin subscribed to events");

    let stream = BroadcastStream::new(state.events.subscribe()).filter_map(|envelope| async move {
        let envelope = envelope.ok()?;
        Event::default()
            .event(envelope.event.name())
            .json_data(&envelope)
            .ok()
            .map(Ok)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
