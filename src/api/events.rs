//! Server-sent stream of report change notifications.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use crate::events::REPORTS_UPDATED;
use crate::AppState;

/// GET /api/events - One `reportsUpdated` event per change.
///
/// A subscriber that lags behind gets a single event for everything it
/// missed.
pub async fn report_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.events.subscribe())
        .map(|_| Ok(Event::default().event(REPORTS_UPDATED).data("")));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
