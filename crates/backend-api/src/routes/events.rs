//! Realtime endpoints: publish into the broker and stream out over SSE.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use futures_util::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::envelope::ApiSuccess;
use crate::error::ApiError;
use crate::events::RealtimeEvent;
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PublishEventRequest {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub payload: Option<Value>,
}

pub async fn publish_event(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(request): Json<PublishEventRequest>,
) -> Result<ApiSuccess<RealtimeEvent>, ApiError> {
    let (Some(event_type), Some(payload)) = (
        request.event_type.filter(|value| !value.is_empty()),
        request.payload.filter(|value| !value.is_null()),
    ) else {
        return Err(ApiError::validation("Missing type or payload"));
    };

    let event = state.events().publish(event_type, payload, &claims).await;

    Ok(ApiSuccess::created(event))
}

/// Long-lived SSE subscription. The current backlog is flushed first,
/// then live events follow until the client disconnects. A subscriber
/// that lags far behind the channel skips the missed events.
pub async fn stream_events(
    State(state): State<AppState>,
    Extension(AuthUser(_claims)): Extension<AuthUser>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (backlog, rx) = state.events().subscribe().await;

    let initial = stream::iter(backlog).map(to_sse_event);
    let live = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => return Some((to_sse_event(event), rx)),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(initial.chain(live)).keep_alive(KeepAlive::default())
}

fn to_sse_event(event: RealtimeEvent) -> Result<Event, Infallible> {
    Ok(Event::default()
        .json_data(&event)
        .unwrap_or_else(|_| Event::default().data("{}")))
}
