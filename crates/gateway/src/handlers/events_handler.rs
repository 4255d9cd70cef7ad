//! Live service-record updates over WebSocket.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Extension, State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use workshop_service_lib::events::ServiceEvent;

use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Create event stream routes
pub fn event_routes() -> Router<AppState> {
    Router::new().route("/", get(subscribe))
}

/// Upgrade to a WebSocket that receives every `serviceUpdate` event.
///
/// Browsers cannot set headers on the upgrade request, so the token may
/// also be passed as `?token=`.
#[utoipa::path(
    get,
    path = "/events",
    tag = "Events",
    security(("bearer_auth" = [])),
    params(
        ("token" = Option<String>, Query, description = "JWT, alternative to the Authorization header")
    ),
    responses(
        (status = 101, description = "Switching to WebSocket"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn subscribe(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    // Subscribe before the upgrade completes so no event slips through.
    let events = state.hub.subscribe();
    ws.on_upgrade(move |socket| forward_events(socket, events, current_user.id))
}

async fn forward_events(
    socket: WebSocket,
    mut events: broadcast::Receiver<ServiceEvent>,
    user_id: Uuid,
) {
    tracing::debug!(%user_id, "Event subscriber connected");
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to encode service event");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(payload)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(%user_id, skipped, "Event subscriber lagging, events dropped");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::debug!(%user_id, "Event subscriber disconnected");
}
