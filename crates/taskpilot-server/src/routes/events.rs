//! Dapr pub/sub subscription routes
//!
//! The sidecar asks `GET /dapr/subscribe` which topics to deliver and then
//! posts each message, wrapped in a CloudEvent, to the advertised route.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use taskpilot_core::TaskEvent;
use tracing::{debug, info};

use crate::ServerState;

/// Path the sidecar delivers task events to
pub const TASK_EVENTS_ROUTE: &str = "/events/task-events";

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    pub pubsubname: String,
    pub topic: String,
    pub route: String,
}

/// CloudEvent envelope; only `data` is interpreted
#[derive(Debug, Deserialize)]
pub struct CloudEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub data: Value,
}

pub async fn subscribe(State(state): State<Arc<ServerState>>) -> Json<Vec<Subscription>> {
    Json(vec![Subscription {
        pubsubname: state.events.pubsub_name.clone(),
        topic: state.events.topic.clone(),
        route: TASK_EVENTS_ROUTE.trim_start_matches('/').to_string(),
    }])
}

/// Acknowledge a delivered event. Payloads that are not task events are
/// still acknowledged so the sidecar does not redeliver them.
pub async fn receive_task_event(Json(envelope): Json<CloudEvent>) -> Json<Value> {
    match serde_json::from_value::<TaskEvent>(envelope.data) {
        Ok(event) => info!(
            event_type = ?event.event_type,
            task_id = event.id,
            title = %event.title,
            cloud_event_id = envelope.id.as_deref().unwrap_or(""),
            "Received task event"
        ),
        Err(e) => debug!(
            topic = envelope.topic.as_deref().unwrap_or(""),
            error = %e,
            "Ignoring event payload that is not a task event"
        ),
    }
    Json(json!({ "status": "success" }))
}
