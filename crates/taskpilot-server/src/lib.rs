//! Taskpilot Server - REST surface over the task service and agent
//!
//! Routes:
//! - `GET /`, `GET /health`
//! - `GET|POST /tasks`, `GET|PUT|DELETE /tasks/{id}`
//! - `POST /chat`
//! - `GET /dapr/subscribe`, `POST /events/task-events` (Dapr pub/sub delivery)

pub mod error;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use taskpilot_core::config::{EventsConfig, ServerConfig};
use taskpilot_core::{AgentLoop, TaskService};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use error::ApiError;

/// Shared state handed to every handler
pub struct ServerState {
    pub service: TaskService,
    pub agent: Arc<AgentLoop>,
    /// Pub/sub names advertised to the Dapr sidecar
    pub events: EventsConfig,
}

impl ServerState {
    pub fn new(service: TaskService, agent: Arc<AgentLoop>) -> Self {
        Self {
            service,
            agent,
            events: EventsConfig::default(),
        }
    }

    pub fn with_events(mut self, events: EventsConfig) -> Self {
        self.events = events;
        self
    }
}

/// Build the application router
pub fn router(state: Arc<ServerState>, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health))
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/{id}",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/chat", post(routes::chat::chat))
        .route("/dapr/subscribe", get(routes::events::subscribe))
        .route(
            routes::events::TASK_EVENTS_ROUTE,
            post(routes::events::receive_task_event),
        )
        .with_state(state)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// CORS for the configured origins; an empty list allows any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(parsed))
}

/// Bind to the configured address and serve until Ctrl-C
pub async fn serve(state: Arc<ServerState>, config: &ServerConfig) -> std::io::Result<()> {
    let listener = TcpListener::bind(config.bind_address()).await?;
    let addr: SocketAddr = listener.local_addr()?;
    info!(%addr, "Taskpilot server listening");

    axum::serve(listener, router(state, &config.cors_origins))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutting down");
        })
        .await
}
