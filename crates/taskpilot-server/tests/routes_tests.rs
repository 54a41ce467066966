//! Router integration tests
//!
//! Requests go through the full router with `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use taskpilot_core::orchestration::create_task_tool_registry;
use taskpilot_core::provider::ScriptedProvider;
use taskpilot_core::{AgentConfig, AgentLoop, TaskService};
use taskpilot_server::{router, ServerState};
use tower::ServiceExt;

fn app_with(provider: ScriptedProvider, config: AgentConfig) -> (Router, TaskService) {
    let service = TaskService::in_memory();
    let agent = AgentLoop::new(
        Arc::new(provider),
        Arc::new(create_task_tool_registry(service.clone())),
        config,
    );
    let state = Arc::new(ServerState::new(service.clone(), Arc::new(agent)));
    (router(state, &[]), service)
}

fn app() -> Router {
    app_with(ScriptedProvider::new(), AgentConfig::default()).0
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_root_and_health() {
        let app = app();
        let (status, body) = send(&app, "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().unwrap().contains("running"));

        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }
}

mod task_route_tests {
    use super::*;

    #[tokio::test]
    async fn test_crud_cycle() {
        let app = app();

        let (status, created) = send(
            &app,
            "POST",
            "/tasks",
            Some(json!({"title": "Buy milk", "description": "2 liters"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "pending");
        let id = created["id"].as_i64().unwrap();

        let (status, fetched) = send(&app, "GET", &format!("/tasks/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/tasks/{}", id),
            Some(json!({"status": "completed"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "completed");
        assert_eq!(updated["title"], "Buy milk");
        assert_eq!(updated["description"], "2 liters");

        let (status, body) = send(&app, "DELETE", &format!("/tasks/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));

        let (status, body) = send(&app, "GET", &format!("/tasks/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Task not found");
    }

    #[tokio::test]
    async fn test_list_with_status_filter() {
        let app = app();
        for title in ["a", "b"] {
            send(&app, "POST", "/tasks", Some(json!({ "title": title }))).await;
        }
        send(&app, "PUT", "/tasks/2", Some(json!({"status": "completed"}))).await;

        let (_, all) = send(&app, "GET", "/tasks", None).await;
        assert_eq!(all.as_array().unwrap().len(), 2);

        let (status, pending) = send(&app, "GET", "/tasks?status=pending", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pending.as_array().unwrap().len(), 1);
        assert_eq!(pending[0]["title"], "a");

        let (status, _) = send(&app, "GET", "/tasks?status=archived", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_status_is_case_insensitive() {
        let app = app();
        send(&app, "POST", "/tasks", Some(json!({"title": "Mop floor"}))).await;

        let (status, updated) =
            send(&app, "PUT", "/tasks/1", Some(json!({"status": "Completed"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "completed");

        let (status, _) = send(&app, "PUT", "/tasks/1", Some(json!({"status": "archived"}))).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_validation_and_missing() {
        let app = app();
        let (status, _) = send(&app, "POST", "/tasks", Some(json!({"title": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "PUT", "/tasks/7", Some(json!({"title": "x"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "DELETE", "/tasks/7", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

mod chat_route_tests {
    use super::*;

    #[tokio::test]
    async fn test_chat_runs_agent() {
        let provider = ScriptedProvider::new()
            .reply_tool_calls([("c1", "add_task", r#"{"title": "Buy bread"}"#)])
            .reply_text("I've added 'Buy bread' to your list.");
        let (app, service) = app_with(provider, AgentConfig::default());

        let (status, body) = send(&app, "POST", "/chat", Some(json!({"message": "buy bread"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "I've added 'Buy bread' to your list.");

        let tasks = service.list(None).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Buy bread");
    }

    #[tokio::test]
    async fn test_chat_empty_message() {
        let app = app();
        let (status, _) = send(&app, "POST", "/chat", Some(json!({"message": ""}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chat_provider_failure() {
        let (app, _) = app_with(ScriptedProvider::new().fail("unauthorized"), AgentConfig::default());
        let (status, body) = send(&app, "POST", "/chat", Some(json!({"message": "hi"}))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["detail"].as_str().unwrap().contains("unauthorized"));
    }

    #[tokio::test]
    async fn test_chat_timeout() {
        let provider = ScriptedProvider::new()
            .with_delay(Duration::from_millis(500))
            .reply_text("late");
        let config = AgentConfig::default().with_timeout(Duration::from_millis(50));
        let (app, _) = app_with(provider, config);

        let (status, _) = send(&app, "POST", "/chat", Some(json!({"message": "hi"}))).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    }
}

mod dapr_route_tests {
    use super::*;

    #[tokio::test]
    async fn test_subscription_advertises_task_topic() {
        let app = app();
        let (status, body) = send(&app, "GET", "/dapr/subscribe", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([{
                "pubsubname": "kafka-pubsub",
                "topic": "task-events",
                "route": "events/task-events"
            }])
        );
    }

    #[tokio::test]
    async fn test_delivered_events_are_acknowledged() {
        let app = app();
        let envelope = json!({
            "id": "evt-1",
            "topic": "task-events",
            "data": {"event_type": "created", "id": 3, "title": "Call mom", "user_id": null}
        });
        let (status, body) = send(&app, "POST", "/events/task-events", Some(envelope)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "success"}));

        let (status, body) = send(
            &app,
            "POST",
            "/events/task-events",
            Some(json!({"data": "not a task event"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
    }
}
