//! Task CRUD endpoints
//!
//! These go through the same task service as the agent tools, so REST
//! mutations publish the same lifecycle events.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use taskpilot_core::{NewTask, Task, TaskPatch, TaskStatus};

use crate::error::ApiError;
use crate::ServerState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

pub async fn list_tasks(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<TaskStatus>)
        .transpose()
        .map_err(ApiError::bad_request)?;
    Ok(Json(state.service.list(status).await?))
}

pub async fn create_task(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::bad_request("Title must not be empty"));
    }
    let task = state
        .service
        .create(NewTask {
            title: req.title,
            description: req.description,
            user_id: req.user_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<i64>,
) -> Result<Json<Task>, ApiError> {
    state
        .service
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(ApiError::task_not_found)
}

pub async fn update_task(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    if req.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::bad_request("Title must not be empty"));
    }
    let patch = TaskPatch {
        title: req.title,
        description: req.description,
        status: req.status,
    };
    state
        .service
        .update(id, patch)
        .await?
        .map(Json)
        .ok_or_else(ApiError::task_not_found)
}

pub async fn delete_task(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    if state.service.delete(id).await? {
        Ok(Json(json!({ "ok": true })))
    } else {
        Err(ApiError::task_not_found())
    }
}
