//! Process management REST endpoints
//!
//! CRUD over process definitions plus the two explicit author actions
//! the editor exposes: validate and submit. Every definition change is
//! saved to storage and swapped into the registry so validation state
//! and the stored graph never drift apart. Editing itself happens
//! client-side against the graph model; this layer only persists whole
//! definitions.

use crate::{
    bridge::{BridgeError, EngineError, ExecutionBridge, ExecutionRef},
    process::{
        model::GraphModel,
        registry::ProcessRegistry,
        storage::ProcessStorage,
        types::ProcessGraph,
    },
    templates::{FormTemplate, TemplateRepository},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Process storage for persistence
    pub storage: ProcessStorage,
    /// Registry of checked processes
    pub registry: Arc<ProcessRegistry>,
    /// Bridge to the external execution engine
    pub bridge: Arc<ExecutionBridge>,
    /// Form template repository
    pub templates: Arc<dyn TemplateRepository>,
}

/// Response for process creation/update operations.
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub id: String,
    pub message: String,
}

/// Request body for process creation.
#[derive(Debug, Deserialize)]
pub struct CreateProcessRequest {
    pub name: String,
}

/// Request body for process updates.
#[derive(Debug, Deserialize)]
pub struct UpdateProcessRequest {
    pub process: ProcessGraph,
}

/// Create the process management routes.
pub fn create_process_routes() -> Router<AppState> {
    Router::new()
        .route("/api/processes", post(create_process))
        .route("/api/processes", get(list_processes))
        .route("/api/processes/{id}", get(get_process))
        .route("/api/processes/{id}", put(update_process))
        .route("/api/processes/{id}", delete(delete_process))
        .route("/api/processes/{id}/validate", post(validate_process))
        .route("/api/processes/{id}/submit", post(submit_process))
        .route("/api/executions/{execution_ref}", get(inspect_execution))
        .route("/api/templates", get(list_templates))
        .route("/api/templates", post(put_template))
}

/// Create a new process with an auto-inserted start step.
///
/// POST /api/processes
/// Body: { "name": "Accreditation renewal" }
async fn create_process(
    State(state): State<AppState>,
    Json(payload): Json<CreateProcessRequest>,
) -> Result<Json<ProcessResponse>, StatusCode> {
    if payload.name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let graph = GraphModel::new(payload.name).into_graph();

    if let Err(e) = state.storage.save_process(&graph).await {
        tracing::error!("Failed to save process: {}", e);
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    if let Err(e) = state.registry.reload(&graph.id).await {
        tracing::error!("Failed to load process into registry: {}", e);
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    tracing::info!("📝 Created process: {} ({})", graph.id, graph.name);

    Ok(Json(ProcessResponse {
        id: graph.id.clone(),
        message: format!("Process '{}' created", graph.name),
    }))
}

/// List all processes.
///
/// GET /api/processes
async fn list_processes(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    match state.storage.list_processes().await {
        Ok(processes) => Ok(Json(json!({ "processes": processes }))),
        Err(e) => {
            tracing::error!("Failed to list processes: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Fetch a full process definition.
///
/// GET /api/processes/{id}
async fn get_process(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProcessGraph>, StatusCode> {
    match state.storage.get_process(&id).await {
        Ok(Some(graph)) => Ok(Json(graph)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to fetch process {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Replace a process definition (the editor's save action).
///
/// PUT /api/processes/{id}
/// Body: { "process": { "id": "...", "name": "...", "steps": [...], "connections": [...] } }
async fn update_process(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateProcessRequest>,
) -> Result<Json<ProcessResponse>, StatusCode> {
    let graph = payload.process;
    if graph.id != id {
        return Err(StatusCode::BAD_REQUEST);
    }

    match state.storage.get_process(&id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to fetch process {}: {}", id, e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    if let Err(e) = state.storage.save_process(&graph).await {
        tracing::error!("Failed to save process {}: {}", id, e);
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    if let Err(e) = state.registry.reload(&id).await {
        tracing::error!("Failed to reload process {}: {}", id, e);
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    Ok(Json(ProcessResponse {
        id,
        message: format!("Process '{}' saved", graph.name),
    }))
}

/// Delete a process.
///
/// DELETE /api/processes/{id}
async fn delete_process(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    match state.storage.delete_process(&id).await {
        Ok(true) => {
            state.registry.remove(&id);
            tracing::info!("🗑️ Deleted process: {}", id);
            Ok(Json(json!({ "deleted": id })))
        }
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to delete process {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Run the validator against the stored definition and return the full
/// findings list.
///
/// POST /api/processes/{id}/validate
async fn validate_process(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    match state.storage.get_process(&id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to fetch process {}: {}", id, e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    // Reload so the registry's validation state reflects what is stored.
    // A reload failure here is an internal fault, not an authoring
    // problem, and is surfaced as such.
    if let Err(e) = state.registry.reload(&id).await {
        tracing::error!("Internal fault validating process {}: {}", id, e);
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    let checked = state.registry.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(json!({
        "processId": id,
        "submittable": checked.is_submittable(),
        "findings": checked.report.findings,
    })))
}

/// Submit a process for execution.
///
/// POST /api/processes/{id}/submit
async fn submit_process(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.bridge.submit(&id).await {
        Ok(execution_ref) => Ok(Json(json!({ "executionRef": execution_ref }))),
        Err(BridgeError::UnknownProcess(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "process not found" })),
        )),
        Err(BridgeError::ValidationRequired { error_count, .. }) => Err((
            StatusCode::CONFLICT,
            Json(json!({
                "error": "validation required",
                "errorCount": error_count,
            })),
        )),
        Err(BridgeError::Engine(e)) => {
            tracing::error!("Engine submission failed for {}: {}", id, e);
            Err((
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": e.to_string() })),
            ))
        }
    }
}

/// Poll an execution's coarse status.
///
/// GET /api/executions/{execution_ref}
async fn inspect_execution(
    State(state): State<AppState>,
    Path(execution_ref): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    match state.bridge.inspect(&ExecutionRef(execution_ref)).await {
        Ok(status) => Ok(Json(serde_json::to_value(status).unwrap_or(Value::Null))),
        Err(BridgeError::Engine(EngineError::UnknownExecution(_))) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Execution inspection failed: {}", e);
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

/// List form templates.
///
/// GET /api/templates
async fn list_templates(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    match state.templates.list().await {
        Ok(templates) => Ok(Json(json!({ "templates": templates }))),
        Err(e) => {
            tracing::error!("Failed to list templates: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Store or replace a form template.
///
/// POST /api/templates
async fn put_template(
    State(state): State<AppState>,
    Json(template): Json<FormTemplate>,
) -> Result<Json<Value>, StatusCode> {
    if template.id.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    match state.templates.put(&template).await {
        Ok(()) => Ok(Json(json!({ "id": template.id }))),
        Err(e) => {
            tracing::error!("Failed to store template {}: {}", template.id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
