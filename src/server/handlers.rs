// src/server/handlers.rs

//! JSON endpoints under `/run`.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::engine::{CommandRunRequest, FileRunRequest, SessionSnapshot};
use crate::errors::{Result, RunboxError};
use crate::server::AppState;
use crate::server::extract::Owner;
use crate::types::ExecutionId;

const DEFAULT_LANGUAGE: &str = "javascript";

#[derive(Debug, Default, Deserialize)]
pub struct RunFileParams {
    pub project: Option<String>,
    pub file: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RunCommandParams {
    pub project: Option<String>,
    pub command: Option<String>,
    #[serde(rename = "type")]
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopParams {
    pub execution_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStarted {
    pub success: bool,
    pub execution_id: ExecutionId,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Acknowledged {
    pub success: bool,
    pub message: String,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /run`: project and file may come from the query string or the body.
pub async fn run_file(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Query(query): Query<RunFileParams>,
    body: Bytes,
) -> Result<Json<RunStarted>> {
    let body: RunFileParams = json_body(&body)?;

    let req = FileRunRequest {
        owner,
        project: query.project.or(body.project).unwrap_or_default(),
        file: query.file.or(body.file).unwrap_or_default(),
        language: body
            .language
            .or(query.language)
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
    };

    let id = state.orchestrator.start_file_run(req)?;
    Ok(Json(RunStarted {
        success: true,
        execution_id: id,
        message: "Code execution started".to_string(),
        working_directory: None,
    }))
}

pub async fn run_command(
    State(state): State<AppState>,
    Owner(owner): Owner,
    body: Bytes,
) -> Result<Json<RunStarted>> {
    let params: RunCommandParams = json_body(&body)?;
    let command = params.command.unwrap_or_default();

    let started = state.orchestrator.start_command_run(CommandRunRequest {
        owner,
        project: params.project.unwrap_or_default(),
        command: command.clone(),
        role: params.role,
    })?;

    Ok(Json(RunStarted {
        success: true,
        execution_id: started.id,
        message: format!("Command execution started: {}", command.trim()),
        working_directory: Some(started.working_directory.to_string_lossy().into_owned()),
    }))
}

pub async fn stop_run(
    State(state): State<AppState>,
    Owner(owner): Owner,
    body: Bytes,
) -> Result<Json<Acknowledged>> {
    let params: StopParams = json_body(&body)?;
    let raw = params
        .execution_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| RunboxError::InvalidInput("Execution ID is required".to_string()))?;

    // An id we could never have issued cannot be running.
    let id = parse_id(&raw)?;
    state.orchestrator.stop_run(&owner, id)?;

    Ok(Json(Acknowledged {
        success: true,
        message: "Process terminated".to_string(),
    }))
}

pub async fn list_sessions(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Json<Vec<SessionSnapshot>> {
    Json(state.orchestrator.list_runs(&owner))
}

pub async fn describe_session(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(raw): Path<String>,
) -> Result<Json<SessionSnapshot>> {
    let id = parse_id(&raw)?;
    state.orchestrator.describe_run(&owner, id).map(Json)
}

fn parse_id(raw: &str) -> Result<ExecutionId> {
    raw.parse()
        .map_err(|_| RunboxError::NotFound("Process not found".to_string()))
}

/// Decode an optional JSON body; an empty body yields `T::default()`.
fn json_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| RunboxError::InvalidInput(format!("malformed JSON body: {e}")))
}
