//! HTTP request handlers
//!
//! Axum handlers bridging the API surface to the registry and the
//! patient store.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::model_core::PredictionResult;
use crate::patients::PatientRecord;
use crate::registry::ModelInfo;
use crate::server::{status_for, ApiResponse, AppState};
use crate::utils::EngineError;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub models_count: usize,
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let health = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        models_count: state.registry.len(),
    };
    (StatusCode::OK, Json(health))
}

/// List all loaded models
pub async fn list_models(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<Vec<ModelInfo>>>) {
    let infos = state.registry.list_info();
    (StatusCode::OK, Json(ApiResponse::success(infos)))
}

/// Run one prediction against a named model
pub async fn predict(
    State(state): State<AppState>,
    Path(model): Path<String>,
    Json(raw): Json<HashMap<String, f64>>,
) -> (StatusCode, Json<ApiResponse<PredictionResult>>) {
    let result = state
        .registry
        .get(&model)
        .and_then(|entry| entry.predict(&raw));
    respond(result)
}

/// List all patient records, newest first
pub async fn list_patients(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<Vec<PatientRecord>>>) {
    respond(state.patients.list())
}

/// Create a patient record
pub async fn create_patient(
    State(state): State<AppState>,
    Json(patient_data): Json<HashMap<String, serde_json::Value>>,
) -> (StatusCode, Json<ApiResponse<PatientRecord>>) {
    match state.patients.create(patient_data) {
        Ok(record) => (StatusCode::CREATED, Json(ApiResponse::success(record))),
        Err(e) => error_response(e),
    }
}

/// Fetch one patient record
pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<ApiResponse<PatientRecord>>) {
    respond(state.patients.load(&id))
}

/// Merge new fields into a patient record
pub async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patient_data): Json<HashMap<String, serde_json::Value>>,
) -> (StatusCode, Json<ApiResponse<PatientRecord>>) {
    respond(state.patients.update(&id, patient_data))
}

/// Delete a patient record
pub async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<ApiResponse<String>>) {
    match state.patients.delete(&id) {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::success(id))),
        Err(e) => error_response(e),
    }
}

fn respond<T>(result: Result<T, EngineError>) -> (StatusCode, Json<ApiResponse<T>>) {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::success(data))),
        Err(e) => error_response(e),
    }
}

fn error_response<T>(error: EngineError) -> (StatusCode, Json<ApiResponse<T>>) {
    let status = status_for(&error);
    if status.is_server_error() {
        tracing::error!(error = %error, "request failed");
    }
    (status, Json(ApiResponse::error(&error.to_string())))
}
