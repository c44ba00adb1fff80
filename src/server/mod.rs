//! HTTP API layer
//!
//! Thin axum front over the model registry and the patient store. All
//! request handling is per-request and stateless; a failing request
//! degrades to an error response without affecting the process.

mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::patients::PatientStore;
use crate::registry::ModelRegistry;
use crate::utils::EngineError;

/// Shared request-handler state
///
/// The registry and store are read-only after startup, so handlers share
/// them through plain `Arc`s without locking.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ModelRegistry>,
    pub patients: Arc<PatientStore>,
    started_at: Instant,
}

impl AppState {
    pub fn new(registry: ModelRegistry, patients: PatientStore) -> Self {
        Self {
            registry: Arc::new(registry),
            patients: Arc::new(patients),
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (if successful)
    pub data: Option<T>,
    /// Error message (if failed)
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.to_string()),
        }
    }
}

/// Map an engine error onto the HTTP status it should surface as
pub(crate) fn status_for(error: &EngineError) -> StatusCode {
    match error {
        EngineError::ModelNotFound(_) | EngineError::RecordNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ArtifactUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Validation(_) | EngineError::Config(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/models", get(handlers::list_models))
        .route("/api/predict/:model", post(handlers::predict))
        .route(
            "/api/patients",
            get(handlers::list_patients).post(handlers::create_patient),
        )
        .route(
            "/api/patients/:id",
            get(handlers::get_patient)
                .put(handlers::update_patient)
                .delete(handlers::delete_patient),
        )
        .with_state(state)
}

/// Bind and serve until shutdown
pub async fn serve(addr: SocketAddr, state: AppState) -> crate::utils::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, models = state.registry.len(), "listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
