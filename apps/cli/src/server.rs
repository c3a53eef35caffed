//! HTTP API exposing the benchmarks.
//!
//! `POST /api/salary` and `POST /api/competitor-benchmark`. Every failure is
//! answered as `{error, details}` with the status of the underlying error.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tracing::{error, info};

use salarysignal_core::{SalaryPipeline, SilentProgress};
use salarysignal_shared::{CompetitorRequest, RoleRequest, SalarySignalError};

/// What requests are served with.
#[derive(Clone)]
pub(crate) enum PipelineState {
    Ready(Arc<SalaryPipeline>),
    /// The pipeline could not be built (e.g. missing search key); every
    /// valid request fails with this config error.
    Unavailable(String),
}

impl PipelineState {
    fn pipeline(&self) -> Result<&SalaryPipeline, ApiError> {
        match self {
            Self::Ready(pipeline) => Ok(pipeline),
            Self::Unavailable(message) => Err(SalarySignalError::config(message.clone()).into()),
        }
    }
}

/// A pipeline error rendered as JSON.
pub(crate) struct ApiError(SalarySignalError);

impl From<SalarySignalError> for ApiError {
    fn from(err: SalarySignalError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(SalarySignalError::bad_request(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let summary = match &self.0 {
            SalarySignalError::BadRequest { message } | SalarySignalError::Config { message } => {
                message.clone()
            }
            _ => "Benchmark request failed".to_string(),
        };
        if status.is_server_error() {
            error!(%status, error = %self.0, "request failed");
        }
        (
            status,
            Json(json!({ "error": summary, "details": self.0.to_string() })),
        )
            .into_response()
    }
}

/// Build the API router.
pub(crate) fn router(state: PipelineState) -> Router {
    Router::new()
        .route(
            "/api/salary",
            post(salary).fallback(method_not_allowed),
        )
        .route(
            "/api/competitor-benchmark",
            post(competitor_benchmark).fallback(method_not_allowed),
        )
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub(crate) async fn serve(addr: SocketAddr, state: PipelineState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "benchmark API listening");
    axum::serve(listener, router(state)).await
}

async fn salary(
    State(state): State<PipelineState>,
    body: Result<Json<RoleRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(request) = body?;
    let request = request.validate()?;
    let report = state.pipeline()?.benchmark_role(&request, &SilentProgress).await?;
    Ok(Json(report.to_payload()))
}

async fn competitor_benchmark(
    State(state): State<PipelineState>,
    body: Result<Json<CompetitorRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(request) = body?;
    let request = request.validate()?;
    let report = state
        .pipeline()?
        .benchmark_competitors(&request, &SilentProgress)
        .await?;
    Ok(Json(report.to_payload()))
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
        .into_response()
}
