//! # API REST
//!
//! REST API for the vaccination dossier tooling.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON date normalisation, CORS)
//!
//! Uses `impf-core` for the codec and the status rules; this crate only adapts them to HTTP.

#![warn(rust_2018_idioms)]

pub mod date_normalisation;

use std::sync::Arc;

use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use impf_core::status::{is_at_most, ordinal};
use impf_core::{parse_status, CoreError, DateTimeWireCodec, DossierStatus, StatusGroup};

pub use date_normalisation::normalise_json_dates;

/// Application state for the REST API server
///
/// Holds the codec used by the date normalisation layer and the body size limit it enforces.
#[derive(Clone)]
pub struct AppState {
    pub codec: Arc<DateTimeWireCodec>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(codec: DateTimeWireCodec, max_body_bytes: usize) -> Self {
        Self {
            codec: Arc::new(codec),
            max_body_bytes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfoRes {
    #[schema(value_type = String, example = "GEBUCHT")]
    pub status: DossierStatus,
    pub ordinal: i32,
    #[schema(value_type = Vec<String>)]
    pub groups: Vec<StatusGroup>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompareStatusReq {
    #[schema(value_type = String, example = "GEBUCHT")]
    pub status: DossierStatus,
    #[schema(value_type = String, example = "IMMUNISIERT")]
    pub other: DossierStatus,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompareStatusRes {
    pub at_most: bool,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, dossier_status, compare_dossier_status, normalise_wire),
    components(schemas(HealthRes, StatusInfoRes, CompareStatusReq, CompareStatusRes))
)]
pub struct ApiDoc;

/// Builds the full application router.
///
/// The date normalisation layer wraps the API routes only; Swagger UI and the OpenAPI document
/// are served as-is.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/dossier-status/:status", get(dossier_status))
        .route("/dossier-status/compare", post(compare_dossier_status))
        .route("/wire/normalise", post(normalise_wire))
        .layer(middleware::from_fn_with_state(state.clone(), normalise_json_dates))
        .with_state(state);

    api.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Impf REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/dossier-status/{status}",
    params(("status" = String, Path, description = "Dossier status wire name")),
    responses(
        (status = 200, description = "Ordinal and group memberships", body = StatusInfoRes),
        (status = 400, description = "Unknown dossier status")
    )
)]
/// Classify a dossier status
///
/// Returns the status ordinal together with every named group the status belongs to.
#[axum::debug_handler]
async fn dossier_status(
    AxumPath(name): AxumPath<String>,
) -> Result<Json<StatusInfoRes>, (StatusCode, String)> {
    let status = match parse_status(&name) {
        Ok(status) => status,
        Err(e @ CoreError::UnknownStatus(_)) => {
            tracing::warn!("Invalid dossier status: {}", e);
            return Err((StatusCode::BAD_REQUEST, e.to_string()));
        }
        Err(e) => {
            tracing::error!("Status lookup error: {:?}", e);
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into()));
        }
    };

    Ok(Json(StatusInfoRes {
        status,
        ordinal: ordinal(status),
        groups: StatusGroup::groups_of(status),
    }))
}

#[utoipa::path(
    post,
    path = "/dossier-status/compare",
    request_body = CompareStatusReq,
    responses(
        (status = 200, description = "Comparison result", body = CompareStatusRes),
        (status = 422, description = "Both statuses are in the booster phase")
    )
)]
/// Check whether `status` ranks at or below `other`
///
/// # Errors
/// Returns `422 Unprocessable Entity` if both statuses belong to the booster phase.
#[axum::debug_handler]
async fn compare_dossier_status(
    Json(req): Json<CompareStatusReq>,
) -> Result<Json<CompareStatusRes>, (StatusCode, String)> {
    match is_at_most(req.status, req.other) {
        Ok(at_most) => Ok(Json(CompareStatusRes { at_most })),
        Err(e @ CoreError::InvalidBoosterComparison { .. }) => {
            tracing::warn!("Rejected status comparison: {}", e);
            Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
        }
        Err(e) => {
            tracing::error!("Status comparison error: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into()))
        }
    }
}

#[utoipa::path(
    post,
    path = "/wire/normalise",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Payload with date fields in canonical wire format", body = serde_json::Value),
        (status = 400, description = "Invalid JSON"),
        (status = 413, description = "Payload too large")
    )
)]
/// Echo a JSON payload with its date fields normalised
///
/// The work is done by the normalisation layer; the handler only hands the body back.
#[axum::debug_handler]
async fn normalise_wire(Json(payload): Json<serde_json::Value>) -> Json<serde_json::Value> {
    Json(payload)
}
