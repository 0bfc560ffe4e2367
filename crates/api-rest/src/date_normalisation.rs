//! JSON date normalisation layer.
//!
//! Runs every `application/json` request and response body through
//! [`DateTimeWireCodec::normalise`], so handlers and clients only ever see date fields in the
//! canonical `YYYY-MM-DDTHH:mm:ss.SSS` wire form. Bodies with any other content type pass through
//! untouched.

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use http_body_util::LengthLimitError;
use impf_core::DateTimeWireCodec;

use crate::AppState;

/// Returns true when the `Content-Type` header names JSON (parameters such as `charset` are
/// ignored).
pub fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
}

/// Normalises the date fields of a serialised JSON document.
///
/// Empty input is returned as-is. Documents whose root is a scalar are re-serialised unchanged.
///
/// # Errors
///
/// Returns the parse error when `bytes` is not valid JSON.
pub fn normalise_bytes(codec: &DateTimeWireCodec, bytes: &Bytes) -> serde_json::Result<Bytes> {
    if bytes.is_empty() {
        return Ok(bytes.clone());
    }
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    let normalised = codec.normalise(&value).unwrap_or(value);
    serde_json::to_vec(&normalised).map(Bytes::from)
}

/// Maps a failure to buffer a request body onto a status code.
///
/// Only the length limit yields `413`; a broken body stream is the client's fault and yields
/// `400`.
fn body_read_rejection(err: &axum::Error, limit: usize) -> (StatusCode, String) {
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if cause.is::<LengthLimitError>() {
            tracing::warn!("Rejected JSON request body over {} bytes", limit);
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("request body exceeds {limit} bytes"),
            );
        }
        source = cause.source();
    }
    tracing::warn!("Failed to read JSON request body: {}", err);
    (
        StatusCode::BAD_REQUEST,
        "failed to read request body".to_string(),
    )
}

/// Middleware applying [`normalise_bytes`] to JSON request and response bodies.
///
/// # Errors
///
/// - `413 Payload Too Large` if the request body exceeds the configured limit
/// - `400 Bad Request` if a JSON request body cannot be read or parsed
pub async fn normalise_json_dates(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    let request = if is_json(request.headers()) {
        let (mut parts, body) = request.into_parts();
        let bytes = to_bytes(body, state.max_body_bytes)
            .await
            .map_err(|e| body_read_rejection(&e, state.max_body_bytes))?;
        let normalised = normalise_bytes(&state.codec, &bytes).map_err(|e| {
            tracing::warn!("Invalid JSON request body: {}", e);
            (StatusCode::BAD_REQUEST, format!("invalid JSON body: {e}"))
        })?;
        parts.headers.remove(header::CONTENT_LENGTH);
        Request::from_parts(parts, Body::from(normalised))
    } else {
        request
    };

    let response = next.run(request).await;
    if !is_json(response.headers()) {
        return Ok(response);
    }

    // Responses come from this service's own handlers, so only inbound bodies are limited.
    let (mut parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.map_err(|e| {
        tracing::error!("Failed to buffer JSON response body: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal error".to_string(),
        )
    })?;
    let body = match normalise_bytes(&state.codec, &bytes) {
        Ok(normalised) => normalised,
        Err(e) => {
            tracing::warn!("Response declared JSON but did not parse, passing through: {}", e);
            bytes
        }
    };
    parts.headers.remove(header::CONTENT_LENGTH);
    Ok(Response::from_parts(parts, Body::from(body)))
}
