//! Fallback error response.
//!
//! Used by the lifecycle when a failure was recorded and no error listener
//! produced anything to render.

use crate::event::MvcFailure;
use crate::http::HttpResponse;
use axum::body::Bytes;
use axum::http::{HeaderValue, header};
use serde_json::json;

/// Build the JSON error response for a recorded failure.
///
/// Not-found kinds answer `404`, everything else `500`.
pub fn default_error_response(failure: &MvcFailure) -> HttpResponse {
    let status = failure.kind().status();
    tracing::debug!("Using default error response for {}", failure);

    let body = json!({
        "statusCode": status.as_u16(),
        "error": failure.kind().as_ref(),
        "message": failure.message(),
        "controller": failure.controller(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    let mut response = HttpResponse::new(Bytes::from(body.to_string()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}
