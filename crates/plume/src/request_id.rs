//! Request ID middleware for request correlation and debugging.
//!
//! Tags every request with a UUID, wraps handling in a tracing span, and
//! echoes the ID back in the X-Request-ID response header.

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for request ID.
pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Middleware that generates a request ID and adds it to tracing and response headers.
pub async fn request_id_middleware(request: Request, next: Next) -> Response<Body> {
    // Honor a client-provided ID so the front-end can correlate.
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri(),
    );

    async move {
        let mut response = next.run(request).await;

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response
                .headers_mut()
                .insert(REQUEST_ID_HEADER.clone(), value);
        }

        tracing::info!(status = %response.status().as_u16(), "Request completed");

        response
    }
    .instrument(span)
    .await
}
