use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Instrument;
use uuid::Uuid;

/// HTTP header name for request correlation
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tags every request with an id for log correlation and echoes it on the
/// response. An incoming `x-request-id` header wins when the caller already
/// set one.
pub async fn request_id(request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|header| header.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
        .unwrap_or_else(Uuid::new_v4);

    let span = tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %id,
    );

    let mut response = next.run(request).instrument(span).await;

    if let Ok(header) = HeaderValue::from_str(&id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, header);
    }
    response
}
