//! Request/response logging middleware with sensitive header redaction

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::info;

/// Header carrying the request correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Logs each request and its outcome, and makes sure both the request and
/// the response carry an `x-request-id`.
///
/// No span is opened here; `TraceLayer` owns the request span.
pub async fn logging_middleware(mut request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = extract_path(&request);
    let request_id = ensure_request_id(request.headers_mut());

    info!(
        method = %method,
        path = %path,
        request_id = %request_id,
        headers = %redact_headers(request.headers()),
        "Incoming request"
    );

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        request_id = %request_id,
        "Request completed"
    );

    response
}

fn extract_path(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

/// Reuse the caller's request id or assign a fresh uuid
fn ensure_request_id(headers: &mut HeaderMap) -> String {
    if let Some(existing) = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        return existing.to_string();
    }

    let generated = uuid::Uuid::new_v4().to_string();
    if let Ok(value) = HeaderValue::from_str(&generated) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    generated
}

/// Render the loggable headers with credentials masked
fn redact_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .filter(|(name, _)| should_log_header(name.as_str()))
        .map(|(name, value)| {
            let value = if is_sensitive_header(name.as_str()) {
                "[REDACTED]"
            } else {
                value.to_str().unwrap_or("[invalid]")
            };
            format!("{}={}", name, value)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_sensitive_header(name: &str) -> bool {
    matches!(
        name,
        "authorization"
            | "proxy-authorization"
            | "cookie"
            | "set-cookie"
            | "x-api-key"
            | "x-auth-token"
    )
}

fn should_log_header(name: &str) -> bool {
    matches!(
        name,
        "content-type"
            | "content-length"
            | "accept"
            | "user-agent"
            | "x-forwarded-for"
            | "x-real-ip"
            | "authorization"
            | "x-api-key"
    )
}
