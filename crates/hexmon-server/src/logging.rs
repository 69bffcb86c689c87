use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;

/// One log line per request once the handler finished, level by status class.
pub async fn request_logging(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    let status = response.status();
    if status.is_server_error() {
        tracing::error!(method = %method, path = %path, status = status.as_u16(), elapsed_ms, "Request failed");
    } else if status.is_client_error() {
        tracing::warn!(method = %method, path = %path, status = status.as_u16(), elapsed_ms, "Request rejected");
    } else {
        tracing::info!(method = %method, path = %path, status = status.as_u16(), elapsed_ms, "Request served");
    }

    response
}
