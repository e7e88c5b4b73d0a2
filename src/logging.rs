use std::time::Instant;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::{info, info_span, warn, Instrument, Level};
use tracing_subscriber::{fmt, EnvFilter};

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Runs the request inside a `request` span, so handler and converter events (including
/// the error log of a failed conversion) carry the method and path, then emits one
/// summary line with the status and duration.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let span = info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
    );

    async move {
        let started_at = Instant::now();
        let response = next.run(request).await;
        let status = response.status();
        let duration_ms = started_at.elapsed().as_millis();

        if summary_level(status) == Level::WARN {
            warn!(status = status.as_u16(), duration_ms, "request rejected");
        } else {
            info!(status = status.as_u16(), duration_ms, "request summary");
        }

        response
    }
    .instrument(span)
    .await
}

/// Client errors are raised warn-level here; server errors are already logged at error
/// level where they are rendered, so their summary stays at info.
fn summary_level(status: StatusCode) -> Level {
    if status.is_client_error() {
        Level::WARN
    } else {
        Level::INFO
    }
}
