//! Per-request access log.

use crate::middleware::chain::{Endpoint, Middleware};
use async_trait::async_trait;
use axum::{extract::Request, response::Response};
use std::time::Instant;

/// Logs method, path, status and latency of every request at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLog;

#[async_trait]
impl Middleware for RequestLog {
    async fn handle(&self, req: Request, next: Endpoint) -> Response {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let start = Instant::now();

        let response = next.call(req).await;

        let status = response.status();
        let latency_ms = start.elapsed().as_millis() as u64;
        if status.is_server_error() {
            tracing::error!(%method, %path, status = status.as_u16(), latency_ms, "request failed");
        } else {
            tracing::info!(%method, %path, status = status.as_u16(), latency_ms, "request");
        }
        response
    }

    fn name(&self) -> &'static str {
        "request_log"
    }
}
