//! Request ids, latency metrics and failure logging shared by both listeners.

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use metrics::histogram;
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
const REQUEST_ID_MAX_LEN: usize = 64;

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
}

impl RequestContext {
    /// Reuse a well-formed id from the fronting proxy, otherwise mint one.
    fn from_headers(headers: &HeaderMap) -> Self {
        let inbound = headers
            .get(&REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| {
                !id.is_empty()
                    && id.len() <= REQUEST_ID_MAX_LEN
                    && id.bytes().all(|byte| byte.is_ascii_graphic())
            });

        let request_id = match inbound {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };
        Self { request_id }
    }
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let ctx = RequestContext::from_headers(request.headers());
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response.extensions_mut().insert(ctx);
    response
}

/// Record latency per route and log 4xx/5xx responses with their attached report.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();
    let start = Instant::now();

    let mut response = next.run(request).await;
    let status = response.status();
    let elapsed = start.elapsed();

    histogram!(
        "murmur_http_request_ms",
        "route" => route,
        "status" => status.as_u16().to_string()
    )
    .record(elapsed.as_secs_f64() * 1000.0);

    if status.is_client_error() || status.is_server_error() {
        let report = response.extensions_mut().remove::<ErrorReport>();
        let failure = Failure {
            status,
            method: method.as_str(),
            path: uri.path(),
            query: uri.query().unwrap_or(""),
            elapsed_ms: elapsed.as_millis(),
            request_id: &request_id,
            report,
        };
        failure.log();
    }

    response
}

struct Failure<'a> {
    status: StatusCode,
    method: &'a str,
    path: &'a str,
    query: &'a str,
    elapsed_ms: u128,
    request_id: &'a str,
    report: Option<ErrorReport>,
}

impl Failure<'_> {
    fn log(self) {
        let (source, chain) = match self.report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = chain
            .first()
            .map(String::as_str)
            .unwrap_or("no diagnostic available");

        if self.status.is_server_error() {
            error!(
                target = "murmur::http::response",
                status = self.status.as_u16(),
                method = self.method,
                path = self.path,
                query = self.query,
                elapsed_ms = self.elapsed_ms,
                source,
                detail,
                ?chain,
                request_id = self.request_id,
                "request failed",
            );
        } else {
            warn!(
                target = "murmur::http::response",
                status = self.status.as_u16(),
                method = self.method,
                path = self.path,
                query = self.query,
                source,
                detail,
                request_id = self.request_id,
                "client request error",
            );
        }
    }
}
