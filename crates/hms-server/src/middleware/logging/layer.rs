//! Request logging middleware.

use super::redaction::format_headers;
use crate::middleware::rate_limit::client_ip;
use axum::{extract::Request, http::Response};
use futures::future::BoxFuture;
use std::{
    sync::Arc,
    task::{Context, Poll},
    time::Instant,
};
use tower::{Layer, Service};
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Emits `request_started` / `request_completed` events per request.
#[derive(Clone, Default)]
pub struct LoggingLayer {
    config: Arc<RequestLogConfig>,
}

#[derive(Debug, Clone, Default)]
pub struct RequestLogConfig {
    /// Log redacted request headers at debug level.
    pub log_headers: bool,
    /// Path prefixes to exclude from logging.
    pub exclude_paths: Vec<String>,
    /// Extra headers to redact.
    pub redact_headers: Vec<String>,
}

impl LoggingLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RequestLogConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingMiddleware {
            inner,
            config: self.config.clone(),
        }
    }
}

#[derive(Clone)]
pub struct LoggingMiddleware<S> {
    inner: S,
    config: Arc<RequestLogConfig>,
}

impl<S, ResBody> Service<Request> for LoggingMiddleware<S>
where
    S: Service<Request, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let config = self.config.clone();
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let path = req.uri().path().to_string();
        if config.exclude_paths.iter().any(|p| path.starts_with(p.as_str())) {
            return Box::pin(inner.call(req));
        }

        let method = req.method().clone();
        let request_id = req
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();
        let client_ip = client_ip(&req);
        let user_agent = req
            .headers()
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let span = info_span!(
            "request",
            request_id = %request_id,
            method = %method,
            path = %path,
            client_ip = %client_ip,
        );

        if config.log_headers {
            let headers = format_headers(req.headers(), &config.redact_headers);
            span.in_scope(|| debug!(headers = %headers, "Request headers"));
        }

        Box::pin(
            async move {
                let start = Instant::now();
                info!(event = "request_started", user_agent = %user_agent);

                let response = inner.call(req).await?;

                let status = response.status().as_u16();
                let duration_ms = start.elapsed().as_millis() as u64;
                if status >= 500 {
                    error!(event = "request_completed", status, duration_ms);
                } else if status >= 400 {
                    warn!(event = "request_completed", status, duration_ms);
                } else {
                    info!(event = "request_completed", status, duration_ms);
                }

                Ok(response)
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode};
    use std::convert::Infallible;
    use tower::{service_fn, ServiceExt};

    #[tokio::test]
    async fn test_passes_response_through() {
        let service = LoggingLayer::with_config(RequestLogConfig {
            log_headers: true,
            exclude_paths: vec!["/health".into()],
            redact_headers: Vec::new(),
        })
        .layer(service_fn(|_req: Request| async {
            Ok::<_, Infallible>(
                Response::builder()
                    .status(StatusCode::CREATED)
                    .body(Body::empty())
                    .unwrap(),
            )
        }));

        let req = axum::http::Request::builder()
            .uri("/api/v1/appointments")
            .header("authorization", "Bearer secret")
            .body(Body::empty())
            .unwrap();
        let response = service.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let req = axum::http::Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
