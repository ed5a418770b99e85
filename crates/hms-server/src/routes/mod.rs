//! Route configuration for the HMS API server.

mod internal;
mod v1;

use crate::error::ApiError;
use crate::middleware::{cors_layer, LoggingLayer, RequestLogConfig};
use crate::state::AppState;
use crate::config::ServerConfig;
use axum::{http::HeaderName, response::IntoResponse, Router};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();
    let routes = Router::new()
        .nest("/api/v1", v1::router(state.clone()).merge(internal::router()))
        .fallback(fallback_handler)
        .with_state(state);
    with_middleware(routes, &config)
}

/// Wrap `routes` in the server-wide middleware stack.
pub fn with_middleware(routes: Router, config: &ServerConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    // Outermost first: the request id is set before anything logs.
    let common_middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(PropagateRequestIdLayer::new(request_id))
        .layer(TraceLayer::new_for_http())
        .layer(LoggingLayer::with_config(RequestLogConfig {
            log_headers: config.logging.log_headers,
            exclude_paths: config.logging.exclude_paths.clone(),
            redact_headers: vec![config.auth.cookie_name.clone()],
        }))
        .layer(CatchPanicLayer::new())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(config.server.body_limit_bytes));

    // Timeout and CORS build their own responses and need a `Default` body,
    // which only the boxed route body offers. Later layers wrap earlier ones.
    routes
        .layer(common_middleware)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(cors_layer(&config.cors))
}

async fn fallback_handler() -> impl IntoResponse {
    ApiError::NotFound("Route".into())
}
