//! Subagg API
//!
//! HTTP service for recording subscriptions and aggregating their cost.
//!
//! ## REST Endpoints
//!
//! - `POST /api/v1/subscriptions` - Create a subscription
//! - `GET /api/v1/subscriptions` - List subscriptions (filter + paging)
//! - `GET /api/v1/subscriptions/cost` - Total cost over a month window
//! - `GET /api/v1/subscriptions/{id}` - Get one subscription
//! - `PUT /api/v1/subscriptions/{id}` - Partially update a subscription
//! - `DELETE /api/v1/subscriptions/{id}` - Delete a subscription
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics
//!
//! ## Docs
//!
//! - `GET /swagger-ui` - Swagger UI
//! - `GET /api-docs/openapi.json` - OpenAPI document

pub mod config;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod state;

use axum::error_handling::HandleErrorLayer;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::timeout::error::Elapsed;
use tower::{BoxError, ServiceBuilder};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::error::ApiError;
use crate::handlers::{health, ready};
use crate::state::AppState;

/// Build the HTTP router.
///
/// API routes run under the request timeout, so a slow store call is
/// cancelled and its transaction rolled back. Probes, metrics and docs are
/// mounted outside it.
pub fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    // API v1 subscription routes
    let api_v1 = Router::new()
        .route(
            "/subscriptions",
            get(handlers::list_subscriptions).post(handlers::create_subscription),
        )
        .route("/subscriptions/cost", get(handlers::total_cost))
        .route(
            "/subscriptions/{id}",
            get(handlers::get_subscription)
                .put(handlers::update_subscription)
                .delete(handlers::delete_subscription),
        );

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics route (no timeout)
    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    let docs = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        // Request ID propagation (outermost)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        // Tracing with request details
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // CORS
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        // Request timeout (innermost - closest to handler)
        .layer(HandleErrorLayer::new(middleware_error))
        .timeout(request_timeout);

    Router::new()
        .nest("/api/v1", api_v1)
        .layer(middleware)
        .merge(health_routes)
        .merge(metrics_route)
        .merge(docs)
        .with_state(state)
}

/// Map errors raised by the middleware stack onto API errors
async fn middleware_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        tracing::warn!("Request deadline exceeded");
        ApiError::Timeout
    } else {
        tracing::error!(error = %err, "Unhandled middleware error");
        ApiError::Internal
    }
}
