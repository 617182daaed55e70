//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Health check
//!
//! # Orders
//! GET  /api/orders                      - Order listing
//!
//! # Flows (JSON in, JSON out, camelCase fields)
//! POST /api/flows/product-description   - Product description copy
//! POST /api/flows/product-price         - Suggested INR price
//! POST /api/flows/marketing-ideas       - Event marketing ideas
//! POST /api/flows/sales-insights        - Sales insights (uses order history)
//! POST /api/flows/trending-crafts       - Market trend analysis
//! POST /api/flows/platform-tour         - Onboarding tour
//! POST /api/flows/translate             - English to Hindi, body { "texts": [...] }
//! ```

pub mod flows;
pub mod orders;

use axum::http::{Method, header};
use axum::{Router, routing::get};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// Build the route table.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(orders::router())
        .merge(flows::router())
}

/// Full application: routes, state, tracing and CORS.
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                status = tracing::field::Empty,
                latency_ms = tracing::field::Empty,
            )
        })
        .on_response(
            |response: &axum::http::Response<_>, latency: std::time::Duration, span: &Span| {
                span.record("status", response.status().as_u16());
                span.record(
                    "latency_ms",
                    u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                );
                DefaultOnResponse::default().on_response(response, latency, span);
            },
        );

    // Trace outermost so CORS preflights are logged too
    routes()
        .layer(ServiceBuilder::new().layer(trace).layer(cors))
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
