//! HTTP API server for the record shop ordering service.
//!
//! Exposes order placement and catalog management as REST endpoints, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain::{CatalogService, OrderService};
use musicbrainz::ReleaseLookup;
use notifier::Notifier;
use store::Store;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store, N: Notifier, L: ReleaseLookup> {
    pub orders: OrderService<S, N>,
    pub catalog: CatalogService<S, L>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, N, L>(
    state: Arc<AppState<S, N, L>>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    S: Store + 'static,
    N: Notifier + 'static,
    L: ReleaseLookup + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S, N, L>))
        .route("/records", post(routes::records::create::<S, N, L>))
        .route("/records", get(routes::records::list::<S, N, L>))
        .route("/records/{id}", put(routes::records::update::<S, N, L>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
