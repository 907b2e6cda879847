//! REST API exposure for the catalog
//!
//! Consumes an [`AppState`] and produces an Axum `Router` with health checks,
//! catalog routes, any custom routes, and the HTTP middleware stack.

use axum::http::HeaderValue;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::AppState;
use crate::server::router::build_catalog_routes;

/// REST API exposure implementation
pub struct RestExposure;

impl RestExposure {
    /// Build the REST router
    ///
    /// # Arguments
    ///
    /// * `state` - Stores and limits shared by all handlers
    /// * `custom_routes` - Additional custom routes to merge
    /// * `cors_origins` - Allowed origins; empty allows any origin
    pub fn build_router(state: AppState, custom_routes: Vec<Router>, cors_origins: &[String]) -> Router {
        let mut app = Self::health_routes().merge(build_catalog_routes(state));

        for custom_router in custom_routes {
            app = app.merge(custom_router);
        }

        app.layer(TraceLayer::new_for_http())
            .layer(Self::cors_layer(cors_origins))
    }

    fn cors_layer(origins: &[String]) -> CorsLayer {
        let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
        if origins.is_empty() {
            return layer.allow_origin(Any);
        }
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        layer.allow_origin(origins)
    }

    /// Build health check routes
    fn health_routes() -> Router {
        Router::new()
            .route("/health", get(Self::health_check))
            .route("/healthz", get(Self::health_check))
    }

    /// Health check endpoint handler
    async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "ok",
            "service": "marquee"
        }))
    }
}
