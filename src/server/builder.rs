//! ServerBuilder for fluent API to build HTTP servers

use anyhow::{Result, anyhow};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

use super::exposure::RestExposure;
use super::handlers::AppState;
use crate::config::CatalogConfig;
use crate::core::service::{MovieStore, ReviewStore, UserStore};

/// Builder for creating the catalog HTTP server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_config(config)
///     .with_movie_store(InMemoryMovieStore::new())
///     .with_user_store(InMemoryUserStore::new())
///     .with_review_store(InMemoryReviewStore::new())
///     .build()?;
/// ```
pub struct ServerBuilder {
    movie_store: Option<Arc<dyn MovieStore>>,
    user_store: Option<Arc<dyn UserStore>>,
    review_store: Option<Arc<dyn ReviewStore>>,
    config: CatalogConfig,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder with the default configuration
    pub fn new() -> Self {
        Self {
            movie_store: None,
            user_store: None,
            review_store: None,
            config: CatalogConfig::default(),
            custom_routes: Vec::new(),
        }
    }

    /// Use `config` for pagination limits and CORS
    pub fn with_config(mut self, config: CatalogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the movie store (required)
    pub fn with_movie_store(mut self, store: impl MovieStore + 'static) -> Self {
        self.movie_store = Some(Arc::new(store));
        self
    }

    /// Set the movie store from a shared handle
    pub fn with_shared_movie_store(mut self, store: Arc<dyn MovieStore>) -> Self {
        self.movie_store = Some(store);
        self
    }

    /// Set the user store (required)
    pub fn with_user_store(mut self, store: impl UserStore + 'static) -> Self {
        self.user_store = Some(Arc::new(store));
        self
    }

    /// Set the user store from a shared handle
    pub fn with_shared_user_store(mut self, store: Arc<dyn UserStore>) -> Self {
        self.user_store = Some(store);
        self
    }

    /// Set the review store (required)
    pub fn with_review_store(mut self, store: impl ReviewStore + 'static) -> Self {
        self.review_store = Some(Arc::new(store));
        self
    }

    /// Set the review store from a shared handle
    pub fn with_shared_review_store(mut self, store: Arc<dyn ReviewStore>) -> Self {
        self.review_store = Some(store);
        self
    }

    /// Add custom routes to the server
    ///
    /// Use this to add routes that don't fit the catalog, such as
    /// authentication endpoints or admin tooling.
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the handler state
    pub fn build_state(&mut self) -> Result<AppState> {
        let movies = self
            .movie_store
            .take()
            .ok_or_else(|| anyhow!("MovieStore is required. Call .with_movie_store()"))?;
        let users = self
            .user_store
            .take()
            .ok_or_else(|| anyhow!("UserStore is required. Call .with_user_store()"))?;
        let reviews = self
            .review_store
            .take()
            .ok_or_else(|| anyhow!("ReviewStore is required. Call .with_review_store()"))?;
        self.config.validate()?;
        Ok(AppState::new(
            movies,
            users,
            reviews,
            self.config.pagination_limits(),
        ))
    }

    /// Build the final REST router
    pub fn build(mut self) -> Result<Router> {
        let state = self.build_state()?;
        let custom_routes = std::mem::take(&mut self.custom_routes);
        Ok(RestExposure::build_router(
            state,
            custom_routes,
            &self.config.server.cors_origins,
        ))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the configured `server.bind` address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.bind_addr()?;
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
