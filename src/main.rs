//! Marquee catalog server
//!
//! Usage: `marquee [CONFIG.yaml]`, or set `MARQUEE_CONFIG`. Without a config
//! file the server runs on the defaults with the in-memory store.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use marquee::config::{CONFIG_ENV_VAR, CatalogConfig, StorageConfig};
use marquee::server::ServerBuilder;
use marquee::storage::{InMemoryMovieStore, InMemoryReviewStore, InMemoryUserStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV_VAR).ok());

    let config = match &config_path {
        Some(path) => CatalogConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load configuration from {path}"))?,
        None => CatalogConfig::default(),
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(
        config = config_path.as_deref().unwrap_or("<defaults>"),
        storage = config.storage.backend_name(),
        "starting marquee"
    );

    let builder = ServerBuilder::new().with_config(config.clone());
    let builder = attach_stores(builder, &config.storage).await?;
    builder.serve().await
}

async fn attach_stores(builder: ServerBuilder, storage: &StorageConfig) -> Result<ServerBuilder> {
    match storage {
        StorageConfig::InMemory => Ok(builder
            .with_movie_store(InMemoryMovieStore::new())
            .with_user_store(InMemoryUserStore::new())
            .with_review_store(InMemoryReviewStore::new())),
        StorageConfig::Mongodb { uri, database } => mongodb_stores(builder, uri, database).await,
    }
}

#[cfg(feature = "mongodb_backend")]
async fn mongodb_stores(builder: ServerBuilder, uri: &str, database: &str) -> Result<ServerBuilder> {
    use marquee::storage::mongodb::{MongoMovieStore, MongoReviewStore, MongoUserStore, connect};

    let db = connect(uri, database).await?;
    let movies = MongoMovieStore::new(db.clone());
    movies.ensure_indexes().await?;
    let reviews = MongoReviewStore::new(db.clone());
    reviews.ensure_indexes().await?;
    Ok(builder
        .with_movie_store(movies)
        .with_user_store(MongoUserStore::new(db))
        .with_review_store(reviews))
}

#[cfg(not(feature = "mongodb_backend"))]
async fn mongodb_stores(
    _builder: ServerBuilder,
    _uri: &str,
    _database: &str,
) -> Result<ServerBuilder> {
    anyhow::bail!("storage backend 'mongodb' requires building with the `mongodb_backend` feature")
}
