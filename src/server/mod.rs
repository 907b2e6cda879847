//! Server module for building the catalog HTTP server
//!
//! This module provides a `ServerBuilder` that registers:
//! - Catalog routes for movies, favorites and profiles
//! - Health check routes

pub mod builder;
pub mod exposure;
pub mod handlers;
pub mod router;

pub use builder::ServerBuilder;
pub use handlers::AppState;
