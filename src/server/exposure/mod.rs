//! API Exposure modules for different protocols
//!
//! Each exposure type consumes the shared [`AppState`](crate::server::AppState)
//! and produces a Router for that protocol.

pub mod rest;

pub use rest::RestExposure;
