//! Typed error handling for the catalog
//!
//! Every failure the catalog can report to a caller is one of the categories
//! below. Each category knows its HTTP status and a stable machine-readable
//! error code, so the HTTP layer never has to inspect messages.
//!
//! # Error Categories
//!
//! - [`QueryError`]: malformed filter, sort or pagination parameters
//! - [`MovieError`]: movie lookup failures
//! - [`UserError`]: user profile lookup failures
//! - [`FavoriteError`]: favorites membership failures
//! - [`ReviewError`]: review authoring conflicts
//! - [`StorageError`]: persistence collaborator failures
//! - [`RequestError`]: caller identity, path and payload problems
//! - [`ConfigError`]: configuration parsing and validation (startup only)
//!
//! # Example
//!
//! ```rust,ignore
//! match store.query(&spec).await {
//!     Ok(page) => render(page),
//!     Err(CatalogError::Query(QueryError::InvalidParameter { parameter, .. })) => {
//!         println!("bad parameter: {parameter}");
//!     }
//!     Err(e) => eprintln!("other error: {e}"),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::core::movie::MovieId;

/// The main error type for the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Query parameter errors
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Movie lookup errors
    #[error(transparent)]
    Movie(#[from] MovieError),

    /// User profile errors
    #[error(transparent)]
    User(#[from] UserError),

    /// Favorites membership errors
    #[error(transparent)]
    Favorite(#[from] FavoriteError),

    /// Review errors
    #[error(transparent)]
    Review(#[from] ReviewError),

    /// Persistence collaborator errors
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// HTTP/Request errors
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Internal errors (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl CatalogError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            CatalogError::Query(_) => StatusCode::BAD_REQUEST,
            CatalogError::Movie(e) => e.status_code(),
            CatalogError::User(e) => e.status_code(),
            CatalogError::Favorite(e) => e.status_code(),
            CatalogError::Review(e) => e.status_code(),
            CatalogError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CatalogError::Request(e) => e.status_code(),
            CatalogError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CatalogError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            CatalogError::Query(e) => e.error_code(),
            CatalogError::Movie(e) => e.error_code(),
            CatalogError::User(e) => e.error_code(),
            CatalogError::Favorite(e) => e.error_code(),
            CatalogError::Review(e) => e.error_code(),
            CatalogError::Storage(e) => e.error_code(),
            CatalogError::Request(e) => e.error_code(),
            CatalogError::Config(_) => "CONFIG_ERROR",
            CatalogError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True when the caller sent something wrong, false for server-side failures
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            CatalogError::Query(QueryError::InvalidParameter {
                parameter, value, ..
            }) => Some(serde_json::json!({
                "parameter": parameter,
                "value": value,
            })),
            CatalogError::Movie(MovieError::NotFound { id }) => {
                Some(serde_json::json!({ "id": id.to_string() }))
            }
            CatalogError::Request(RequestError::Validation(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            CatalogError::Favorite(FavoriteError::AlreadyFavorited { movie_id })
            | CatalogError::Review(ReviewError::AlreadyReviewed { movie_id }) => {
                Some(serde_json::json!({ "movie_id": movie_id.to_string() }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            tracing::debug!(code = self.error_code(), "{}", self);
        } else {
            tracing::error!(code = self.error_code(), "{}", self);
        }
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Query Errors
// =============================================================================

/// Errors raised while turning raw request parameters into a query
#[derive(Debug, Error)]
pub enum QueryError {
    /// A filter, sort or pagination value could not be accepted
    #[error("Invalid value '{value}' for parameter '{parameter}': {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
}

impl QueryError {
    pub fn invalid(
        parameter: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        QueryError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            QueryError::InvalidParameter { .. } => "INVALID_PARAMETER",
        }
    }
}

// =============================================================================
// Movie Errors
// =============================================================================

/// Errors related to movie lookup
#[derive(Debug, Error)]
pub enum MovieError {
    /// Movie was not found
    #[error("Movie with id '{id}' not found")]
    NotFound { id: MovieId },
}

impl MovieError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            MovieError::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            MovieError::NotFound { .. } => "MOVIE_NOT_FOUND",
        }
    }
}

// =============================================================================
// User Errors
// =============================================================================

/// Errors related to user profiles
#[derive(Debug, Error)]
pub enum UserError {
    /// No profile exists for the caller
    #[error("User with id '{user_id}' not found")]
    NotFound { user_id: uuid::Uuid },
}

impl UserError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UserError::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            UserError::NotFound { .. } => "USER_NOT_FOUND",
        }
    }
}

// =============================================================================
// Favorite Errors
// =============================================================================

/// Errors related to a user's favorites set
#[derive(Debug, Error)]
pub enum FavoriteError {
    /// The movie is already a member of the favorites set
    #[error("Movie '{movie_id}' is already in favorites")]
    AlreadyFavorited { movie_id: MovieId },
}

impl FavoriteError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FavoriteError::AlreadyFavorited { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            FavoriteError::AlreadyFavorited { .. } => "ALREADY_FAVORITED",
        }
    }
}

// =============================================================================
// Review Errors
// =============================================================================

/// Errors related to movie reviews
#[derive(Debug, Error)]
pub enum ReviewError {
    /// The caller has already reviewed this movie
    #[error("Movie '{movie_id}' has already been reviewed by this user")]
    AlreadyReviewed { movie_id: MovieId },
}

impl ReviewError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReviewError::AlreadyReviewed { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ReviewError::AlreadyReviewed { .. } => "ALREADY_REVIEWED",
        }
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to storage backends
#[derive(Debug, Error)]
pub enum StorageError {
    /// The persistence collaborator could not serve the request
    #[error("{backend} unavailable: {message}")]
    PersistenceUnavailable { backend: String, message: String },

    /// A stored document could not be converted to or from a record
    #[error("Failed to convert {backend} document: {message}")]
    Serialization { backend: String, message: String },
}

impl StorageError {
    pub fn unavailable(backend: &str, message: impl std::fmt::Display) -> Self {
        StorageError::PersistenceUnavailable {
            backend: backend.to_string(),
            message: message.to_string(),
        }
    }

    pub fn serialization(backend: &str, message: impl std::fmt::Display) -> Self {
        StorageError::Serialization {
            backend: backend.to_string(),
            message: message.to_string(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::PersistenceUnavailable { .. } => "PERSISTENCE_UNAVAILABLE",
            StorageError::Serialization { .. } => "STORAGE_SERIALIZATION_ERROR",
        }
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// A single field validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

fn format_field_errors(errors: &[FieldValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors related to HTTP requests
#[derive(Debug, Error)]
pub enum RequestError {
    /// A request payload was malformed or failed validation
    #[error("Validation errors: {}", format_field_errors(.0))]
    Validation(Vec<FieldValidationError>),

    /// A header carried a value that could not be parsed
    #[error("Invalid header '{header}': {message}")]
    InvalidHeader { header: String, message: String },

    /// Path segment is not a usable movie identifier
    #[error("Invalid movie ID format: '{id}'")]
    InvalidMovieId { id: String },

    /// Unauthorized request
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Forbidden operation
    #[error("Forbidden: {message}")]
    Forbidden { message: String },
}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::Validation(_) => StatusCode::BAD_REQUEST,
            RequestError::InvalidHeader { .. } => StatusCode::BAD_REQUEST,
            RequestError::InvalidMovieId { .. } => StatusCode::BAD_REQUEST,
            RequestError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            RequestError::Forbidden { .. } => StatusCode::FORBIDDEN,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::Validation(_) => "VALIDATION_ERROR",
            RequestError::InvalidHeader { .. } => "INVALID_HEADER",
            RequestError::InvalidMovieId { .. } => "INVALID_MOVIE_ID",
            RequestError::Unauthorized { .. } => "UNAUTHORIZED",
            RequestError::Forbidden { .. } => "FORBIDDEN",
        }
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration
    #[error("Failed to parse config{}: {message}", file_suffix(.file))]
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    #[error("Invalid value '{value}' for field '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// IO error while reading configuration
    #[error("IO error reading '{path}': {message}")]
    IoError { path: String, message: String },
}

fn file_suffix(file: &Option<String>) -> String {
    file.as_ref()
        .map(|f| format!(" file '{f}'"))
        .unwrap_or_default()
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_yaml::Error> for CatalogError {
    fn from(err: serde_yaml::Error) -> Self {
        CatalogError::Config(ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        })
    }
}

impl From<validator::ValidationErrors> for RequestError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldValidationError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldValidationError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        // field_errors() iterates a HashMap
        fields.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));
        RequestError::Validation(fields)
    }
}

impl From<validator::ValidationErrors> for CatalogError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CatalogError::Request(errors.into())
    }
}

/// Convert from anyhow::Error for wiring code that mixes both
impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<CatalogError>() {
            Ok(catalog_err) => catalog_err,
            Err(other) => CatalogError::Internal(other.to_string()),
        }
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
