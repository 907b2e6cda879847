//! Caller identity and access policies
//!
//! Authentication itself is handled upstream (gateway or identity provider).
//! The catalog only reads the resulting identity from trusted headers:
//! - `x-user-id`: the caller's UUID
//! - `x-user-roles`: comma-separated roles; `admin` grants admin access

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::core::error::{CatalogError, RequestError};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLES_HEADER: &str = "x-user-roles";
pub const ADMIN_ROLE: &str = "admin";

/// Authorization context extracted from a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthContext {
    /// Authenticated user
    User { user_id: Uuid, roles: Vec<String> },

    /// No authentication (public access)
    Anonymous,
}

impl AuthContext {
    /// Read the caller identity from request headers
    ///
    /// A missing `x-user-id` yields [`AuthContext::Anonymous`]; a present but
    /// malformed one is an error.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, RequestError> {
        let Some(raw_id) = headers.get(USER_ID_HEADER) else {
            return Ok(AuthContext::Anonymous);
        };
        let user_id = raw_id
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .ok_or_else(|| RequestError::InvalidHeader {
                header: USER_ID_HEADER.to_string(),
                message: "expected a UUID".to_string(),
            })?;

        let roles = match headers.get(USER_ROLES_HEADER) {
            None => Vec::new(),
            Some(raw) => raw
                .to_str()
                .map_err(|_| RequestError::InvalidHeader {
                    header: USER_ROLES_HEADER.to_string(),
                    message: "expected comma-separated ASCII roles".to_string(),
                })?
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect(),
        };

        Ok(AuthContext::User { user_id, roles })
    }

    /// Check if context represents an admin
    pub fn is_admin(&self) -> bool {
        match self {
            AuthContext::User { roles, .. } => roles.iter().any(|r| r == ADMIN_ROLE),
            AuthContext::Anonymous => false,
        }
    }

    /// Get user_id if available
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            AuthContext::User { user_id, .. } => Some(*user_id),
            AuthContext::Anonymous => None,
        }
    }

    /// The caller's id, or `Unauthorized` for anonymous callers
    pub fn require_user(&self) -> Result<Uuid, RequestError> {
        AuthPolicy::Authenticated.authorize(self)?;
        self.user_id().ok_or_else(|| RequestError::Unauthorized {
            message: "authentication required".to_string(),
        })
    }
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = CatalogError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(AuthContext::from_headers(&parts.headers)?)
    }
}

/// Authorization policy for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    /// Public access (no auth required)
    Public,

    /// Any authenticated user
    Authenticated,

    /// Admin only
    AdminOnly,
}

impl AuthPolicy {
    /// Check if auth context satisfies this policy
    pub fn check(&self, context: &AuthContext) -> bool {
        match self {
            AuthPolicy::Public => true,
            AuthPolicy::Authenticated => !matches!(context, AuthContext::Anonymous),
            AuthPolicy::AdminOnly => context.is_admin(),
        }
    }

    /// Like [`check`](Self::check), but reports 401 for anonymous callers and
    /// 403 for authenticated callers lacking the role
    pub fn authorize(&self, context: &AuthContext) -> Result<(), RequestError> {
        if self.check(context) {
            return Ok(());
        }
        match context {
            AuthContext::Anonymous => Err(RequestError::Unauthorized {
                message: "authentication required".to_string(),
            }),
            AuthContext::User { .. } => Err(RequestError::Forbidden {
                message: "admin role required".to_string(),
            }),
        }
    }
}
