//! Users and their favorites set

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{FavoriteError, RequestError};
use crate::core::movie::MovieId;

/// A catalog user
///
/// Credentials live with the identity provider; this record only carries the
/// profile and the favorites set, kept in insertion order without duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub favorites: Vec<MovieId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(id: Uuid, username: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            username: username.into(),
            email: email.into(),
            favorites: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_favorite(&self, movie_id: &MovieId) -> bool {
        self.favorites.contains(movie_id)
    }

    /// Add a movie to the favorites set
    pub fn add_favorite(&mut self, movie_id: MovieId) -> Result<(), FavoriteError> {
        if self.has_favorite(&movie_id) {
            return Err(FavoriteError::AlreadyFavorited { movie_id });
        }
        self.favorites.push(movie_id);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Remove a movie from the favorites set; returns whether it was present
    pub fn remove_favorite(&mut self, movie_id: &MovieId) -> bool {
        let before = self.favorites.len();
        self.favorites.retain(|id| id != movie_id);
        let removed = self.favorites.len() != before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }
}

/// Payload for creating or updating the caller's profile
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProfileInput {
    #[validate(length(min = 3, message = "username must be at least 3 characters"))]
    pub username: String,

    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
}

impl ProfileInput {
    pub fn validated(mut self) -> Result<Self, RequestError> {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.validate()?;
        Ok(self)
    }

    /// Create the profile, or update the existing one keeping its favorites
    pub fn upsert(self, id: Uuid, existing: Option<UserRecord>) -> UserRecord {
        match existing {
            Some(mut user) => {
                user.username = self.username;
                user.email = self.email;
                user.updated_at = Utc::now();
                user
            }
            None => UserRecord::new(id, self.username, self.email),
        }
    }
}
