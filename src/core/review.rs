//! Movie reviews and the rating summary derived from them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::RequestError;
use crate::core::movie::MovieId;
use crate::core::user::UserRecord;

/// A user's review of one movie
///
/// A user reviews a given movie at most once. The author's username is copied
/// in at creation so listings do not need a user lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub id: Uuid,
    pub movie_id: MovieId,
    pub user_id: Uuid,
    pub username: String,
    pub rating: f64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for posting a review
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewInput {
    #[validate(range(min = 0.0, max = 10.0, message = "rating must be between 0 and 10"))]
    pub rating: f64,

    #[validate(length(
        min = 1,
        max = 2000,
        message = "comment must be between 1 and 2000 characters"
    ))]
    pub comment: String,
}

impl ReviewInput {
    pub fn validated(mut self) -> Result<Self, RequestError> {
        self.comment = self.comment.trim().to_string();
        self.validate()?;
        Ok(self)
    }

    pub fn into_record(self, movie_id: MovieId, author: &UserRecord, now: DateTime<Utc>) -> ReviewRecord {
        ReviewRecord {
            id: Uuid::now_v7(),
            movie_id,
            user_id: author.id,
            username: author.username.clone(),
            rating: self.rating,
            comment: self.comment,
            created_at: now,
        }
    }
}

/// Average rating and review count of one movie
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub average_rating: f64,
    pub review_count: u32,
}

impl RatingSummary {
    /// Summarize a movie's reviews; the average is rounded to two decimals
    pub fn of(reviews: &[ReviewRecord]) -> Self {
        if reviews.is_empty() {
            return Self::default();
        }
        let total: f64 = reviews.iter().map(|r| r.rating).sum();
        let mean = total / reviews.len() as f64;
        Self {
            average_rating: (mean * 100.0).round() / 100.0,
            review_count: u32::try_from(reviews.len()).unwrap_or(u32::MAX),
        }
    }
}
