//! In-memory stores for testing, development and frontend-style callers

use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::core::error::{CatalogResult, MovieError, ReviewError, StorageError, UserError};
use crate::core::evaluator::derive_view;
use crate::core::facets::{FacetSet, derive_facets};
use crate::core::movie::{MovieId, MovieRecord};
use crate::core::query::{QuerySpec, ResultPage};
use crate::core::review::{RatingSummary, ReviewRecord};
use crate::core::service::{MovieStore, ReviewStore, UserStore};
use crate::core::user::UserRecord;

const BACKEND: &str = "in-memory";

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::unavailable(BACKEND, format!("lock poisoned: {e}"))
}

/// In-memory movie store
///
/// Keeps movies in insertion order so queries see the same collection order a
/// frontend would. Uses RwLock for thread-safe access.
#[derive(Clone, Default)]
pub struct InMemoryMovieStore {
    movies: Arc<RwLock<IndexMap<MovieId, MovieRecord>>>,
}

impl InMemoryMovieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with `movies`, in order
    ///
    /// Later duplicates of an id replace the earlier record in place.
    pub fn with_movies(movies: impl IntoIterator<Item = MovieRecord>) -> Self {
        let map = movies
            .into_iter()
            .map(|m| {
                let m = m.normalized();
                (m.id.clone(), m)
            })
            .collect();
        Self {
            movies: Arc::new(RwLock::new(map)),
        }
    }

    fn snapshot(&self) -> CatalogResult<Vec<MovieRecord>> {
        let movies = self.movies.read().map_err(lock_error)?;
        Ok(movies.values().cloned().collect())
    }
}

#[async_trait]
impl MovieStore for InMemoryMovieStore {
    async fn create(&self, movie: MovieRecord) -> CatalogResult<MovieRecord> {
        let movie = movie.normalized();
        let mut movies = self.movies.write().map_err(lock_error)?;
        movies.insert(movie.id.clone(), movie.clone());
        Ok(movie)
    }

    async fn get(&self, id: &MovieId) -> CatalogResult<Option<MovieRecord>> {
        let movies = self.movies.read().map_err(lock_error)?;
        Ok(movies.get(id).cloned())
    }

    async fn get_many(&self, ids: &[MovieId]) -> CatalogResult<Vec<MovieRecord>> {
        let movies = self.movies.read().map_err(lock_error)?;
        Ok(ids.iter().filter_map(|id| movies.get(id).cloned()).collect())
    }

    async fn list(&self) -> CatalogResult<Vec<MovieRecord>> {
        self.snapshot()
    }

    async fn update(&self, id: &MovieId, movie: MovieRecord) -> CatalogResult<MovieRecord> {
        let mut movies = self.movies.write().map_err(lock_error)?;
        let Some(slot) = movies.get_mut(id) else {
            return Err(MovieError::NotFound { id: id.clone() }.into());
        };
        let mut movie = movie.normalized();
        movie.id = id.clone();
        *slot = movie.clone();
        Ok(movie)
    }

    async fn delete(&self, id: &MovieId) -> CatalogResult<()> {
        let mut movies = self.movies.write().map_err(lock_error)?;
        // shift_remove keeps the remaining insertion order intact
        movies
            .shift_remove(id)
            .map(|_| ())
            .ok_or_else(|| MovieError::NotFound { id: id.clone() }.into())
    }

    async fn set_rating_summary(
        &self,
        id: &MovieId,
        summary: RatingSummary,
    ) -> CatalogResult<MovieRecord> {
        let mut movies = self.movies.write().map_err(lock_error)?;
        let movie = movies
            .get_mut(id)
            .ok_or_else(|| MovieError::NotFound { id: id.clone() })?;
        movie.average_rating = summary.average_rating;
        movie.review_count = summary.review_count;
        Ok(movie.clone())
    }

    async fn query(&self, spec: &QuerySpec) -> CatalogResult<ResultPage<MovieRecord>> {
        let movies = self.movies.read().map_err(lock_error)?;
        let collection: Vec<MovieRecord> = movies.values().cloned().collect();
        drop(movies);
        Ok(derive_view(&collection, spec))
    }

    async fn facets(&self) -> CatalogResult<FacetSet> {
        Ok(derive_facets(&self.snapshot()?))
    }
}

/// In-memory user store
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, UserRecord>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get(&self, id: &Uuid) -> CatalogResult<Option<UserRecord>> {
        let users = self.users.read().map_err(lock_error)?;
        Ok(users.get(id).cloned())
    }

    async fn save(&self, user: UserRecord) -> CatalogResult<UserRecord> {
        let mut users = self.users.write().map_err(lock_error)?;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn add_favorite(&self, user_id: &Uuid, movie_id: MovieId) -> CatalogResult<UserRecord> {
        let mut users = self.users.write().map_err(lock_error)?;
        let user = users
            .get_mut(user_id)
            .ok_or(UserError::NotFound { user_id: *user_id })?;
        user.add_favorite(movie_id)?;
        Ok(user.clone())
    }

    async fn remove_favorite(
        &self,
        user_id: &Uuid,
        movie_id: &MovieId,
    ) -> CatalogResult<UserRecord> {
        let mut users = self.users.write().map_err(lock_error)?;
        let user = users
            .get_mut(user_id)
            .ok_or(UserError::NotFound { user_id: *user_id })?;
        user.remove_favorite(movie_id);
        Ok(user.clone())
    }
}

/// In-memory review store, oldest review first
#[derive(Clone, Default)]
pub struct InMemoryReviewStore {
    reviews: Arc<RwLock<Vec<ReviewRecord>>>,
}

impl InMemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn select(&self, keep: impl Fn(&ReviewRecord) -> bool) -> CatalogResult<Vec<ReviewRecord>> {
        let reviews = self.reviews.read().map_err(lock_error)?;
        Ok(reviews.iter().filter(|r| keep(r)).cloned().collect())
    }
}

#[async_trait]
impl ReviewStore for InMemoryReviewStore {
    async fn create(&self, review: ReviewRecord) -> CatalogResult<ReviewRecord> {
        let mut reviews = self.reviews.write().map_err(lock_error)?;
        if reviews
            .iter()
            .any(|r| r.movie_id == review.movie_id && r.user_id == review.user_id)
        {
            return Err(ReviewError::AlreadyReviewed {
                movie_id: review.movie_id,
            }
            .into());
        }
        reviews.push(review.clone());
        Ok(review)
    }

    async fn for_movie(&self, movie_id: &MovieId) -> CatalogResult<Vec<ReviewRecord>> {
        self.select(|r| &r.movie_id == movie_id)
    }

    async fn for_user(&self, user_id: &Uuid) -> CatalogResult<Vec<ReviewRecord>> {
        self.select(|r| &r.user_id == user_id)
    }

    async fn delete_for_movie(&self, movie_id: &MovieId) -> CatalogResult<u64> {
        let mut reviews = self.reviews.write().map_err(lock_error)?;
        let before = reviews.len();
        reviews.retain(|r| &r.movie_id != movie_id);
        Ok((before - reviews.len()) as u64)
    }
}
