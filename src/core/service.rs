//! Store traits for movies, users and reviews

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::CatalogResult;
use crate::core::facets::FacetSet;
use crate::core::movie::{MovieId, MovieRecord};
use crate::core::query::{QuerySpec, ResultPage};
use crate::core::review::{RatingSummary, ReviewRecord};
use crate::core::user::UserRecord;

/// Persistence for the movie catalog
///
/// Implementations must answer [`MovieStore::query`] exactly as
/// [`derive_view`](crate::core::evaluator::derive_view) would over the store's
/// contents in insertion order. Replacing a movie keeps its position.
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// Persist a new movie
    async fn create(&self, movie: MovieRecord) -> CatalogResult<MovieRecord>;

    /// Get a movie by ID
    async fn get(&self, id: &MovieId) -> CatalogResult<Option<MovieRecord>>;

    /// Fetch several movies, in the order of `ids`, skipping unknown ones
    async fn get_many(&self, ids: &[MovieId]) -> CatalogResult<Vec<MovieRecord>>;

    /// List all movies in insertion order
    async fn list(&self) -> CatalogResult<Vec<MovieRecord>>;

    /// Replace an existing movie; `MovieError::NotFound` when absent
    async fn update(&self, id: &MovieId, movie: MovieRecord) -> CatalogResult<MovieRecord>;

    /// Delete a movie; `MovieError::NotFound` when absent
    async fn delete(&self, id: &MovieId) -> CatalogResult<()>;

    /// Overwrite the review summary of a movie; `MovieError::NotFound` when absent
    async fn set_rating_summary(
        &self,
        id: &MovieId,
        summary: RatingSummary,
    ) -> CatalogResult<MovieRecord>;

    /// Filter, sort and paginate the catalog
    async fn query(&self, spec: &QuerySpec) -> CatalogResult<ResultPage<MovieRecord>>;

    /// Distinct genres and years over the whole catalog
    async fn facets(&self) -> CatalogResult<FacetSet>;
}

/// Persistence for user profiles and favorites
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Get a user by ID
    async fn get(&self, id: &Uuid) -> CatalogResult<Option<UserRecord>>;

    /// Insert or replace a user record
    async fn save(&self, user: UserRecord) -> CatalogResult<UserRecord>;

    /// Add a movie to the user's favorites
    ///
    /// Fails with `FavoriteError::AlreadyFavorited` when it is already there
    /// and `UserError::NotFound` for unknown users.
    async fn add_favorite(&self, user_id: &Uuid, movie_id: MovieId) -> CatalogResult<UserRecord>;

    /// Remove a movie from the user's favorites; absent movies are a no-op
    async fn remove_favorite(&self, user_id: &Uuid, movie_id: &MovieId)
    -> CatalogResult<UserRecord>;
}

/// Persistence for movie reviews
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Persist a review; `ReviewError::AlreadyReviewed` when the author has
    /// already reviewed the movie
    async fn create(&self, review: ReviewRecord) -> CatalogResult<ReviewRecord>;

    /// Reviews of one movie, oldest first
    async fn for_movie(&self, movie_id: &MovieId) -> CatalogResult<Vec<ReviewRecord>>;

    /// Reviews written by one user, oldest first
    async fn for_user(&self, user_id: &Uuid) -> CatalogResult<Vec<ReviewRecord>>;

    /// Drop every review of a movie, returning how many were removed
    async fn delete_for_movie(&self, movie_id: &MovieId) -> CatalogResult<u64>;
}
