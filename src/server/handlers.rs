//! HTTP handlers for the catalog
//!
//! Handlers only translate between HTTP and the stores: parameters are parsed
//! into typed values, authorization is checked, and every failure is a
//! [`CatalogError`] rendered by its `IntoResponse` impl.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::core::auth::{AuthContext, AuthPolicy};
use crate::core::error::{
    CatalogError, CatalogResult, FieldValidationError, MovieError, QueryError, RequestError,
    UserError,
};
use crate::core::facets::FacetSet;
use crate::core::movie::{MovieId, MovieInput, MovieRecord};
use crate::core::query::{PaginationLimits, QueryParams, QuerySpec, ResultPage};
use crate::core::review::{RatingSummary, ReviewInput, ReviewRecord};
use crate::core::service::{MovieStore, ReviewStore, UserStore};
use crate::core::user::{ProfileInput, UserRecord};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub movies: Arc<dyn MovieStore>,
    pub users: Arc<dyn UserStore>,
    pub reviews: Arc<dyn ReviewStore>,
    pub limits: PaginationLimits,
}

impl AppState {
    pub fn new(
        movies: Arc<dyn MovieStore>,
        users: Arc<dyn UserStore>,
        reviews: Arc<dyn ReviewStore>,
        limits: PaginationLimits,
    ) -> Self {
        Self {
            movies,
            users,
            reviews,
            limits,
        }
    }

    async fn require_movie(&self, id: &MovieId) -> CatalogResult<MovieRecord> {
        self.movies
            .get(id)
            .await?
            .ok_or_else(|| MovieError::NotFound { id: id.clone() }.into())
    }

    async fn require_user(&self, id: &uuid::Uuid) -> CatalogResult<UserRecord> {
        self.users
            .get(id)
            .await?
            .ok_or_else(|| UserError::NotFound { user_id: *id }.into())
    }
}

/// Response body for a newly posted review
#[derive(Debug, Serialize)]
pub struct ReviewCreated {
    pub review: ReviewRecord,
    pub movie: RatingSummary,
}

/// Response body for favorites mutations
#[derive(Debug, Serialize)]
pub struct FavoritesResponse {
    pub message: &'static str,
    pub favorites: Vec<MovieId>,
}

fn parse_movie_id(raw: &str) -> Result<MovieId, RequestError> {
    MovieId::parse(raw).ok_or_else(|| RequestError::InvalidMovieId {
        id: raw.to_string(),
    })
}

fn body_error(rejection: JsonRejection) -> CatalogError {
    RequestError::Validation(vec![FieldValidationError {
        field: "body".to_string(),
        message: rejection.body_text(),
    }])
    .into()
}

/// GET /movies
pub async fn list_movies(
    State(state): State<AppState>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> CatalogResult<Json<ResultPage<MovieRecord>>> {
    let Query(params) =
        params.map_err(|r| QueryError::invalid("query", "", r.body_text()))?;
    let spec = QuerySpec::from_params(&params, &state.limits)?;
    let page = state.movies.query(&spec).await?;
    Ok(Json(page))
}

/// GET /movies/facets
pub async fn movie_facets(State(state): State<AppState>) -> CatalogResult<Json<FacetSet>> {
    Ok(Json(state.movies.facets().await?))
}

/// GET /movies/{id}
pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> CatalogResult<Json<MovieRecord>> {
    let id = parse_movie_id(&id)?;
    Ok(Json(state.require_movie(&id).await?))
}

/// POST /movies (admin)
pub async fn create_movie(
    State(state): State<AppState>,
    auth: AuthContext,
    body: Result<Json<MovieInput>, JsonRejection>,
) -> CatalogResult<(StatusCode, Json<MovieRecord>)> {
    AuthPolicy::AdminOnly.authorize(&auth)?;
    let Json(input) = body.map_err(body_error)?;
    let input = input.validated()?;

    let movie = input.into_record(MovieId::generate(), Utc::now());
    let created = state.movies.create(movie).await?;
    tracing::info!(id = %created.id, title = %created.title, "movie created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /movies/{id} (admin)
pub async fn update_movie(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    body: Result<Json<MovieInput>, JsonRejection>,
) -> CatalogResult<Json<MovieRecord>> {
    AuthPolicy::AdminOnly.authorize(&auth)?;
    let id = parse_movie_id(&id)?;
    let Json(input) = body.map_err(body_error)?;
    let input = input.validated()?;

    let existing = state.require_movie(&id).await?;
    let updated = state
        .movies
        .update(&id, input.apply_to(existing, Utc::now()))
        .await?;
    tracing::info!(id = %updated.id, "movie updated");
    Ok(Json(updated))
}

/// DELETE /movies/{id} (admin)
pub async fn delete_movie(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> CatalogResult<Json<Value>> {
    AuthPolicy::AdminOnly.authorize(&auth)?;
    let id = parse_movie_id(&id)?;
    state.movies.delete(&id).await?;
    let reviews = state.reviews.delete_for_movie(&id).await?;
    tracing::info!(%id, reviews, "movie deleted");
    Ok(Json(json!({ "message": "Movie deleted successfully" })))
}

/// GET /movies/{id}/reviews
pub async fn list_movie_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> CatalogResult<Json<Vec<ReviewRecord>>> {
    let id = parse_movie_id(&id)?;
    state.require_movie(&id).await?;
    Ok(Json(state.reviews.for_movie(&id).await?))
}

/// POST /movies/{id}/reviews
///
/// Stores the review, then recomputes the movie's average rating and review
/// count from all of its reviews.
pub async fn create_review(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    body: Result<Json<ReviewInput>, JsonRejection>,
) -> CatalogResult<(StatusCode, Json<ReviewCreated>)> {
    let user_id = auth.require_user()?;
    let id = parse_movie_id(&id)?;
    let Json(input) = body.map_err(body_error)?;
    let input = input.validated()?;

    let author = state.require_user(&user_id).await?;
    state.require_movie(&id).await?;
    let review = state
        .reviews
        .create(input.into_record(id.clone(), &author, Utc::now()))
        .await?;

    let summary = RatingSummary::of(&state.reviews.for_movie(&id).await?);
    state.movies.set_rating_summary(&id, summary).await?;
    tracing::info!(
        movie_id = %id,
        %user_id,
        average_rating = summary.average_rating,
        review_count = summary.review_count,
        "review posted"
    );
    Ok((
        StatusCode::CREATED,
        Json(ReviewCreated {
            review,
            movie: summary,
        }),
    ))
}

/// POST /movies/{id}/favorite
pub async fn add_favorite(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> CatalogResult<Json<FavoritesResponse>> {
    let user_id = auth.require_user()?;
    let id = parse_movie_id(&id)?;
    state.require_movie(&id).await?;

    let user = state.users.add_favorite(&user_id, id).await?;
    Ok(Json(FavoritesResponse {
        message: "Added to favorites",
        favorites: user.favorites,
    }))
}

/// DELETE /movies/{id}/favorite
pub async fn remove_favorite(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> CatalogResult<Json<FavoritesResponse>> {
    let user_id = auth.require_user()?;
    let id = parse_movie_id(&id)?;

    let user = state.users.remove_favorite(&user_id, &id).await?;
    Ok(Json(FavoritesResponse {
        message: "Removed from favorites",
        favorites: user.favorites,
    }))
}

/// GET /users/favorites
///
/// Favorites whose movie has since been deleted are skipped.
pub async fn list_favorites(
    State(state): State<AppState>,
    auth: AuthContext,
) -> CatalogResult<Json<Vec<MovieRecord>>> {
    let user_id = auth.require_user()?;
    let user = state.require_user(&user_id).await?;
    Ok(Json(state.movies.get_many(&user.favorites).await?))
}

/// GET /users/reviews
pub async fn list_user_reviews(
    State(state): State<AppState>,
    auth: AuthContext,
) -> CatalogResult<Json<Vec<ReviewRecord>>> {
    let user_id = auth.require_user()?;
    state.require_user(&user_id).await?;
    Ok(Json(state.reviews.for_user(&user_id).await?))
}

/// GET /users/profile
pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthContext,
) -> CatalogResult<Json<UserRecord>> {
    let user_id = auth.require_user()?;
    Ok(Json(state.require_user(&user_id).await?))
}

/// PUT /users/profile
pub async fn put_profile(
    State(state): State<AppState>,
    auth: AuthContext,
    body: Result<Json<ProfileInput>, JsonRejection>,
) -> CatalogResult<Json<UserRecord>> {
    let user_id = auth.require_user()?;
    let Json(input) = body.map_err(body_error)?;
    let input = input.validated()?;

    let existing = state.users.get(&user_id).await?;
    if existing.is_none() {
        tracing::info!(%user_id, "creating user profile");
    }
    let saved = state.users.save(input.upsert(user_id, existing)).await?;
    Ok(Json(saved))
}
