//! Router builder utilities for catalog routes

use axum::Router;
use axum::routing::{get, post};

use super::handlers::{
    AppState, add_favorite, create_movie, create_review, delete_movie, get_movie, get_profile,
    list_favorites, list_movie_reviews, list_movies, list_user_reviews, movie_facets, put_profile,
    remove_favorite, update_movie,
};

/// Build catalog routes
///
/// - GET /movies - Filtered, sorted, paginated list
/// - GET /movies/facets - Available genres and years
/// - POST /movies - Create a movie (admin)
/// - GET|PUT|DELETE /movies/{id} - Read, replace (admin), delete (admin)
/// - POST|DELETE /movies/{id}/favorite - Add to or remove from favorites
/// - GET|POST /movies/{id}/reviews - A movie's reviews, post a review
/// - GET /users/favorites - The caller's favorite movies
/// - GET /users/reviews - The caller's reviews
/// - GET|PUT /users/profile - The caller's profile
pub fn build_catalog_routes(state: AppState) -> Router {
    Router::new()
        .route("/movies", get(list_movies).post(create_movie))
        .route("/movies/facets", get(movie_facets))
        .route(
            "/movies/{id}",
            get(get_movie).put(update_movie).delete(delete_movie),
        )
        .route(
            "/movies/{id}/favorite",
            post(add_favorite).delete(remove_favorite),
        )
        .route(
            "/movies/{id}/reviews",
            get(list_movie_reviews).post(create_review),
        )
        .route("/users/favorites", get(list_favorites))
        .route("/users/reviews", get(list_user_reviews))
        .route("/users/profile", get(get_profile).put(put_profile))
        .with_state(state)
}
