//! Shared test harness for catalog store and REST testing
//!
//! Provides fixture builders for movies, reviews and caller headers, plus the
//! `movie_store_tests!`, `user_store_tests!`, `review_store_tests!` and
//! `rest_api_tests!` macros that validate any backend against the store
//! contracts.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod catalog_harness;
//! use catalog_harness::*;
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod rest_tests;
#[macro_use]
pub mod user_store_tests;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

use marquee::core::movie::{MovieId, MovieRecord};
use marquee::core::review::ReviewRecord;

// ---------------------------------------------------------------------------
// Movie fixtures
// ---------------------------------------------------------------------------

/// A movie with the attributes every query touches
pub fn movie(id: u64, title: &str, year: i32, genres: &[&str], rating: f64) -> MovieRecord {
    MovieRecord::new(
        id,
        title,
        year,
        genres.iter().map(|g| g.to_string()).collect(),
        rating,
    )
}

/// Midnight UTC on the given day of January 2024
pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Twelve movies: ids 1-9 are Drama, 10-12 Comedy
///
/// Exactly five have a rating of at least 7: ids 1 (9.1), 3 (8.4), 10 (8.0),
/// 8 (7.7) and 5 (7.0), in descending rating order.
pub fn scenario_catalog() -> Vec<MovieRecord> {
    let ratings = [9.1, 6.0, 8.4, 5.5, 7.0, 3.2, 6.9, 7.7, 4.0, 8.0, 2.5, 6.5];
    let titles = [
        "Amber", "Birch", "Cedar", "Dune", "Ember", "Fjord", "Grove", "Harbor", "Inlet",
        "Juniper", "Kestrel", "Lagoon",
    ];
    ratings
        .iter()
        .zip(titles)
        .enumerate()
        .map(|(i, (rating, title))| {
            let id = i as u64 + 1;
            let genre = if id <= 9 { "Drama" } else { "Comedy" };
            movie(id, title, 2000 + (id as i32 % 4), &[genre], *rating)
        })
        .collect()
}

/// A catalog exercising every sort key's edge cases
///
/// Mixed-case titles, shared ratings, release dates within one year, and
/// creation timestamps on only some records.
pub fn varied_catalog() -> Vec<MovieRecord> {
    vec![
        movie(1, "zodiac", 2007, &["Crime", "Drama"], 7.7).with_created_at(day(3)),
        movie(2, "Alien", 1979, &["Horror", "Sci-Fi"], 8.5),
        movie(3, "amelie", 2001, &["Comedy", "Romance"], 8.3).with_created_at(day(9)),
        movie(4, "Heat", 0, &["Crime"], 8.3).with_release_date(date(1995, 12, 15)),
        movie(5, "Casino", 0, &["Crime", "Drama"], 8.2).with_release_date(date(1995, 11, 22)),
        movie(6, "Seven", 1995, &["Crime", "Mystery"], 8.6).with_created_at(day(1)),
        movie(7, "Brazil", 1985, &["Sci-Fi"], 7.9),
        movie(8, "Memento", 2000, &["Mystery", "Thriller"], 8.4).with_created_at(day(9)),
    ]
}

/// Movies identical in every sorted attribute, created in the order of `raw`
pub fn numbered(raw: &[u64]) -> Vec<MovieRecord> {
    raw.iter()
        .map(|&id| movie(id, "Same", 2001, &["Drama"], 6.0))
        .collect()
}

pub fn ids(movies: &[MovieRecord]) -> Vec<MovieId> {
    movies.iter().map(|m| m.id.clone()).collect()
}

pub fn numeric_ids(raw: &[u64]) -> Vec<MovieId> {
    raw.iter().copied().map(MovieId::Numeric).collect()
}

/// A review of `movie_id` by `user_id`, written at `at`
pub fn review(
    movie_id: impl Into<MovieId>,
    user_id: Uuid,
    rating: f64,
    at: DateTime<Utc>,
) -> ReviewRecord {
    ReviewRecord {
        id: Uuid::now_v7(),
        movie_id: movie_id.into(),
        user_id,
        username: "critic".to_string(),
        rating,
        comment: "Worth a watch".to_string(),
        created_at: at,
    }
}

// ---------------------------------------------------------------------------
// REST fixtures
// ---------------------------------------------------------------------------

/// A valid authoring payload
pub fn movie_input(title: &str) -> Value {
    json!({
        "title": title,
        "description": "A film",
        "releaseYear": 1999,
        "genre": ["Drama"],
        "director": "Someone",
        "rating": 7.5
    })
}

/// Headers identifying an admin caller
pub fn admin() -> (Uuid, String) {
    (Uuid::new_v4(), "admin".to_string())
}

/// Headers identifying a regular caller
pub fn viewer() -> (Uuid, String) {
    (Uuid::new_v4(), "viewer".to_string())
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// Create every movie in order and return the records as stored
pub async fn seed<S: marquee::core::service::MovieStore + ?Sized>(
    store: &S,
    movies: Vec<MovieRecord>,
) -> Vec<MovieRecord> {
    let mut stored = Vec::with_capacity(movies.len());
    for movie in movies {
        stored.push(store.create(movie).await.expect("seed create failed"));
    }
    stored
}
