//! Movie records and the authoring payload used to create or replace them

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{FieldValidationError, RequestError};

/// Earliest release year accepted when authoring a movie
pub const MIN_RELEASE_YEAR: i32 = 1900;

/// Lowest and highest allowed rating
pub const RATING_RANGE: (f64, f64) = (0.0, 10.0);

/// Opaque movie identifier assigned by the backend
///
/// Catalogs seeded from static data use integers, movies authored through the
/// API get a time-ordered UUIDv7 string, and documents created by other tools
/// may carry arbitrary strings. Integers order before strings; integers order
/// numerically and strings lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MovieId {
    Numeric(u64),
    Text(String),
}

impl MovieId {
    /// Generate an identifier for a newly authored movie
    pub fn generate() -> Self {
        MovieId::Text(Uuid::now_v7().to_string())
    }

    /// Interpret a raw path segment: all-digit segments are numeric ids
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if raw.bytes().all(|b| b.is_ascii_digit()) {
            raw.parse().ok().map(MovieId::Numeric)
        } else {
            Some(MovieId::Text(raw.to_string()))
        }
    }
}

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovieId::Numeric(n) => write!(f, "{}", n),
            MovieId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for MovieId {
    fn from(n: u64) -> Self {
        MovieId::Numeric(n)
    }
}

impl From<&str> for MovieId {
    fn from(s: &str) -> Self {
        MovieId::Text(s.to_string())
    }
}

/// A catalog item
///
/// `release_year` and `release_date` are two views of the same fact: when a
/// full date is present its year is the normalized release year. Stores call
/// [`MovieRecord::normalized`] before persisting so both agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRecord {
    pub id: MovieId,
    pub title: String,
    #[serde(default, alias = "overview")]
    pub description: String,
    #[serde(default)]
    pub release_year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    #[serde(alias = "genres")]
    pub genre: Vec<String>,
    #[serde(default)]
    pub director: String,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(default)]
    pub rating: f64,
    /// Mean of the ratings in this movie's reviews, 0 without reviews
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MovieRecord {
    /// Create a record with the attributes every query touches
    pub fn new(
        id: impl Into<MovieId>,
        title: impl Into<String>,
        release_year: i32,
        genre: Vec<String>,
        rating: f64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            release_year,
            release_date: None,
            genre,
            director: String::new(),
            cast: Vec::new(),
            rating,
            average_rating: 0.0,
            review_count: 0,
            runtime: None,
            poster_url: None,
            backdrop_url: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_release_date(mut self, date: NaiveDate) -> Self {
        self.release_date = Some(date);
        self.release_year = date.year();
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_director(mut self, director: impl Into<String>) -> Self {
        self.director = director.into();
        self
    }

    /// The year used for filtering and facets
    pub fn normalized_year(&self) -> i32 {
        self.release_date
            .map(|d| d.year())
            .unwrap_or(self.release_year)
    }

    /// Key for release ordering: year first, then the full date when known
    pub fn release_key(&self) -> (i32, Option<NaiveDate>) {
        (self.normalized_year(), self.release_date)
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        self.genre.iter().any(|g| g == genre)
    }

    /// Bring the record into its canonical stored shape
    ///
    /// Duplicate genres are collapsed (first occurrence wins) and the release
    /// year is taken from the release date when one is set.
    pub fn normalized(mut self) -> Self {
        let mut seen = std::collections::HashSet::new();
        self.genre.retain(|g| seen.insert(g.clone()));
        self.release_year = self.normalized_year();
        self
    }
}

/// Payload for creating or replacing a movie
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MovieInput {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,

    #[serde(alias = "overview")]
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,

    pub release_year: i32,

    #[serde(default)]
    pub release_date: Option<NaiveDate>,

    #[serde(alias = "genres")]
    #[validate(length(min = 1, message = "at least one genre is required"))]
    pub genre: Vec<String>,

    #[validate(length(min = 1, message = "director is required"))]
    pub director: String,

    #[serde(default)]
    pub cast: Vec<String>,

    #[serde(default)]
    #[validate(range(min = 0.0, max = 10.0, message = "rating must be between 0 and 10"))]
    pub rating: Option<f64>,

    #[serde(default)]
    pub runtime: Option<u32>,

    #[serde(default)]
    #[validate(url(message = "posterUrl must be a valid URL"))]
    pub poster_url: Option<String>,

    #[serde(default)]
    #[validate(url(message = "backdropUrl must be a valid URL"))]
    pub backdrop_url: Option<String>,
}

impl MovieInput {
    /// Trim text fields, then validate the payload
    pub fn validated(mut self) -> Result<Self, RequestError> {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
        self.director = self.director.trim().to_string();
        for g in &mut self.genre {
            *g = g.trim().to_string();
        }
        for member in &mut self.cast {
            *member = member.trim().to_string();
        }

        let mut errors = match self.validate() {
            Ok(()) => Vec::new(),
            Err(e) => match RequestError::from(e) {
                RequestError::Validation(fields) => fields,
                other => return Err(other),
            },
        };

        let current_year = Utc::now().year();
        if !(MIN_RELEASE_YEAR..=current_year).contains(&self.release_year) {
            errors.push(FieldValidationError {
                field: "release_year".to_string(),
                message: format!(
                    "releaseYear must be between {} and {}",
                    MIN_RELEASE_YEAR, current_year
                ),
            });
        }
        if let Some(date) = self.release_date
            && date.year() != self.release_year
        {
            errors.push(FieldValidationError {
                field: "release_date".to_string(),
                message: "releaseDate must fall in releaseYear".to_string(),
            });
        }
        if self.genre.iter().any(|g| g.is_empty()) {
            errors.push(FieldValidationError {
                field: "genre".to_string(),
                message: "genres must not be blank".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(self)
        } else {
            Err(RequestError::Validation(errors))
        }
    }

    /// Build a new record from a validated payload
    pub fn into_record(self, id: MovieId, now: DateTime<Utc>) -> MovieRecord {
        let mut record = MovieRecord::new(id, "", 0, Vec::new(), 0.0);
        record.created_at = Some(now);
        self.apply_to(record, now)
    }

    /// Replace the authored fields of `existing`, keeping identity and creation time
    pub fn apply_to(self, existing: MovieRecord, now: DateTime<Utc>) -> MovieRecord {
        MovieRecord {
            id: existing.id,
            title: self.title,
            description: self.description,
            release_year: self.release_year,
            release_date: self.release_date,
            genre: self.genre,
            director: self.director,
            cast: self.cast,
            rating: self.rating.unwrap_or(RATING_RANGE.0),
            average_rating: existing.average_rating,
            review_count: existing.review_count,
            runtime: self.runtime,
            poster_url: self.poster_url,
            backdrop_url: self.backdrop_url,
            created_at: existing.created_at.or(Some(now)),
            updated_at: Some(now),
        }
        .normalized()
    }
}
