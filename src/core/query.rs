//! Typed list queries: filters, sort key and pagination window
//!
//! A [`QuerySpec`] is the backend-independent description of one list request.
//! It is either parsed from raw query-string parameters ([`QueryParams`]) or
//! built programmatically by an in-memory caller, and consumed by both the
//! in-memory evaluator and the store-backed translation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::QueryError;
use crate::core::movie::RATING_RANGE;

/// Marker meaning "no constraint" for the genre, year and rating filters
pub const ALL: &str = "all";

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_MAX_PAGE_SIZE: usize = 100;

/// Raw list parameters as they arrive in the query string
///
/// Everything stays a string here; [`QuerySpec::from_params`] is the single
/// place where values are interpreted.
///
/// # Example
/// ```rust,ignore
/// // GET /movies?genre=Drama&year=2020&rating=7&sort=rating&page=2&limit=5
/// pub async fn list_movies(Query(params): Query<QueryParams>) -> ... {
///     let spec = QuerySpec::from_params(&params, &limits)?;
/// }
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryParams {
    /// Single genre, or `all`
    pub genre: Option<String>,

    /// Release year, or `all`
    pub year: Option<String>,

    /// Minimum rating (inclusive), or `all`
    #[serde(alias = "minRating")]
    pub rating: Option<String>,

    /// Sort key wire name, see [`SortKey::parse`]
    #[serde(alias = "sortBy")]
    pub sort: Option<String>,

    /// Page number (starts at 1)
    pub page: Option<String>,

    /// Items per page
    pub limit: Option<String>,

    /// Items per page (alternate spelling of `limit`)
    pub page_size: Option<String>,
}

/// Page size bounds applied while parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationLimits {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for PaginationLimits {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

/// Ordering applied to the filtered set before pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Newest creation timestamp first
    #[default]
    Recency,
    /// Highest rating first
    RatingDesc,
    /// Most recent release first
    YearDesc,
    /// Title ascending under English collation, ignoring case
    TitleAlpha,
    /// Ascending identifier
    ///
    /// Stand-in for popularity: the catalog has no real popularity signal, so
    /// identifier order (creation order for generated ids) is used instead.
    Identifier,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::Recency,
        SortKey::RatingDesc,
        SortKey::YearDesc,
        SortKey::TitleAlpha,
        SortKey::Identifier,
    ];

    /// Map a wire name to a sort key
    ///
    /// Both the server-side names (`rating`, `year`) and the client-side ones
    /// (`releaseDate`, `title`, `popularity`) are accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "recency" | "newest" | "createdAt" => Some(SortKey::Recency),
            "rating" => Some(SortKey::RatingDesc),
            "year" | "releaseDate" => Some(SortKey::YearDesc),
            "title" => Some(SortKey::TitleAlpha),
            "popularity" | "id" => Some(SortKey::Identifier),
            _ => None,
        }
    }

    /// Canonical wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Recency => "recency",
            SortKey::RatingDesc => "rating",
            SortKey::YearDesc => "year",
            SortKey::TitleAlpha => "title",
            SortKey::Identifier => "popularity",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::parse(s.trim()).ok_or_else(|| {
            QueryError::invalid(
                "sort",
                s,
                "expected one of recency, rating, year, title, popularity",
            )
        })
    }
}

/// Typed, validated list query
///
/// `None` filters mean "no constraint". `page` and `page_size` are always at
/// least 1.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    genre: Option<String>,
    year: Option<i32>,
    min_rating: Option<f64>,
    sort: SortKey,
    page: usize,
    page_size: usize,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            genre: None,
            year: None,
            min_rating: None,
            sort: SortKey::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate raw request parameters
    pub fn from_params(params: &QueryParams, limits: &PaginationLimits) -> Result<Self, QueryError> {
        let genre = constraint(&params.genre).map(str::to_string);

        let year = constraint(&params.year).map(parse_year).transpose()?;

        let min_rating = constraint(&params.rating)
            .map(parse_min_rating)
            .transpose()?;

        let sort = match params.sort.as_deref().map(str::trim) {
            None | Some("") => SortKey::default(),
            Some(raw) => raw.parse()?,
        };

        let page = match &params.page {
            None => 1,
            Some(raw) => parse_positive("page", raw)?,
        };

        let page_size = match (&params.limit, &params.page_size) {
            (None, None) => limits.default_page_size,
            (Some(raw), None) => parse_positive("limit", raw)?,
            (None, Some(raw)) => parse_positive("pageSize", raw)?,
            (Some(limit), Some(page_size)) => {
                let a = parse_positive("limit", limit)?;
                let b = parse_positive("pageSize", page_size)?;
                if a != b {
                    return Err(QueryError::invalid(
                        "pageSize",
                        page_size.as_str(),
                        "conflicts with limit",
                    ));
                }
                a
            }
        };
        if page_size > limits.max_page_size {
            return Err(QueryError::invalid(
                "limit",
                page_size.to_string(),
                format!("must not exceed {}", limits.max_page_size),
            ));
        }

        Ok(Self {
            genre,
            year,
            min_rating,
            sort,
            page,
            page_size,
        })
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Set the minimum rating; fails outside [0, 10]
    pub fn with_min_rating(mut self, min_rating: f64) -> Result<Self, QueryError> {
        if !rating_in_range(min_rating) {
            return Err(QueryError::invalid(
                "rating",
                min_rating.to_string(),
                "must be between 0 and 10",
            ));
        }
        self.min_rating = Some(min_rating);
        Ok(self)
    }

    pub fn sorted_by(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    /// Select a pagination window; both values must be at least 1
    pub fn with_page(mut self, page: usize, page_size: usize) -> Result<Self, QueryError> {
        if page == 0 {
            return Err(QueryError::invalid("page", "0", "must be at least 1"));
        }
        if page_size == 0 {
            return Err(QueryError::invalid("pageSize", "0", "must be at least 1"));
        }
        self.page = page;
        self.page_size = page_size;
        Ok(self)
    }

    pub fn genre(&self) -> Option<&str> {
        self.genre.as_deref()
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn min_rating(&self) -> Option<f64> {
        self.min_rating
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of matching items that precede the requested page
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// True when no filter constrains the result
    pub fn is_unfiltered(&self) -> bool {
        self.genre.is_none() && self.year.is_none() && self.min_rating.is_none()
    }
}

fn constraint(raw: &Option<String>) -> Option<&str> {
    let value = raw.as_deref()?.trim();
    if value.is_empty() || value.eq_ignore_ascii_case(ALL) {
        None
    } else {
        Some(value)
    }
}

fn parse_positive(parameter: &str, raw: &str) -> Result<usize, QueryError> {
    let value: usize = raw
        .trim()
        .parse()
        .map_err(|_| QueryError::invalid(parameter, raw, "must be a positive integer"))?;
    if value == 0 {
        return Err(QueryError::invalid(parameter, raw, "must be at least 1"));
    }
    Ok(value)
}

/// Years are plain digits without a sign or leading zeros
fn parse_year(raw: &str) -> Result<i32, QueryError> {
    let invalid = || QueryError::invalid("year", raw, "must be a year like 2020");
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let year: i32 = raw.parse().map_err(|_| invalid())?;
    if year.to_string() != raw {
        return Err(invalid());
    }
    Ok(year)
}

fn parse_min_rating(raw: &str) -> Result<f64, QueryError> {
    let value: f64 = raw
        .parse()
        .map_err(|_| QueryError::invalid("rating", raw, "must be a number"))?;
    if !rating_in_range(value) {
        return Err(QueryError::invalid("rating", raw, "must be between 0 and 10"));
    }
    Ok(value)
}

fn rating_in_range(value: f64) -> bool {
    value.is_finite() && (RATING_RANGE.0..=RATING_RANGE.1).contains(&value)
}

/// Number of pages needed for `total` items; zero items means zero pages
pub fn total_pages(total: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    if total == 0 { 0 } else { total.div_ceil(page_size) }
}

/// One page of a filtered, sorted collection plus totals
///
/// Serializes to the list endpoint body:
/// `{ items, totalPages, currentPage, totalMatching, pageSize }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPage<T> {
    pub items: Vec<T>,
    pub total_pages: usize,
    pub current_page: usize,
    pub total_matching: usize,
    pub page_size: usize,
}

impl<T> ResultPage<T> {
    pub fn new(items: Vec<T>, total_matching: usize, spec: &QuerySpec) -> Self {
        Self {
            items,
            total_pages: total_pages(total_matching, spec.page_size()),
            current_page: spec.page(),
            total_matching,
            page_size: spec.page_size(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }
}
