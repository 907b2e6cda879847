//! # Marquee
//!
//! A movie catalog service built around one query core shared by two
//! execution modes.
//!
//! ## Features
//!
//! - **Typed queries**: raw query-string parameters are parsed once into a
//!   validated [`QuerySpec`](core::QuerySpec) (genre, year, minimum rating,
//!   sort key, page window)
//! - **Pure evaluation**: [`derive_view`](core::derive_view) and
//!   [`derive_facets`](core::derive_facets) work over any slice of records
//! - **Store-backed mode**: the MongoDB store translates the same `QuerySpec` into
//!   native filter/sort documents (feature `mongodb_backend`)
//! - **REST API**: listing, facets, admin authoring, favorites, reviews and
//!   profiles
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use marquee::prelude::*;
//!
//! let movies = vec![
//!     MovieRecord::new(1u64, "Heat", 1995, vec!["Crime".into()], 8.3),
//!     MovieRecord::new(2u64, "Arrival", 2016, vec!["Sci-Fi".into()], 7.9),
//! ];
//!
//! let spec = QuerySpec::new()
//!     .with_min_rating(8.0)?
//!     .sorted_by(SortKey::RatingDesc)
//!     .with_page(1, 10)?;
//!
//! let page = derive_view(&movies, &spec);
//! assert_eq!(page.total_matching, 1);
//!
//! let facets = derive_facets(&movies);
//! assert_eq!(facets.available_years, vec!["2016", "1995"]);
//! ```

pub mod config;
pub mod core;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Types ===
    pub use crate::core::{
        auth::{AuthContext, AuthPolicy},
        error::{CatalogError, CatalogResult, QueryError},
        evaluator::derive_view,
        facets::{FacetSet, derive_facets},
        movie::{MovieId, MovieInput, MovieRecord},
        query::{PaginationLimits, QueryParams, QuerySpec, ResultPage, SortKey},
        review::{RatingSummary, ReviewInput, ReviewRecord},
        service::{MovieStore, ReviewStore, UserStore},
        user::{ProfileInput, UserRecord},
    };

    // === Configuration ===
    pub use crate::config::{CatalogConfig, StorageConfig};

    // === Server ===
    pub use crate::server::{AppState, ServerBuilder, exposure::RestExposure};

    // === Storage ===
    pub use crate::storage::{InMemoryMovieStore, InMemoryReviewStore, InMemoryUserStore};
    #[cfg(feature = "mongodb_backend")]
    pub use crate::storage::{MongoMovieStore, MongoReviewStore, MongoUserStore};
}
