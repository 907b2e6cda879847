//! Core module containing the catalog model, the query core and store traits

pub mod auth;
pub mod collation;
pub mod error;
pub mod evaluator;
pub mod facets;
pub mod movie;
pub mod query;
pub mod review;
pub mod service;
pub mod user;

pub use auth::{AuthContext, AuthPolicy};
pub use error::{CatalogError, CatalogResult};
pub use evaluator::derive_view;
pub use facets::{FacetSet, derive_facets};
pub use movie::{MovieId, MovieInput, MovieRecord};
pub use query::{PaginationLimits, QueryParams, QuerySpec, ResultPage, SortKey};
pub use review::{RatingSummary, ReviewInput, ReviewRecord};
pub use service::{MovieStore, ReviewStore, UserStore};
pub use user::{ProfileInput, UserRecord};
