//! MongoDB storage backend using the official MongoDB async driver.
//!
//! Provides `MongoMovieStore`, `MongoUserStore` and `MongoReviewStore` backed
//! by a `mongodb::Database`.
//!
//! # Feature flag
//!
//! This module is gated behind the `mongodb_backend` feature flag:
//! ```toml
//! [dependencies]
//! marquee = { version = "0.1", features = ["mongodb_backend"] }
//! ```
//!
//! # Storage model
//!
//! Movies live in the `movies` collection, users in `users` and reviews in
//! `reviews`. Records are serialized via `serde_json::Value` as an
//! intermediate format, then converted to BSON documents with `id` mapped to
//! `_id`. Timestamps are stored as BSON dates so that recency sorts compare
//! instants rather than strings.
//!
//! Every movie document also carries `insertSeq`, drawn from a counter in the
//! `counters` collection when the movie is created and kept across updates.
//! It is the collection order: `list` follows it and every sort falls back to
//! it. Documents written by other tools have no `insertSeq` and come first,
//! ordered by `_id`.
//!
//! # Query translation
//!
//! A [`QuerySpec`] becomes a filter document, a sort document ending with
//! `insertSeq` then `_id` ascending, and skip/limit. The page and the matching
//! count are read concurrently; the two reads are not snapshot-consistent
//! with each other.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, Bson, Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{Collation, CollationStrength, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use uuid::Uuid;

use crate::core::error::{
    CatalogResult, FavoriteError, MovieError, ReviewError, StorageError, UserError,
};
use crate::core::facets::FacetSet;
use crate::core::movie::{MovieId, MovieRecord};
use crate::core::query::{QuerySpec, ResultPage, SortKey};
use crate::core::review::{RatingSummary, ReviewRecord};
use crate::core::service::{MovieStore, ReviewStore, UserStore};
use crate::core::user::UserRecord;

const BACKEND: &str = "MongoDB";
const MOVIES: &str = "movies";
const USERS: &str = "users";
const REVIEWS: &str = "reviews";
const COUNTERS: &str = "counters";
const INSERT_SEQ: &str = "insertSeq";
const TIMESTAMP_FIELDS: [&str; 2] = ["createdAt", "updatedAt"];
const DUPLICATE_KEY: i32 = 11000;

/// Connect to a MongoDB deployment and select `database`
pub async fn connect(uri: &str, database: &str) -> CatalogResult<Database> {
    let client = Client::with_uri_str(uri)
        .await
        .map_err(db_error("failed to connect"))?;
    tracing::info!(database, "connected to MongoDB");
    Ok(client.database(database))
}

fn db_error(action: &'static str) -> impl FnOnce(mongodb::error::Error) -> StorageError {
    move |e| StorageError::unavailable(BACKEND, format!("{action}: {e}"))
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Convert a serde_json::Value (expected to be an Object) into a BSON Document,
/// renaming `id` → `_id` and turning RFC3339 timestamps into BSON dates.
fn json_to_document(json: serde_json::Value) -> Result<Document, StorageError> {
    let bson_val = bson::to_bson(&json).map_err(|e| StorageError::serialization(BACKEND, e))?;

    let mut doc = match bson_val {
        Bson::Document(d) => d,
        _ => {
            return Err(StorageError::serialization(
                BACKEND,
                "expected BSON document, got non-object",
            ));
        }
    };

    if let Some(id) = doc.remove("id") {
        doc.insert("_id", id);
    }

    for field in TIMESTAMP_FIELDS {
        let instant = match doc.get(field) {
            Some(Bson::String(raw)) => DateTime::parse_from_rfc3339(raw)
                .map_err(|e| StorageError::serialization(BACKEND, format!("{field}: {e}")))?,
            _ => continue,
        };
        doc.insert(field, bson_datetime(instant.with_timezone(&Utc)));
    }

    Ok(doc)
}

/// Convert a BSON Document back into a serde_json::Value,
/// renaming `_id` → `id` and rendering BSON dates and ObjectIds as strings.
fn document_to_json(mut doc: Document) -> serde_json::Value {
    if let Some(id) = doc.remove("_id") {
        let id = match id {
            Bson::ObjectId(oid) => Bson::String(oid.to_hex()),
            other => other,
        };
        doc.insert("id", id);
    }

    for field in TIMESTAMP_FIELDS {
        let millis = match doc.get(field) {
            Some(Bson::DateTime(instant)) => instant.timestamp_millis(),
            _ => continue,
        };
        let rendered = DateTime::<Utc>::from_timestamp_millis(millis)
            .map(|t| Bson::String(t.to_rfc3339_opts(SecondsFormat::Millis, true)))
            .unwrap_or(Bson::Null);
        doc.insert(field, rendered);
    }

    Bson::Document(doc).into_relaxed_extjson()
}

fn bson_datetime(instant: DateTime<Utc>) -> Bson {
    Bson::DateTime(bson::DateTime::from_millis(instant.timestamp_millis()))
}

/// BSON representation of a movie identifier
fn id_bson(id: &MovieId) -> Result<Bson, StorageError> {
    match id {
        MovieId::Numeric(n) => i64::try_from(*n)
            .map(Bson::Int64)
            .map_err(|_| StorageError::serialization(BACKEND, format!("id {n} exceeds i64"))),
        MovieId::Text(s) => Ok(Bson::String(s.clone())),
    }
}

/// All `_id` values that may denote `id`
///
/// Documents inserted by other tools carry ObjectIds, which surface here as
/// their hex string.
fn id_variants(id: &MovieId) -> Result<Vec<Bson>, StorageError> {
    let mut variants = vec![id_bson(id)?];
    if let MovieId::Text(s) = id
        && let Ok(oid) = ObjectId::parse_str(s)
    {
        variants.push(Bson::ObjectId(oid));
    }
    Ok(variants)
}

fn id_filter(id: &MovieId) -> Result<Document, StorageError> {
    Ok(doc! { "_id": { "$in": id_variants(id)? } })
}

fn movie_to_document(movie: &MovieRecord) -> Result<Document, StorageError> {
    let json = serde_json::to_value(movie).map_err(|e| StorageError::serialization(BACKEND, e))?;
    json_to_document(json)
}

fn document_to_movie(mut doc: Document) -> Result<MovieRecord, StorageError> {
    doc.remove(INSERT_SEQ);
    serde_json::from_value(document_to_json(doc)).map_err(|e| StorageError::serialization(BACKEND, e))
}

fn user_to_document(user: &UserRecord) -> Result<Document, StorageError> {
    let json = serde_json::to_value(user).map_err(|e| StorageError::serialization(BACKEND, e))?;
    json_to_document(json)
}

fn document_to_user(doc: Document) -> Result<UserRecord, StorageError> {
    serde_json::from_value(document_to_json(doc)).map_err(|e| StorageError::serialization(BACKEND, e))
}

fn review_to_document(review: &ReviewRecord) -> Result<Document, StorageError> {
    let json = serde_json::to_value(review).map_err(|e| StorageError::serialization(BACKEND, e))?;
    json_to_document(json)
}

fn document_to_review(doc: Document) -> Result<ReviewRecord, StorageError> {
    serde_json::from_value(document_to_json(doc)).map_err(|e| StorageError::serialization(BACKEND, e))
}

// ---------------------------------------------------------------------------
// Query translation
// ---------------------------------------------------------------------------

/// Native filter document for the filters in `spec`
///
/// Stored records are normalized, so `releaseYear` always holds the year of
/// `releaseDate` when one is set.
pub fn filter_document(spec: &QuerySpec) -> Document {
    let mut filter = Document::new();
    if let Some(genre) = spec.genre() {
        filter.insert("genre", genre);
    }
    if let Some(year) = spec.year() {
        filter.insert("releaseYear", year);
    }
    if let Some(min_rating) = spec.min_rating() {
        filter.insert("rating", doc! { "$gte": min_rating });
    }
    filter
}

/// Native sort document for `key`
///
/// Equal keys fall back to insertion order, then `_id` for documents without
/// an insertion sequence.
pub fn sort_document(key: SortKey) -> Document {
    match key {
        SortKey::Recency => doc! { "createdAt": -1, "insertSeq": 1, "_id": 1 },
        SortKey::RatingDesc => doc! { "rating": -1, "insertSeq": 1, "_id": 1 },
        SortKey::YearDesc => {
            doc! { "releaseYear": -1, "releaseDate": -1, "insertSeq": 1, "_id": 1 }
        }
        SortKey::TitleAlpha => doc! { "title": 1, "insertSeq": 1, "_id": 1 },
        SortKey::Identifier => doc! { "_id": 1 },
    }
}

/// Sort document for the collection order
pub fn insertion_order() -> Document {
    doc! { "insertSeq": 1, "_id": 1 }
}

/// English collation at secondary strength for title ordering
///
/// Case is ignored; accents only break ties between otherwise equal titles.
pub fn collation(key: SortKey) -> Option<Collation> {
    match key {
        SortKey::TitleAlpha => Some(
            Collation::builder()
                .locale("en".to_string())
                .strength(CollationStrength::Secondary)
                .build(),
        ),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// MongoMovieStore
// ---------------------------------------------------------------------------

/// Movie catalog backed by MongoDB.
///
/// # Example
///
/// ```rust,ignore
/// use marquee::storage::mongodb::{MongoMovieStore, connect};
///
/// let db = connect("mongodb://localhost:27017", "marquee").await?;
/// let store = MongoMovieStore::new(db);
/// store.ensure_indexes().await?;
/// let page = store.query(&QuerySpec::new().with_genre("Drama")).await?;
/// ```
#[derive(Clone, Debug)]
pub struct MongoMovieStore {
    database: Database,
}

impl MongoMovieStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Get a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    fn collection(&self) -> Collection<Document> {
        self.database.collection(MOVIES)
    }

    /// Create indexes backing the filter and sort fields.
    ///
    /// Idempotent, so it runs on every startup.
    pub async fn ensure_indexes(&self) -> CatalogResult<()> {
        let indexes = vec![
            IndexModel::builder().keys(doc! { "genre": 1 }).build(),
            IndexModel::builder().keys(doc! { "releaseYear": -1, "releaseDate": -1 }).build(),
            IndexModel::builder().keys(doc! { "rating": -1 }).build(),
            IndexModel::builder().keys(doc! { "createdAt": -1 }).build(),
            IndexModel::builder().keys(insertion_order()).build(),
        ];

        self.collection()
            .create_indexes(indexes)
            .await
            .map_err(db_error("failed to create indexes on movies collection"))?;
        Ok(())
    }

    async fn find_document(&self, id: &MovieId) -> CatalogResult<Option<Document>> {
        Ok(self
            .collection()
            .find_one(id_filter(id)?)
            .await
            .map_err(db_error("failed to get movie"))?)
    }

    async fn find_one(&self, id: &MovieId) -> CatalogResult<Option<MovieRecord>> {
        Ok(self.find_document(id).await?.map(document_to_movie).transpose()?)
    }

    /// Next value of the movies insertion counter
    async fn next_insert_seq(&self) -> CatalogResult<i64> {
        let counter = self
            .database
            .collection::<Document>(COUNTERS)
            .find_one_and_update(doc! { "_id": MOVIES }, doc! { "$inc": { "seq": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(db_error("failed to allocate insertion sequence"))?;
        counter
            .and_then(|c| c.get_i64("seq").ok())
            .ok_or_else(|| StorageError::unavailable(BACKEND, "insertion counter missing").into())
    }
}

#[async_trait]
impl MovieStore for MongoMovieStore {
    /// Inserts the document and reads it back to return the stored version.
    async fn create(&self, movie: MovieRecord) -> CatalogResult<MovieRecord> {
        let movie = movie.normalized();
        let mut document = movie_to_document(&movie)?;
        document.insert(INSERT_SEQ, self.next_insert_seq().await?);
        self.collection()
            .insert_one(document)
            .await
            .map_err(db_error("failed to create movie"))?;

        self.find_one(&movie.id).await?.ok_or_else(|| {
            StorageError::unavailable(BACKEND, "movie not found after insert").into()
        })
    }

    async fn get(&self, id: &MovieId) -> CatalogResult<Option<MovieRecord>> {
        self.find_one(id).await
    }

    async fn get_many(&self, ids: &[MovieId]) -> CatalogResult<Vec<MovieRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut variants = Vec::new();
        for id in ids {
            variants.extend(id_variants(id)?);
        }

        let docs: Vec<Document> = self
            .collection()
            .find(doc! { "_id": { "$in": variants } })
            .await
            .map_err(db_error("failed to fetch movies"))?
            .try_collect()
            .await
            .map_err(db_error("failed to collect movies"))?;

        let found = docs
            .into_iter()
            .map(document_to_movie)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids
            .iter()
            .filter_map(|id| found.iter().find(|m| &m.id == id).cloned())
            .collect())
    }

    async fn list(&self) -> CatalogResult<Vec<MovieRecord>> {
        let docs: Vec<Document> = self
            .collection()
            .find(doc! {})
            .sort(insertion_order())
            .await
            .map_err(db_error("failed to list movies"))?
            .try_collect()
            .await
            .map_err(db_error("failed to collect movies"))?;

        Ok(docs
            .into_iter()
            .map(document_to_movie)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Replaces the whole document; the stored id and insertion sequence
    /// always win over the replacement.
    async fn update(&self, id: &MovieId, movie: MovieRecord) -> CatalogResult<MovieRecord> {
        let mut movie = movie.normalized();
        movie.id = id.clone();

        let Some(existing) = self.find_document(id).await? else {
            return Err(MovieError::NotFound { id: id.clone() }.into());
        };
        let stored_id = existing.get("_id").cloned().unwrap_or(Bson::Null);
        let mut replacement = movie_to_document(&movie)?;
        replacement.insert("_id", stored_id.clone());
        if let Some(seq) = existing.get(INSERT_SEQ) {
            replacement.insert(INSERT_SEQ, seq.clone());
        }

        let result = self
            .collection()
            .replace_one(doc! { "_id": stored_id }, replacement)
            .await
            .map_err(db_error("failed to update movie"))?;
        if result.matched_count == 0 {
            return Err(MovieError::NotFound { id: id.clone() }.into());
        }

        self.find_one(id)
            .await?
            .ok_or_else(|| MovieError::NotFound { id: id.clone() }.into())
    }

    async fn delete(&self, id: &MovieId) -> CatalogResult<()> {
        let result = self
            .collection()
            .delete_one(id_filter(id)?)
            .await
            .map_err(db_error("failed to delete movie"))?;
        if result.deleted_count == 0 {
            return Err(MovieError::NotFound { id: id.clone() }.into());
        }
        Ok(())
    }

    async fn set_rating_summary(
        &self,
        id: &MovieId,
        summary: RatingSummary,
    ) -> CatalogResult<MovieRecord> {
        let updated = self
            .collection()
            .find_one_and_update(
                id_filter(id)?,
                doc! {
                    "$set": {
                        "averageRating": summary.average_rating,
                        "reviewCount": i64::from(summary.review_count),
                    }
                },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(db_error("failed to update rating summary"))?
            .ok_or_else(|| MovieError::NotFound { id: id.clone() })?;
        Ok(document_to_movie(updated)?)
    }

    async fn query(&self, spec: &QuerySpec) -> CatalogResult<ResultPage<MovieRecord>> {
        let filter = filter_document(spec);
        let sort = sort_document(spec.sort());
        let limit = i64::try_from(spec.page_size()).unwrap_or(i64::MAX);
        let skip = u64::try_from(spec.offset()).unwrap_or(u64::MAX);

        tracing::debug!(%filter, %sort, skip, limit, "querying movies");

        let collection = self.collection();
        let mut find = collection
            .find(filter.clone())
            .sort(sort)
            .skip(skip)
            .limit(limit);
        if let Some(collation) = collation(spec.sort()) {
            find = find.collation(collation);
        }

        let page = async {
            let cursor = find.await?;
            cursor.try_collect::<Vec<Document>>().await
        };
        let count = collection.count_documents(filter);

        let (docs, total) = tokio::try_join!(page, async { count.await })
            .map_err(db_error("failed to query movies"))?;

        let items = docs
            .into_iter()
            .map(document_to_movie)
            .collect::<Result<Vec<_>, _>>()?;
        let total_matching = usize::try_from(total).unwrap_or(usize::MAX);
        Ok(ResultPage::new(items, total_matching, spec))
    }

    async fn facets(&self) -> CatalogResult<FacetSet> {
        let collection = self.collection();
        let genres = collection.distinct("genre", doc! {});
        let years = collection.distinct("releaseYear", doc! {});
        let (genres, years) = tokio::try_join!(async { genres.await }, async { years.await })
            .map_err(db_error("failed to read facets"))?;

        let genres = genres.into_iter().filter_map(|g| match g {
            Bson::String(s) => Some(s),
            _ => None,
        });
        let years = years.into_iter().filter_map(|y| match y {
            Bson::Int32(n) => Some(n),
            Bson::Int64(n) => i32::try_from(n).ok(),
            _ => None,
        });
        Ok(FacetSet::from_parts(genres, years))
    }
}

// ---------------------------------------------------------------------------
// MongoUserStore
// ---------------------------------------------------------------------------

/// User profiles and favorites backed by MongoDB.
///
/// Favorites are mutated with single conditional updates so concurrent
/// requests cannot insert the same movie twice.
#[derive(Clone, Debug)]
pub struct MongoUserStore {
    database: Database,
}

impl MongoUserStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn collection(&self) -> Collection<Document> {
        self.database.collection(USERS)
    }

    fn user_filter(id: &Uuid) -> Document {
        doc! { "_id": id.to_string() }
    }

    async fn require(&self, id: &Uuid) -> CatalogResult<UserRecord> {
        self.get(id)
            .await?
            .ok_or_else(|| UserError::NotFound { user_id: *id }.into())
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn get(&self, id: &Uuid) -> CatalogResult<Option<UserRecord>> {
        let doc = self
            .collection()
            .find_one(Self::user_filter(id))
            .await
            .map_err(db_error("failed to get user"))?;
        Ok(doc.map(document_to_user).transpose()?)
    }

    async fn save(&self, user: UserRecord) -> CatalogResult<UserRecord> {
        self.collection()
            .replace_one(Self::user_filter(&user.id), user_to_document(&user)?)
            .upsert(true)
            .await
            .map_err(db_error("failed to save user"))?;
        self.require(&user.id).await
    }

    async fn add_favorite(&self, user_id: &Uuid, movie_id: MovieId) -> CatalogResult<UserRecord> {
        let movie = id_bson(&movie_id)?;
        let mut filter = Self::user_filter(user_id);
        filter.insert("favorites", doc! { "$ne": movie.clone() });

        let result = self
            .collection()
            .update_one(
                filter,
                doc! {
                    "$push": { "favorites": movie },
                    "$set": { "updatedAt": bson_datetime(Utc::now()) },
                },
            )
            .await
            .map_err(db_error("failed to add favorite"))?;

        if result.matched_count == 0 {
            // Either the user is missing or the movie is already a favorite
            self.require(user_id).await?;
            return Err(FavoriteError::AlreadyFavorited { movie_id }.into());
        }
        self.require(user_id).await
    }

    async fn remove_favorite(
        &self,
        user_id: &Uuid,
        movie_id: &MovieId,
    ) -> CatalogResult<UserRecord> {
        let movie = id_bson(movie_id)?;
        let mut filter = Self::user_filter(user_id);
        filter.insert("favorites", movie.clone());

        self.collection()
            .update_one(
                filter,
                doc! {
                    "$pull": { "favorites": movie },
                    "$set": { "updatedAt": bson_datetime(Utc::now()) },
                },
            )
            .await
            .map_err(db_error("failed to remove favorite"))?;

        self.require(user_id).await
    }
}

// ---------------------------------------------------------------------------
// MongoReviewStore
// ---------------------------------------------------------------------------

/// Movie reviews backed by MongoDB.
///
/// A unique index on `(movieId, userId)` enforces one review per user and
/// movie; call [`MongoReviewStore::ensure_indexes`] at startup.
#[derive(Clone, Debug)]
pub struct MongoReviewStore {
    database: Database,
}

impl MongoReviewStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn collection(&self) -> Collection<Document> {
        self.database.collection(REVIEWS)
    }

    pub async fn ensure_indexes(&self) -> CatalogResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "movieId": 1, "userId": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
            IndexModel::builder().keys(doc! { "userId": 1, "createdAt": 1 }).build(),
        ];

        self.collection()
            .create_indexes(indexes)
            .await
            .map_err(db_error("failed to create indexes on reviews collection"))?;
        Ok(())
    }

    async fn find_sorted(&self, filter: Document) -> CatalogResult<Vec<ReviewRecord>> {
        let docs: Vec<Document> = self
            .collection()
            .find(filter)
            .sort(doc! { "createdAt": 1, "_id": 1 })
            .await
            .map_err(db_error("failed to fetch reviews"))?
            .try_collect()
            .await
            .map_err(db_error("failed to collect reviews"))?;

        Ok(docs
            .into_iter()
            .map(document_to_review)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

#[async_trait]
impl ReviewStore for MongoReviewStore {
    async fn create(&self, review: ReviewRecord) -> CatalogResult<ReviewRecord> {
        let existing = self
            .collection()
            .find_one(doc! {
                "movieId": { "$in": id_variants(&review.movie_id)? },
                "userId": review.user_id.to_string(),
            })
            .await
            .map_err(db_error("failed to check existing review"))?;
        if existing.is_some() {
            return Err(ReviewError::AlreadyReviewed {
                movie_id: review.movie_id,
            }
            .into());
        }

        match self.collection().insert_one(review_to_document(&review)?).await {
            Ok(_) => Ok(review),
            // a concurrent review from the same user won the unique index
            Err(e) if is_duplicate_key(&e) => Err(ReviewError::AlreadyReviewed {
                movie_id: review.movie_id,
            }
            .into()),
            Err(e) => Err(db_error("failed to create review")(e).into()),
        }
    }

    async fn for_movie(&self, movie_id: &MovieId) -> CatalogResult<Vec<ReviewRecord>> {
        self.find_sorted(doc! { "movieId": { "$in": id_variants(movie_id)? } })
            .await
    }

    async fn for_user(&self, user_id: &Uuid) -> CatalogResult<Vec<ReviewRecord>> {
        self.find_sorted(doc! { "userId": user_id.to_string() }).await
    }

    async fn delete_for_movie(&self, movie_id: &MovieId) -> CatalogResult<u64> {
        let result = self
            .collection()
            .delete_many(doc! { "movieId": { "$in": id_variants(movie_id)? } })
            .await
            .map_err(db_error("failed to delete reviews"))?;
        Ok(result.deleted_count)
    }
}
