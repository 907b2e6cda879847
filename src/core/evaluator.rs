//! In-memory query evaluation
//!
//! Pure functions that apply a [`QuerySpec`] to a materialized slice of
//! records. The in-memory store and frontend callers both go through
//! [`derive_view`]; the MongoDB store translates the same `QuerySpec` into native
//! filter and sort documents instead.

use chrono::{DateTime, Utc};
use std::cmp::{Ordering, Reverse};

use crate::core::collation::compare_titles;
use crate::core::movie::MovieRecord;
use crate::core::query::{QuerySpec, ResultPage, SortKey};

/// True when `record` satisfies every filter in `spec`
pub fn matches(record: &MovieRecord, spec: &QuerySpec) -> bool {
    let genre_ok = spec.genre().is_none_or(|g| record.has_genre(g));
    let year_ok = spec.year().is_none_or(|y| record.normalized_year() == y);
    let rating_ok = spec.min_rating().is_none_or(|r| record.rating >= r);
    genre_ok && year_ok && rating_ok
}

/// Order two records by `key`; `Equal` leaves the original order in place
pub fn compare(a: &MovieRecord, b: &MovieRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::TitleAlpha => compare_titles(&a.title, &b.title),
        // total_cmp keeps the comparator total even for NaN ratings
        SortKey::RatingDesc => b.rating.total_cmp(&a.rating),
        SortKey::YearDesc => b.release_key().cmp(&a.release_key()),
        SortKey::Recency => recency_key(a).cmp(&recency_key(b)),
        SortKey::Identifier => a.id.cmp(&b.id),
    }
}

// Timestamped records first, newest to oldest
fn recency_key(record: &MovieRecord) -> (bool, Reverse<Option<DateTime<Utc>>>) {
    (record.created_at.is_none(), Reverse(record.created_at))
}

/// Filter, sort and paginate `collection` according to `spec`
///
/// The sort is stable so records with equal keys keep their collection order.
/// A page past the end yields no items with unchanged totals.
pub fn derive_view(collection: &[MovieRecord], spec: &QuerySpec) -> ResultPage<MovieRecord> {
    let mut filtered: Vec<&MovieRecord> = collection.iter().filter(|r| matches(r, spec)).collect();
    let total_matching = filtered.len();

    let sort = spec.sort();
    filtered.sort_by(|a, b| compare(a, b, sort));

    let items: Vec<MovieRecord> = filtered
        .into_iter()
        .skip(spec.offset())
        .take(spec.page_size())
        .cloned()
        .collect();

    tracing::debug!(
        genre = spec.genre(),
        year = spec.year(),
        min_rating = spec.min_rating(),
        sort = %sort,
        page = spec.page(),
        page_size = spec.page_size(),
        total_matching,
        returned = items.len(),
        "derived catalog view"
    );

    ResultPage::new(items, total_matching, spec)
}
