//! Filter option extraction

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::movie::MovieRecord;

/// Distinct filter values present in a collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetSet {
    /// Every genre carried by at least one record, ascending
    pub available_genres: Vec<String>,
    /// Every normalized release year, as strings, most recent first
    pub available_years: Vec<String>,
}

impl FacetSet {
    /// Build a facet set from raw distinct values in any order
    ///
    /// Used by stores that compute distinct values natively.
    pub fn from_parts(
        genres: impl IntoIterator<Item = String>,
        years: impl IntoIterator<Item = i32>,
    ) -> Self {
        let genres: BTreeSet<String> = genres.into_iter().filter(|g| !g.is_empty()).collect();
        let years: BTreeSet<i32> = years.into_iter().collect();
        Self {
            available_genres: genres.into_iter().collect(),
            available_years: years.into_iter().rev().map(|y| y.to_string()).collect(),
        }
    }
}

/// Collect the facet set for `collection`
pub fn derive_facets(collection: &[MovieRecord]) -> FacetSet {
    FacetSet::from_parts(
        collection.iter().flat_map(|m| m.genre.iter().cloned()),
        collection.iter().map(MovieRecord::normalized_year),
    )
}
