//! Title collation shared by the in-memory evaluator
//!
//! Titles compare the way MongoDB orders them under
//! `{ locale: "en", strength: 2 }`: letters by their base form, case ignored,
//! and accents only separating titles that are otherwise equal. English has
//! no tailoring, so the root collation data is used.

use icu_collator::{Collator, CollatorOptions, Strength};
use std::cmp::Ordering;

thread_local! {
    static TITLE_COLLATOR: Option<Collator> = title_collator();
}

fn title_collator() -> Option<Collator> {
    let mut options = CollatorOptions::new();
    options.strength = Some(Strength::Secondary);
    match Collator::try_new(&Default::default(), options) {
        Ok(collator) => Some(collator),
        Err(e) => {
            tracing::warn!(error = ?e, "title collator unavailable, falling back to lowercase order");
            None
        }
    }
}

/// Compare two titles in catalog order
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    TITLE_COLLATOR.with(|collator| match collator {
        Some(collator) => collator.compare(a, b),
        None => a.to_lowercase().cmp(&b.to_lowercase()),
    })
}
