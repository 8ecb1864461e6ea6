use crate::models::Searchable;
use crate::core::distance::within_threshold;

/// Default fraction of a word's length that may be edited in a fuzzy match
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.4;

/// Keep the records where at least one of `fields` approximately contains `query`
///
/// A field matches when any of its whitespace-separated words is within
/// `threshold * word.len()` edits of the whole query, or when the field
/// contains the query as a substring. Comparison is case-insensitive.
///
/// The result keeps input order and lists each record at most once. An empty
/// query matches every record through the substring rule; callers that do
/// not want that must reject empty queries first.
pub fn fuzzy_match<R: Searchable>(
    records: &[R],
    fields: &[R::Field],
    query: &str,
    threshold: f64,
) -> Vec<R> {
    let query = query.to_lowercase();

    records
        .iter()
        .filter(|record| {
            fields
                .iter()
                .any(|&field| fuzzy_field_matches(record.field_text(field), &query, threshold))
        })
        .cloned()
        .collect()
}

/// Keep the records whose `field` has a word starting with `query`, or contains it
///
/// Cheaper and stricter than [`fuzzy_match`]: no edit tolerance at all.
pub fn partial_match<R: Searchable>(records: &[R], field: R::Field, query: &str) -> Vec<R> {
    let query = query.to_lowercase();

    records
        .iter()
        .filter(|record| partial_field_matches(record.field_text(field), &query))
        .cloned()
        .collect()
}

/// `query` must already be lower-case.
#[inline]
fn fuzzy_field_matches(value: &str, query: &str, threshold: f64) -> bool {
    let value = value.to_lowercase();

    value
        .split_whitespace()
        .any(|word| within_threshold(word, query, threshold))
        || value.contains(query)
}

/// `query` must already be lower-case.
#[inline]
fn partial_field_matches(value: &str, query: &str) -> bool {
    let value = value.to_lowercase();

    value.split_whitespace().any(|word| word.starts_with(query)) || value.contains(query)
}
