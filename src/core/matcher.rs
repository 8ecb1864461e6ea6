use std::collections::HashSet;
use crate::models::{Category, CategoryField, EntryField, KnowledgeEntry, MatchingParams, Searchable, UnionPolicy};
use crate::core::{
    filters::{fuzzy_match, partial_match},
    scoring::{rank_scored, ScoredRecord},
};

/// Result of the matching process
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Categories whose name fuzzily matched, in input order
    pub categories: Vec<Category>,
    /// Matched entries, ranked by relevance
    pub entries: Vec<ScoredRecord<KnowledgeEntry>>,
    pub total_candidates: usize,
}

impl MatchResult {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.entries.is_empty()
    }

    /// Best ranked entry, if any
    pub fn top_entry(&self) -> Option<&KnowledgeEntry> {
        self.entries.first().map(|scored| &scored.record)
    }
}

/// Query pipeline - turns a free-text query into ranked knowledge-base suggestions
///
/// # Pipeline Stages
/// 1. Fuzzy match categories on name and entries on description
/// 2. Partial (prefix) match entries on description
/// 3. Union of both entry sets
/// 4. Relevance ranking of the union
///
/// Category matches are reported separately; deciding whether they take
/// precedence over entry matches is up to the caller.
#[derive(Debug, Clone)]
pub struct Matcher {
    params: MatchingParams,
}

impl Matcher {
    pub fn new(params: MatchingParams) -> Self {
        Self { params }
    }

    pub fn with_default_params() -> Self {
        Self {
            params: MatchingParams::default(),
        }
    }

    pub fn params(&self) -> &MatchingParams {
        &self.params
    }

    /// Find the categories and entries that best match `query`
    ///
    /// # Arguments
    /// * `query` - Free-text user query
    /// * `categories` - All categories, fully loaded
    /// * `entries` - All knowledge entries, fully loaded
    /// * `limit` - Maximum number of ranked entries to return
    pub fn find_matches(
        &self,
        query: &str,
        categories: &[Category],
        entries: &[KnowledgeEntry],
        limit: usize,
    ) -> MatchResult {
        let total_candidates = categories.len() + entries.len();

        // Stage 1: fuzzy
        let matched_categories = fuzzy_match(
            categories,
            &[CategoryField::Name],
            query,
            self.params.category_threshold,
        );
        let fuzzy_entries = fuzzy_match(
            entries,
            &[EntryField::Description],
            query,
            self.params.entry_threshold,
        );

        // Stage 2: partial
        let partial_entries = partial_match(entries, EntryField::Description, query);

        tracing::debug!(
            "Query {:?}: {} categories, {} fuzzy entries, {} partial entries",
            query,
            matched_categories.len(),
            fuzzy_entries.len(),
            partial_entries.len()
        );

        // Stage 3: union
        let candidates = union_matches(fuzzy_entries, partial_entries, self.params.union_policy);

        // Stage 4: rank
        let mut ranked = rank_scored(&candidates, query);
        ranked.truncate(limit);

        MatchResult {
            categories: matched_categories,
            entries: ranked,
            total_candidates,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_params()
    }
}

/// Merge two result sets, `first` before `second`
///
/// With [`UnionPolicy::DedupById`] a record already seen (by id) is skipped;
/// with [`UnionPolicy::Preserve`] the sets are simply concatenated.
pub fn union_matches<R: Searchable>(first: Vec<R>, second: Vec<R>, policy: UnionPolicy) -> Vec<R> {
    match policy {
        UnionPolicy::Preserve => first.into_iter().chain(second).collect(),
        UnionPolicy::DedupById => {
            let mut seen = HashSet::with_capacity(first.len() + second.len());
            first
                .into_iter()
                .chain(second)
                .filter(|record| seen.insert(record.id()))
                .collect()
        }
    }
}
