use serde::{Deserialize, Serialize};
use crate::models::Searchable;

/// Points for a query word that appears verbatim in the candidate text
const EXACT_MATCH_POINTS: u32 = 2;
/// Points for a query word that some candidate word starts with
const PREFIX_MATCH_POINTS: u32 = 1;

/// A record with its transient relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord<R> {
    #[serde(flatten)]
    pub record: R,
    pub score: u32,
}

/// Calculate the relevance of `text` to `query`
///
/// Scoring formula:
/// score = 2 * exact + prefix
///
/// where `exact` counts query words present verbatim in the text and
/// `prefix` counts query words some text word starts with. An exact hit is
/// also a prefix hit, so it contributes 3 in total. Scores are absolute
/// counts and are not normalized by text length.
pub fn relevance_score(text: &str, query: &str) -> u32 {
    let text = text.to_lowercase();
    let query = query.to_lowercase();

    let text_words: Vec<&str> = text.split_whitespace().collect();

    query
        .split_whitespace()
        .map(|query_word| {
            let exact = text_words.contains(&query_word);
            let prefix = text_words.iter().any(|word| word.starts_with(query_word));

            let mut points = 0;
            if exact {
                points += EXACT_MATCH_POINTS;
            }
            if prefix {
                points += PREFIX_MATCH_POINTS;
            }
            points
        })
        .sum()
}

/// Score every record against `query` and sort by score, highest first
///
/// The sort is stable: records with equal scores keep their input order.
pub fn rank_scored<R: Searchable>(records: &[R], query: &str) -> Vec<ScoredRecord<R>> {
    let mut scored: Vec<ScoredRecord<R>> = records
        .iter()
        .map(|record| ScoredRecord {
            score: relevance_score(record.primary_text(), query),
            record: record.clone(),
        })
        .collect();

    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}

/// Sort records by relevance to `query`, dropping the scores
pub fn rank_by_relevance<R: Searchable>(records: &[R], query: &str) -> Vec<R> {
    rank_scored(records, query)
        .into_iter()
        .map(|scored| scored.record)
        .collect()
}
