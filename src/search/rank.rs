//! Deterministic result ordering.

use super::combine::AggregateScore;
use ahash::AHashMap;
use serde::Serialize;

/// A document and its aggregate score, in final ranked order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankedDoc {
    pub doc: usize,
    pub score: AggregateScore,
}

/// Order by score descending, breaking ties by ascending document index so the
/// same query on the same index always yields the same list.
pub fn rank(scores: &AHashMap<usize, AggregateScore>, limit: Option<usize>) -> Vec<RankedDoc> {
    let mut ranked: Vec<RankedDoc> = scores
        .iter()
        .map(|(&doc, &score)| RankedDoc { doc, score })
        .collect();

    ranked.sort_unstable_by(|a, b| b.score.cmp(&a.score).then(a.doc.cmp(&b.doc)));

    if let Some(limit) = limit {
        ranked.truncate(limit);
    }
    ranked
}
