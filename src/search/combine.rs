//! Multi-term result combination.
//!
//! Documents matching every term always outrank documents matching only some:
//! the AND set is scored in [`ScoreTier::Complete`], and the OR fallback (used
//! only when the AND set is empty) is scored in [`ScoreTier::Partial`]. The tier
//! is compared before the points, so no amount of partial evidence can overtake
//! a complete match.

use super::scoring::TermHits;
use ahash::AHashMap;
use serde::Serialize;

/// Bonus for a document matching every query term. A document matching a
/// fraction of the terms earns that fraction of it.
pub const COMPLETENESS_BONUS: u32 = 100;

/// Completeness bonus for `matched` of `total` terms.
pub fn completeness_bonus(matched: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let scaled = u64::from(COMPLETENESS_BONUS) * matched.min(total) as u64 / total as u64;
    u32::try_from(scaled).unwrap_or(COMPLETENESS_BONUS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ScoreTier {
    /// Matched some, but not all, query terms
    Partial,
    /// Matched every query term
    Complete,
}

/// Aggregate score of one document for a whole query.
///
/// Field order matters: the derived ordering compares tier, then points, then
/// the number of matched terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AggregateScore {
    pub tier: ScoreTier,
    pub points: u32,
    pub matched_terms: usize,
}

/// Combine per-term hits into one score per document.
///
/// Every term takes part in the AND check, including terms that hit nothing,
/// so an unknown term leaves no document complete. With more than one term the
/// OR fallback then keeps whatever the known terms matched. Returns an empty map
/// if nothing matched.
pub fn combine(term_hits: &[TermHits]) -> AHashMap<usize, AggregateScore> {
    let Some((first, rest)) = term_hits.split_first() else {
        return AHashMap::new();
    };
    let total = term_hits.len();

    let complete: AHashMap<usize, AggregateScore> = first
        .scores
        .iter()
        .filter_map(|(&doc, &score)| {
            let mut points = score;
            for hits in rest {
                points += hits.scores.get(&doc)?;
            }
            Some((
                doc,
                AggregateScore {
                    tier: ScoreTier::Complete,
                    points: points + completeness_bonus(total, total),
                    matched_terms: total,
                },
            ))
        })
        .collect();

    if !complete.is_empty() || total == 1 {
        tracing::debug!("Combined {} terms: {} complete matches", total, complete.len());
        return complete;
    }

    let mut partial: AHashMap<usize, AggregateScore> = AHashMap::new();
    for hits in term_hits {
        for (&doc, &score) in &hits.scores {
            let entry = partial.entry(doc).or_insert(AggregateScore {
                tier: ScoreTier::Partial,
                points: 0,
                matched_terms: 0,
            });
            entry.points += score;
            entry.matched_terms += 1;
        }
    }

    tracing::debug!(
        "No document matched all {} terms; {} partial matches",
        total,
        partial.len()
    );
    partial
}
