//! Substitute finder
//!
//! Ranks alternative medicines against a reference by composition overlap,
//! rating and price, and offers a cheapest / highest-rated comparison for a
//! hand-picked set.

mod compare;
mod ranker;
mod scoring;
mod types;

use rust_decimal::Decimal;

pub use compare::compare_substitutes;
pub use ranker::{find_substitutes, SubstituteRanker};
pub use scoring::{round_half_up, ScoringWeights, SimilarityScorer};
pub use types::*;

/// Default scoring weights: composition 0.5, rating 0.3, price 0.2.
pub const DEFAULT_WEIGHTS: ScoringWeights = ScoringWeights {
    composition: Decimal::from_parts(5, 0, 0, false, 1),
    rating: Decimal::from_parts(3, 0, 0, false, 1),
    price: Decimal::from_parts(2, 0, 0, false, 1),
};

/// Candidates fetched from the catalog per substitute lookup.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 10;

/// Minimum number of distinct medicines a comparison accepts.
pub const MIN_COMPARE_MEDICINES: usize = 2;
