//! Similarity scoring for substitute candidates

use std::collections::HashSet;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::types::ScoreBreakdown;
use crate::domain::medicine::Medicine;
use crate::errors::DomainError;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;
const RATING_SCALE: Decimal = Decimal::from_parts(20, 0, 0, false, 0);
const HALF: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Weights for scoring components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringWeights {
    /// Weight for composition overlap (default: 0.5)
    pub composition: Decimal,
    /// Weight for candidate rating (default: 0.3)
    pub rating: Decimal,
    /// Weight for relative price (default: 0.2)
    pub price: Decimal,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        super::DEFAULT_WEIGHTS
    }
}

/// Score calculator for substitute candidates
#[derive(Debug, Clone, Default)]
pub struct SimilarityScorer {
    weights: ScoringWeights,
}

impl SimilarityScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> ScoringWeights {
        self.weights
    }

    /// Score `candidate` against `reference`.
    ///
    /// The reference must list at least one ingredient; the composition
    /// score divides by its length.
    pub fn score(
        &self,
        reference: &Medicine,
        candidate: &Medicine,
    ) -> Result<ScoreBreakdown, DomainError> {
        let composition_score = self.composition_score(reference, candidate)?;
        let price_score = self.price_score(reference, candidate)?;
        let rating_score = self.rating_score(candidate)?;

        let total_score = composition_score
            .checked_mul(self.weights.composition)
            .zip(rating_score.checked_mul(self.weights.rating))
            .and_then(|(composition, rating)| composition.checked_add(rating))
            .zip(price_score.checked_mul(self.weights.price))
            .and_then(|(partial, price)| partial.checked_add(price))
            .ok_or_else(|| out_of_range(reference, candidate))?;

        Ok(ScoreBreakdown { composition_score, price_score, rating_score, total_score })
    }

    /// Share of the reference's ingredients the candidate also lists, 0..100.
    pub fn composition_score(
        &self,
        reference: &Medicine,
        candidate: &Medicine,
    ) -> Result<Decimal, DomainError> {
        if reference.composition.is_empty() {
            return Err(DomainError::InvalidRecord(format!(
                "reference medicine `{}` has an empty composition",
                reference.id
            )));
        }

        let reference_set: HashSet<&str> =
            reference.composition.iter().map(String::as_str).collect();
        let matched = candidate
            .composition
            .iter()
            .map(String::as_str)
            .collect::<HashSet<_>>()
            .intersection(&reference_set)
            .count();

        Ok(Decimal::from(matched) / Decimal::from(reference.composition.len()) * HUNDRED)
    }

    /// Relative saving against the reference MRP; negative when pricier.
    ///
    /// Fails with `InvalidRecord` when the ratio leaves `Decimal` range.
    pub fn price_score(
        &self,
        reference: &Medicine,
        candidate: &Medicine,
    ) -> Result<Decimal, DomainError> {
        let reference_mrp = reference.price.mrp;
        if reference_mrp > Decimal::ZERO {
            relative_difference(reference_mrp, candidate.price.mrp)
                .ok_or_else(|| out_of_range(reference, candidate))
        } else {
            Ok(Decimal::ZERO)
        }
    }

    /// Maps a 0..5 average rating onto 0..100.
    pub fn rating_score(&self, candidate: &Medicine) -> Result<Decimal, DomainError> {
        candidate.ratings.average.checked_mul(RATING_SCALE).ok_or_else(|| {
            DomainError::InvalidRecord(format!(
                "rating of medicine `{}` is out of range",
                candidate.id
            ))
        })
    }

    /// Whole-percent saving, 0 unless the candidate is strictly cheaper.
    pub fn savings(&self, reference: &Medicine, candidate: &Medicine) -> Result<i64, DomainError> {
        let reference_mrp = reference.price.mrp;
        let candidate_mrp = candidate.price.mrp;
        if reference_mrp > candidate_mrp && reference_mrp > Decimal::ZERO {
            relative_difference(reference_mrp, candidate_mrp)
                .map(round_half_up)
                .ok_or_else(|| out_of_range(reference, candidate))
        } else {
            Ok(0)
        }
    }
}

/// `(reference - candidate) / reference * 100`, `None` on overflow.
fn relative_difference(reference_mrp: Decimal, candidate_mrp: Decimal) -> Option<Decimal> {
    reference_mrp
        .checked_sub(candidate_mrp)?
        .checked_div(reference_mrp)?
        .checked_mul(HUNDRED)
}

fn out_of_range(reference: &Medicine, candidate: &Medicine) -> DomainError {
    DomainError::InvalidRecord(format!(
        "prices of `{}` and `{}` are too far apart to score",
        reference.id, candidate.id
    ))
}

/// Round to the nearest integer with halves going up (`floor(x + 0.5)`).
pub fn round_half_up(value: Decimal) -> i64 {
    let rounded = value.checked_add(HALF).unwrap_or(value).floor();
    rounded.to_i64().unwrap_or(if rounded.is_sign_negative() { i64::MIN } else { i64::MAX })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{round_half_up, ScoringWeights, SimilarityScorer};
    use crate::domain::medicine::Medicine;
    use crate::errors::DomainError;

    fn medicine(id: &str, composition: &[&str], mrp: i64, rating_tenths: i64) -> Medicine {
        Medicine::new(
            id,
            id.to_uppercase(),
            "generic",
            composition.iter().map(|value| value.to_string()).collect(),
            Decimal::new(mrp, 0),
        )
        .with_rating(Decimal::new(rating_tenths, 1))
    }

    #[test]
    fn worked_example_scores_fifty_seven() {
        let reference = medicine("r", &["X", "Y"], 100, 0);
        let candidate = medicine("s", &["X"], 60, 40);
        let scorer = SimilarityScorer::new();

        let breakdown = scorer.score(&reference, &candidate).expect("score");

        assert_eq!(breakdown.composition_score, Decimal::new(50, 0));
        assert_eq!(breakdown.price_score, Decimal::new(40, 0));
        assert_eq!(breakdown.rating_score, Decimal::new(80, 0));
        assert_eq!(breakdown.total_score, Decimal::new(57, 0));
        assert_eq!(round_half_up(breakdown.total_score), 57);
        assert_eq!(scorer.savings(&reference, &candidate), Ok(40));
    }

    #[test]
    fn empty_reference_composition_is_an_invalid_record() {
        let reference = medicine("r", &[], 100, 0);
        let candidate = medicine("s", &["X"], 60, 40);

        let error = SimilarityScorer::new().score(&reference, &candidate).unwrap_err();

        assert!(matches!(error, DomainError::InvalidRecord(_)));
    }

    #[test]
    fn free_reference_yields_zero_price_score_and_no_savings() {
        let reference = medicine("r", &["X"], 0, 0);
        let candidate = medicine("s", &["X"], 10, 0);
        let scorer = SimilarityScorer::new();

        assert_eq!(scorer.price_score(&reference, &candidate), Ok(Decimal::ZERO));
        assert_eq!(scorer.savings(&reference, &candidate), Ok(0));
    }

    #[test]
    fn pricier_candidate_has_negative_price_score_and_zero_savings() {
        let reference = medicine("r", &["X"], 100, 0);
        let candidate = medicine("s", &["X"], 250, 0);
        let scorer = SimilarityScorer::new();

        assert_eq!(scorer.price_score(&reference, &candidate), Ok(Decimal::new(-150, 0)));
        assert_eq!(scorer.savings(&reference, &candidate), Ok(0));
    }

    #[test]
    fn duplicate_candidate_ingredients_count_once() {
        let reference = medicine("r", &["X", "Y"], 100, 0);
        let candidate = medicine("s", &["X", "X"], 100, 0);

        let score = SimilarityScorer::new().composition_score(&reference, &candidate).expect("score");

        assert_eq!(score, Decimal::new(50, 0));
    }

    #[test]
    fn halves_round_up_including_negatives() {
        assert_eq!(round_half_up(Decimal::new(565, 1)), 57);
        assert_eq!(round_half_up(Decimal::new(564, 1)), 56);
        assert_eq!(round_half_up(Decimal::new(-25, 1)), -2);
        assert_eq!(round_half_up(Decimal::new(-26, 1)), -3);
    }

    #[test]
    fn custom_weights_change_the_total() {
        let reference = medicine("r", &["X"], 100, 0);
        let candidate = medicine("s", &["X"], 100, 50);
        let scorer = SimilarityScorer::with_weights(ScoringWeights {
            composition: Decimal::ONE,
            rating: Decimal::ZERO,
            price: Decimal::ZERO,
        });

        let breakdown = scorer.score(&reference, &candidate).expect("score");

        assert_eq!(breakdown.total_score, Decimal::new(100, 0));
    }
}
