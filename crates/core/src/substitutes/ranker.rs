use std::collections::HashSet;

use crate::domain::medicine::Medicine;
use crate::errors::DomainError;

use super::scoring::{round_half_up, ScoringWeights, SimilarityScorer};
use super::types::{ScorePolicy, SubstituteResult};

/// Scores a candidate pool against a reference and orders it best-first.
#[derive(Debug, Clone, Default)]
pub struct SubstituteRanker {
    scorer: SimilarityScorer,
    policy: ScorePolicy,
}

impl SubstituteRanker {
    pub fn new(policy: ScorePolicy) -> Self {
        Self { scorer: SimilarityScorer::new(), policy }
    }

    pub fn with_weights(weights: ScoringWeights, policy: ScorePolicy) -> Self {
        Self { scorer: SimilarityScorer::with_weights(weights), policy }
    }

    pub fn policy(&self) -> ScorePolicy {
        self.policy
    }

    pub fn scorer(&self) -> &SimilarityScorer {
        &self.scorer
    }

    /// Rank `pool` against `reference`, highest `similarity_score` first.
    ///
    /// The reference itself and repeated ids are skipped. Equal scores keep
    /// their pool order.
    pub fn rank(
        &self,
        reference: &Medicine,
        pool: &[Medicine],
    ) -> Result<Vec<SubstituteResult>, DomainError> {
        let mut seen = HashSet::new();
        let mut results = Vec::with_capacity(pool.len());

        for candidate in pool {
            if candidate.id == reference.id || !seen.insert(candidate.id.as_str()) {
                continue;
            }

            let score_breakdown = self.scorer.score(reference, candidate)?;
            results.push(SubstituteResult {
                similarity_score: self.policy.apply(round_half_up(score_breakdown.total_score)),
                price_difference: reference.price.mrp - candidate.price.mrp,
                savings: self.scorer.savings(reference, candidate)?,
                score_breakdown,
                medicine: candidate.clone(),
            });
        }

        if results.is_empty() {
            // Still surface an unusable reference even with nothing to rank.
            self.scorer.composition_score(reference, reference)?;
        }

        results.sort_by(|a, b| b.similarity_score.cmp(&a.similarity_score));
        Ok(results)
    }
}

/// Rank with default weights and the clamped score policy.
pub fn find_substitutes(
    reference: &Medicine,
    pool: &[Medicine],
) -> Result<Vec<SubstituteResult>, DomainError> {
    SubstituteRanker::default().rank(reference, pool)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{find_substitutes, SubstituteRanker};
    use crate::domain::medicine::Medicine;
    use crate::errors::DomainError;
    use crate::substitutes::ScorePolicy;

    fn medicine(id: &str, composition: &[&str], mrp: i64, rating_tenths: i64) -> Medicine {
        Medicine::new(
            id,
            format!("Brand {id}"),
            "generic",
            composition.iter().map(|value| value.to_string()).collect(),
            Decimal::new(mrp, 0),
        )
        .with_rating(Decimal::new(rating_tenths, 1))
    }

    #[test]
    fn worked_example_is_reported_with_savings_and_breakdown() {
        let reference = medicine("r", &["X", "Y"], 100, 0);
        let pool = vec![medicine("s", &["X"], 60, 40)];

        let results = find_substitutes(&reference, &pool).expect("results");

        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.medicine.id.as_str(), "s");
        assert_eq!(result.similarity_score, 57);
        assert_eq!(result.price_difference, Decimal::new(40, 0));
        assert_eq!(result.savings, 40);
        assert_eq!(result.score_breakdown.total_score, Decimal::new(57, 0));
    }

    #[test]
    fn reference_is_excluded_and_results_sort_descending() {
        let reference = medicine("r", &["X", "Y"], 100, 30);
        let pool = vec![
            medicine("weak", &["Z"], 100, 10),
            reference.clone(),
            medicine("strong", &["X", "Y"], 50, 45),
            medicine("middle", &["X"], 90, 30),
        ];

        let results = find_substitutes(&reference, &pool).expect("results");
        let ids: Vec<&str> = results.iter().map(|result| result.medicine.id.as_str()).collect();

        assert_eq!(ids, vec!["strong", "middle", "weak"]);
        assert!(results.windows(2).all(|pair| pair[0].similarity_score >= pair[1].similarity_score));
    }

    #[test]
    fn equal_scores_keep_pool_order() {
        let reference = medicine("r", &["X"], 100, 0);
        let pool = vec![
            medicine("first", &["X"], 100, 20),
            medicine("second", &["X"], 100, 20),
            medicine("third", &["X"], 100, 20),
        ];

        let once = find_substitutes(&reference, &pool).expect("results");
        let twice = find_substitutes(&reference, &pool).expect("results");
        let ids: Vec<&str> = once.iter().map(|result| result.medicine.id.as_str()).collect();

        assert_eq!(ids, vec!["first", "second", "third"]);
        assert_eq!(once, twice);
    }

    #[test]
    fn pricier_candidate_with_no_overlap_clamps_to_zero_by_default() {
        let reference = medicine("r", &["X"], 10, 0);
        let pool = vec![medicine("costly", &["Z"], 100, 0)];

        let clamped = find_substitutes(&reference, &pool).expect("results");
        let unclamped = SubstituteRanker::new(ScorePolicy::Unclamped)
            .rank(&reference, &pool)
            .expect("results");

        assert_eq!(clamped[0].similarity_score, 0);
        assert_eq!(clamped[0].savings, 0);
        assert_eq!(clamped[0].price_difference, Decimal::new(-90, 0));
        assert_eq!(unclamped[0].similarity_score, -180);
    }

    #[test]
    fn empty_reference_composition_is_rejected_even_with_empty_pool() {
        let reference = medicine("r", &[], 100, 0);

        assert!(matches!(
            find_substitutes(&reference, &[]).unwrap_err(),
            DomainError::InvalidRecord(_)
        ));
        assert!(matches!(
            find_substitutes(&reference, &[medicine("s", &["X"], 10, 0)]).unwrap_err(),
            DomainError::InvalidRecord(_)
        ));
    }

    #[test]
    fn prices_too_far_apart_are_an_invalid_record() {
        let reference =
            Medicine::new("r", "Tiny", "generic", vec!["X".to_string()], Decimal::new(1, 10));
        let candidate = Medicine::new(
            "s",
            "Huge",
            "generic",
            vec!["X".to_string()],
            Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0),
        );
        assert!(reference.validate().is_ok());
        assert!(candidate.validate().is_ok());

        let error = find_substitutes(&reference, &[candidate]).unwrap_err();

        assert!(matches!(
            error,
            DomainError::InvalidRecord(ref message) if message.contains("too far apart")
        ));
    }

    #[test]
    fn repeated_candidates_are_ranked_once() {
        let reference = medicine("r", &["X"], 100, 0);
        let pool = vec![medicine("s", &["X"], 80, 0), medicine("s", &["X"], 80, 0)];

        let results = find_substitutes(&reference, &pool).expect("results");

        assert_eq!(results.len(), 1);
    }
}
