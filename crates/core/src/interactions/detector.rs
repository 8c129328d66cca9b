use std::collections::HashSet;

use crate::domain::medicine::{Medicine, MedicineComposition};
use crate::errors::DomainError;

use super::types::*;
use super::{INTERACTIONS_FOUND_RECOMMENDATION, MIN_MEDICINES, NO_INTERACTIONS_RECOMMENDATION};

/// Pairwise interaction scanner.
#[derive(Debug, Clone, Copy, Default)]
pub struct InteractionDetector {
    mode: DetectionMode,
}

impl InteractionDetector {
    pub fn new(mode: DetectionMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> DetectionMode {
        self.mode
    }

    /// Check every unordered pair of `medicines` exactly once.
    ///
    /// Records repeating an earlier id are ignored, so the set must hold at
    /// least [`MIN_MEDICINES`] distinct ids.
    pub fn check(&self, medicines: &[Medicine]) -> Result<InteractionReport, DomainError> {
        let medicines = distinct_by_id(medicines);
        if medicines.len() < MIN_MEDICINES {
            return Err(DomainError::InsufficientInput {
                required: MIN_MEDICINES,
                provided: medicines.len(),
            });
        }

        let mut interactions = Vec::new();
        let mut warnings = Vec::new();

        for (i, first) in medicines.iter().enumerate() {
            for second in &medicines[i + 1..] {
                if self.cross_reacts(first, second) {
                    interactions.push(InteractionResult {
                        medicine1: first.summary(),
                        medicine2: second.summary(),
                        severity: Severity::Moderate,
                        description: format!(
                            "Potential interaction between {} and {}. Consult your doctor.",
                            first.name, second.name
                        ),
                    });
                }

                let shared = shared_ingredients(first, second);
                if !shared.is_empty() {
                    warnings.push(format!(
                        "{} and {} contain similar active ingredients ({}). Avoid taking together unless prescribed.",
                        first.name,
                        second.name,
                        shared.join(", ")
                    ));
                }
            }
        }

        let has_interactions = !interactions.is_empty() || !warnings.is_empty();
        let recommendation = if has_interactions {
            INTERACTIONS_FOUND_RECOMMENDATION
        } else {
            NO_INTERACTIONS_RECOMMENDATION
        };

        Ok(InteractionReport {
            has_interactions,
            interaction_count: interactions.len(),
            warning_count: warnings.len(),
            medicines: medicines.iter().map(|medicine| MedicineComposition::from(*medicine)).collect(),
            interactions,
            warnings,
            recommendation: recommendation.to_string(),
        })
    }

    fn cross_reacts(&self, first: &Medicine, second: &Medicine) -> bool {
        match self.mode {
            DetectionMode::Directional => mentions(first, second),
            DetectionMode::Bidirectional => mentions(first, second) || mentions(second, first),
        }
    }
}

/// Detector with the default (bidirectional) mode.
pub fn check_interactions(medicines: &[Medicine]) -> Result<InteractionReport, DomainError> {
    InteractionDetector::default().check(medicines)
}

/// Whether any entry of `source.interactions` names `target`.
fn mentions(source: &Medicine, target: &Medicine) -> bool {
    let needles: Vec<String> = [&target.generic_name, &target.name]
        .into_iter()
        .map(|name| name.trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    if needles.is_empty() {
        return false;
    }

    source.interactions.iter().any(|interaction| {
        let haystack = interaction.to_lowercase();
        needles.iter().any(|needle| haystack.contains(needle.as_str()))
    })
}

/// Exact, case-sensitive intersection in `first`'s composition order.
fn shared_ingredients<'a>(first: &'a Medicine, second: &Medicine) -> Vec<&'a str> {
    let other: HashSet<&str> = second.composition.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    first
        .composition
        .iter()
        .map(String::as_str)
        .filter(|ingredient| other.contains(ingredient) && seen.insert(*ingredient))
        .collect()
}

fn distinct_by_id(medicines: &[Medicine]) -> Vec<&Medicine> {
    let mut seen = HashSet::new();
    medicines.iter().filter(|medicine| seen.insert(medicine.id.as_str())).collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{check_interactions, InteractionDetector};
    use crate::domain::medicine::Medicine;
    use crate::errors::DomainError;
    use crate::interactions::{
        DetectionMode, Severity, INTERACTIONS_FOUND_RECOMMENDATION, NO_INTERACTIONS_RECOMMENDATION,
    };

    fn medicine(id: &str, name: &str, generic: &str, composition: &[&str]) -> Medicine {
        Medicine::new(
            id,
            name,
            generic,
            composition.iter().map(|value| value.to_string()).collect(),
            Decimal::new(100, 0),
        )
    }

    fn aspirin() -> Medicine {
        medicine("asp", "Ecosprin", "Aspirin", &["Aspirin"])
            .with_interactions(vec!["Warfarin (increased bleeding risk)".to_string()])
    }

    fn warfarin() -> Medicine {
        medicine("war", "Warf 5", "Warfarin", &["Warfarin Sodium"])
    }

    #[test]
    fn fewer_than_two_medicines_is_insufficient_input() {
        assert_eq!(
            check_interactions(&[]).unwrap_err(),
            DomainError::InsufficientInput { required: 2, provided: 0 }
        );
        assert_eq!(
            check_interactions(&[aspirin()]).unwrap_err(),
            DomainError::InsufficientInput { required: 2, provided: 1 }
        );
    }

    #[test]
    fn repeated_ids_do_not_count_as_distinct_medicines() {
        let result = check_interactions(&[aspirin(), aspirin()]);

        assert_eq!(result.unwrap_err(), DomainError::InsufficientInput { required: 2, provided: 1 });
    }

    #[test]
    fn interaction_list_matching_generic_name_case_insensitively_is_reported() {
        let report = check_interactions(&[aspirin(), warfarin()]).expect("report");

        assert!(report.has_interactions);
        assert_eq!(report.interaction_count, 1);
        let interaction = &report.interactions[0];
        assert_eq!(interaction.medicine1.name, "Ecosprin");
        assert_eq!(interaction.medicine2.name, "Warf 5");
        assert_eq!(interaction.severity, Severity::Moderate);
        assert_eq!(
            interaction.description,
            "Potential interaction between Ecosprin and Warf 5. Consult your doctor."
        );
        assert_eq!(report.recommendation, INTERACTIONS_FOUND_RECOMMENDATION);
    }

    #[test]
    fn interaction_list_matching_brand_name_is_reported() {
        let first = medicine("a", "Brufen", "Ibuprofen", &["Ibuprofen"])
            .with_interactions(vec!["avoid with ECOSPRIN".to_string()]);

        let report = check_interactions(&[first, aspirin()]).expect("report");

        assert_eq!(report.interaction_count, 1);
    }

    #[test]
    fn directional_mode_only_consults_the_earlier_medicines_list() {
        let detector = InteractionDetector::new(DetectionMode::Directional);

        let forward = detector.check(&[aspirin(), warfarin()]).expect("report");
        let reverse = detector.check(&[warfarin(), aspirin()]).expect("report");

        assert_eq!(forward.interaction_count, 1);
        assert_eq!(reverse.interaction_count, 0);
        assert!(!reverse.has_interactions);
    }

    #[test]
    fn bidirectional_mode_reports_one_result_per_pair_in_input_order() {
        let report = check_interactions(&[warfarin(), aspirin()]).expect("report");

        assert_eq!(report.interaction_count, 1);
        assert_eq!(report.interactions[0].medicine1.name, "Warf 5");
        assert_eq!(report.interactions[0].medicine2.name, "Ecosprin");

        let mut reciprocal = warfarin();
        reciprocal.interactions = vec!["aspirin".to_string()];
        let both = check_interactions(&[reciprocal, aspirin()]).expect("report");
        assert_eq!(both.interaction_count, 1);
    }

    #[test]
    fn shared_ingredients_produce_a_warning_with_the_exact_intersection() {
        let combiflam = medicine("cf", "Combiflam", "Ibuprofen + Paracetamol", &["Ibuprofen", "Paracetamol"]);
        let crocin = medicine("cr", "Crocin", "Paracetamol", &["Paracetamol"]);

        let report = check_interactions(&[combiflam, crocin]).expect("report");

        assert_eq!(report.interaction_count, 0);
        assert_eq!(report.warning_count, 1);
        assert!(report.has_interactions);
        assert_eq!(
            report.warnings[0],
            "Combiflam and Crocin contain similar active ingredients (Paracetamol). Avoid taking together unless prescribed."
        );
    }

    #[test]
    fn composition_overlap_is_case_sensitive() {
        let first = medicine("a", "A", "a-generic", &["Paracetamol"]);
        let second = medicine("b", "B", "b-generic", &["paracetamol"]);

        let report = check_interactions(&[first, second]).expect("report");

        assert_eq!(report.warning_count, 0);
        assert!(!report.has_interactions);
        assert_eq!(report.recommendation, NO_INTERACTIONS_RECOMMENDATION);
    }

    #[test]
    fn every_unordered_pair_is_examined_once() {
        let a = medicine("a", "A", "alpha", &["X"]);
        let b = medicine("b", "B", "beta", &["X"]);
        let c = medicine("c", "C", "gamma", &["X"]);

        let report = check_interactions(&[a, b, c]).expect("report");

        assert_eq!(report.warning_count, 3);
        assert_eq!(report.medicines.len(), 3);
        assert_eq!(report.medicines[2].composition, vec!["X".to_string()]);
    }

    #[test]
    fn blank_names_never_match_interaction_text() {
        let mut unnamed = medicine("u", "", "", &["Y"]);
        unnamed.name = "  ".to_string();
        let talkative = medicine("t", "T", "tau", &["Z"]).with_interactions(vec!["anything".to_string()]);

        let report = check_interactions(&[talkative, unnamed]).expect("report");

        assert_eq!(report.interaction_count, 0);
    }
}
