use std::collections::HashSet;

use crate::domain::medicine::Medicine;
use crate::errors::DomainError;

use super::types::{ComparisonEntry, ComparisonReport};
use super::MIN_COMPARE_MEDICINES;

/// Side-by-side view of `medicines` with the cheapest and highest-rated picks.
///
/// Repeated ids are dropped after their first occurrence. Ties go to the
/// earlier medicine.
pub fn compare_substitutes(medicines: &[Medicine]) -> Result<ComparisonReport, DomainError> {
    let mut seen = HashSet::new();
    let distinct: Vec<&Medicine> =
        medicines.iter().filter(|medicine| seen.insert(medicine.id.as_str())).collect();

    let (first, rest) = match distinct.split_first() {
        Some(split) if distinct.len() >= MIN_COMPARE_MEDICINES => split,
        _ => {
            return Err(DomainError::InsufficientInput {
                required: MIN_COMPARE_MEDICINES,
                provided: distinct.len(),
            })
        }
    };

    let mut cheapest = *first;
    let mut highest_rated = *first;
    for medicine in rest {
        if medicine.price.mrp < cheapest.price.mrp {
            cheapest = medicine;
        }
        if medicine.ratings.average > highest_rated.ratings.average {
            highest_rated = medicine;
        }
    }

    Ok(ComparisonReport {
        medicines: distinct.iter().map(|medicine| ComparisonEntry::from(*medicine)).collect(),
        cheapest: cheapest.clone(),
        highest_rated: highest_rated.clone(),
    })
}
