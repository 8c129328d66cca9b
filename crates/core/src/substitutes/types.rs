//! Types for the substitute finder

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::medicine::{
    Availability, DosageForm, Medicine, MedicineId, Price, Ratings,
};

/// How the rounded total is reported as `similarityScore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorePolicy {
    /// Clamp into `0..=100`, the range of a match percentage.
    #[default]
    Clamped,
    /// Report the rounded weighted total as is.
    Unclamped,
}

impl ScorePolicy {
    pub fn from_clamp(clamp: bool) -> Self {
        if clamp {
            Self::Clamped
        } else {
            Self::Unclamped
        }
    }

    pub fn apply(&self, score: i64) -> i64 {
        match self {
            Self::Clamped => score.clamp(0, 100),
            Self::Unclamped => score,
        }
    }
}

/// Unrounded scoring components, each on a 0..100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    #[serde(with = "rust_decimal::serde::float")]
    pub composition_score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub rating_score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_score: Decimal,
}

/// A ranked alternative: the candidate record plus its scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstituteResult {
    #[serde(flatten)]
    pub medicine: Medicine,
    pub similarity_score: i64,
    /// Reference MRP minus candidate MRP; negative when the candidate costs more.
    #[serde(with = "rust_decimal::serde::float")]
    pub price_difference: Decimal,
    /// Percentage saved against the reference MRP, 0 when not cheaper.
    pub savings: i64,
    pub score_breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonEntry {
    pub id: MedicineId,
    pub name: String,
    pub generic_name: String,
    pub manufacturer: String,
    pub price: Price,
    pub composition: Vec<String>,
    pub dosage_form: DosageForm,
    pub strength: String,
    pub ratings: Ratings,
    pub availability: Availability,
}

impl From<&Medicine> for ComparisonEntry {
    fn from(medicine: &Medicine) -> Self {
        Self {
            id: medicine.id.clone(),
            name: medicine.name.clone(),
            generic_name: medicine.generic_name.clone(),
            manufacturer: medicine.manufacturer.clone(),
            price: medicine.price.clone(),
            composition: medicine.composition.clone(),
            dosage_form: medicine.dosage_form,
            strength: medicine.strength.clone(),
            ratings: medicine.ratings.clone(),
            availability: medicine.availability.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub medicines: Vec<ComparisonEntry>,
    pub cheapest: Medicine,
    pub highest_rated: Medicine,
}
