//! Types for the interaction detector

use serde::{Deserialize, Serialize};

use crate::domain::medicine::{MedicineComposition, MedicineSummary};

/// Which interaction lists are consulted for a pair `(a, b)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// Only `a`'s interaction list is matched against `b`'s names.
    Directional,
    /// Either list naming the other medicine counts.
    #[default]
    Bidirectional,
}

impl DetectionMode {
    pub fn from_bidirectional(bidirectional: bool) -> Self {
        if bidirectional {
            Self::Bidirectional
        } else {
            Self::Directional
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Moderate,
}

/// A documented cross-reactivity between two medicines of the checked set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionResult {
    pub medicine1: MedicineSummary,
    pub medicine2: MedicineSummary,
    pub severity: Severity,
    pub description: String,
}

/// Outcome of a full pairwise check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionReport {
    pub has_interactions: bool,
    pub interaction_count: usize,
    pub warning_count: usize,
    pub medicines: Vec<MedicineComposition>,
    pub interactions: Vec<InteractionResult>,
    /// Duplicate-ingredient warnings, one per pair sharing an ingredient.
    pub warnings: Vec<String>,
    pub recommendation: String,
}
