//! Drug interaction detection
//!
//! Scans every unordered pair of a small medicine set for documented
//! cross-reactivity (one medicine's interaction list naming the other) and
//! for shared active ingredients.

mod detector;
mod types;

pub use detector::{check_interactions, InteractionDetector};
pub use types::*;

/// Minimum number of distinct medicines an interaction check accepts.
pub const MIN_MEDICINES: usize = 2;

pub const INTERACTIONS_FOUND_RECOMMENDATION: &str = "Potential interactions detected. Please consult with a healthcare professional before taking these medicines together.";

pub const NO_INTERACTIONS_RECOMMENDATION: &str = "No known interactions detected. However, always consult your doctor before combining medications.";
