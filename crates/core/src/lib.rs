pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod interactions;
pub mod substitutes;

pub use catalog::{CandidateFilter, Page, PageRequest};
pub use domain::medicine::{
    Category, DosageForm, Medicine, MedicineComposition, MedicineDraft, MedicineId,
    MedicineSummary,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use interactions::{check_interactions, DetectionMode, InteractionDetector, InteractionReport};
pub use substitutes::{
    compare_substitutes, find_substitutes, ComparisonReport, ScorePolicy, SubstituteRanker,
    SubstituteResult,
};
