use async_trait::async_trait;
use thiserror::Error;

use medicord_core::catalog::{CandidateFilter, Page, PageRequest};
use medicord_core::domain::medicine::{Category, Medicine, MedicineId};
use medicord_core::errors::{ApplicationError, DomainError};

pub mod medicine;
pub mod memory;

pub use medicine::SqlMedicineRepository;
pub use memory::InMemoryMedicineRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Conflict(message) => {
                ApplicationError::Domain(DomainError::InvalidRecord(message))
            }
            other => ApplicationError::Persistence(other.to_string()),
        }
    }
}

/// Read and write access to the medicine catalog.
#[async_trait]
pub trait MedicineRepository: Send + Sync {
    async fn find_by_id(&self, id: &MedicineId) -> Result<Option<Medicine>, RepositoryError>;

    /// Every record whose id is in `ids`, in catalog insertion order. Unknown
    /// ids are skipped and repeated ids resolve once.
    async fn find_by_ids(&self, ids: &[MedicineId]) -> Result<Vec<Medicine>, RepositoryError>;

    /// Substitute candidates in catalog insertion order, at most `filter.limit`.
    async fn find_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<Medicine>, RepositoryError>;

    /// Newest first.
    async fn list(&self, request: PageRequest) -> Result<Page<Medicine>, RepositoryError>;

    /// Case-insensitive substring match over name, generic name, brand name
    /// and composition. Case folding covers ASCII letters only, matching
    /// SQLite's `LOWER`; other characters compare exactly.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Medicine>, RepositoryError>;

    async fn list_by_category(
        &self,
        category: Category,
        limit: usize,
    ) -> Result<Vec<Medicine>, RepositoryError>;

    /// Barcodes are unique across the catalog; reusing another record's
    /// barcode fails with `RepositoryError::Conflict`.
    async fn save(&self, medicine: Medicine) -> Result<(), RepositoryError>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: &MedicineId) -> Result<bool, RepositoryError>;

    async fn count(&self) -> Result<u64, RepositoryError>;
}

pub(crate) fn barcode_conflict(medicine: &Medicine) -> RepositoryError {
    RepositoryError::Conflict(format!(
        "barcode `{}` is already registered to another medicine",
        medicine.barcode.as_deref().unwrap_or_default()
    ))
}

/// ASCII-lowercased needle for substring search; `None` when blank.
pub(crate) fn normalize_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_ascii_lowercase())
}
