//! Catalog query shapes shared by every `MedicineRepository` implementation.

use serde::{Deserialize, Serialize};

use crate::domain::medicine::{Medicine, MedicineId};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_SEARCH_LIMIT: usize = 20;
pub const DEFAULT_CATEGORY_LIMIT: usize = 50;

/// Substitute candidates for a reference: every other medicine sharing its
/// generic name or at least one exact ingredient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateFilter {
    pub exclude_id: MedicineId,
    pub composition: Vec<String>,
    pub generic_name: String,
    pub limit: usize,
}

impl CandidateFilter {
    pub fn for_reference(reference: &Medicine, limit: usize) -> Self {
        Self {
            exclude_id: reference.id.clone(),
            composition: reference.composition.clone(),
            generic_name: reference.generic_name.clone(),
            limit,
        }
    }

    pub fn matches(&self, medicine: &Medicine) -> bool {
        if medicine.id == self.exclude_id {
            return false;
        }
        medicine.generic_name == self.generic_name
            || medicine.composition.iter().any(|ingredient| self.composition.contains(ingredient))
    }
}

/// Trimmed, non-blank ids in first-seen order with repeats removed.
pub fn distinct_ids<S: AsRef<str>>(raw: &[S]) -> Vec<MedicineId> {
    let mut ids: Vec<MedicineId> = Vec::with_capacity(raw.len());
    for value in raw {
        let id = MedicineId::from(value.as_ref().trim());
        if !id.as_str().is_empty() && !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

/// Reorder catalog results to follow `requested`; records not requested sort last.
pub fn in_request_order(mut found: Vec<Medicine>, requested: &[MedicineId]) -> Vec<Medicine> {
    found.sort_by_key(|medicine| {
        requested.iter().position(|id| id == &medicine.id).unwrap_or(usize::MAX)
    });
    found
}

/// A normalized page request: `page >= 1`, `1 <= limit <= max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: DEFAULT_PAGE_SIZE }
    }
}

impl PageRequest {
    pub fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32, max_limit: u32) -> Self {
        let max_limit = max_limit.max(1);
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, max_limit),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self { items, total, page: request.page, pages: total.div_ceil(u64::from(request.limit)) }
    }
}
