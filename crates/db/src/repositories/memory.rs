use std::collections::HashSet;

use tokio::sync::RwLock;

use medicord_core::catalog::{CandidateFilter, Page, PageRequest};
use medicord_core::domain::medicine::{Category, Medicine, MedicineId};

use super::{barcode_conflict, normalize_query, MedicineRepository, RepositoryError};

/// Catalog held in insertion order; replacing a record keeps its slot.
#[derive(Default)]
pub struct InMemoryMedicineRepository {
    medicines: RwLock<Vec<Medicine>>,
}

impl InMemoryMedicineRepository {
    pub fn with_medicines(medicines: Vec<Medicine>) -> Self {
        Self { medicines: RwLock::new(medicines) }
    }
}

fn matches_query(medicine: &Medicine, needle: &str) -> bool {
    [&medicine.name, &medicine.generic_name, &medicine.brand_name]
        .into_iter()
        .chain(medicine.composition.iter())
        .any(|field| field.to_ascii_lowercase().contains(needle))
}

#[async_trait::async_trait]
impl MedicineRepository for InMemoryMedicineRepository {
    async fn find_by_id(&self, id: &MedicineId) -> Result<Option<Medicine>, RepositoryError> {
        let medicines = self.medicines.read().await;
        Ok(medicines.iter().find(|medicine| &medicine.id == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[MedicineId]) -> Result<Vec<Medicine>, RepositoryError> {
        let wanted: HashSet<&MedicineId> = ids.iter().collect();
        let medicines = self.medicines.read().await;
        Ok(medicines.iter().filter(|medicine| wanted.contains(&medicine.id)).cloned().collect())
    }

    async fn find_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<Medicine>, RepositoryError> {
        let medicines = self.medicines.read().await;
        Ok(medicines
            .iter()
            .filter(|medicine| filter.matches(medicine))
            .take(filter.limit)
            .cloned()
            .collect())
    }

    async fn list(&self, request: PageRequest) -> Result<Page<Medicine>, RepositoryError> {
        let medicines = self.medicines.read().await;
        let mut ordered: Vec<(usize, &Medicine)> = medicines.iter().enumerate().collect();
        ordered.sort_by(|(left_slot, left), (right_slot, right)| {
            right.created_at.cmp(&left.created_at).then(right_slot.cmp(left_slot))
        });

        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let items = ordered
            .into_iter()
            .skip(offset)
            .take(request.limit as usize)
            .map(|(_, medicine)| medicine.clone())
            .collect();
        Ok(Page::new(items, medicines.len() as u64, request))
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Medicine>, RepositoryError> {
        let Some(needle) = normalize_query(query) else {
            return Ok(Vec::new());
        };
        let medicines = self.medicines.read().await;
        Ok(medicines
            .iter()
            .filter(|medicine| matches_query(medicine, &needle))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_by_category(
        &self,
        category: Category,
        limit: usize,
    ) -> Result<Vec<Medicine>, RepositoryError> {
        let medicines = self.medicines.read().await;
        Ok(medicines
            .iter()
            .filter(|medicine| medicine.category == category)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn save(&self, medicine: Medicine) -> Result<(), RepositoryError> {
        let mut medicines = self.medicines.write().await;
        if medicine.barcode.is_some()
            && medicines.iter().any(|existing| {
                existing.id != medicine.id && existing.barcode == medicine.barcode
            })
        {
            return Err(barcode_conflict(&medicine));
        }
        match medicines.iter_mut().find(|existing| existing.id == medicine.id) {
            Some(existing) => *existing = medicine,
            None => medicines.push(medicine),
        }
        Ok(())
    }

    async fn delete(&self, id: &MedicineId) -> Result<bool, RepositoryError> {
        let mut medicines = self.medicines.write().await;
        let before = medicines.len();
        medicines.retain(|medicine| &medicine.id != id);
        Ok(medicines.len() < before)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.medicines.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use medicord_core::catalog::{CandidateFilter, PageRequest};
    use medicord_core::domain::medicine::{Category, Medicine, MedicineId};

    use crate::repositories::{InMemoryMedicineRepository, MedicineRepository};

    fn medicine(id: &str, generic: &str, composition: &[&str]) -> Medicine {
        Medicine::new(
            id,
            id.to_uppercase(),
            generic,
            composition.iter().map(|value| value.to_string()).collect(),
            Decimal::TEN,
        )
    }

    #[tokio::test]
    async fn in_memory_repo_round_trip_and_upsert_keeps_slot() {
        let repo = InMemoryMedicineRepository::default();
        repo.save(medicine("a", "alpha", &["X"])).await.expect("save a");
        repo.save(medicine("b", "beta", &["Y"])).await.expect("save b");

        let mut updated = medicine("a", "alpha", &["Z"]);
        updated.name = "Renamed".to_string();
        repo.save(updated.clone()).await.expect("upsert a");

        let found = repo.find_by_id(&MedicineId::from("a")).await.expect("find");
        let all = repo.find_by_ids(&["b", "a"].map(MedicineId::from)).await.expect("find all");

        assert_eq!(found, Some(updated));
        assert_eq!(all[0].id.as_str(), "a");
        assert_eq!(repo.count().await.expect("count"), 2);
    }

    #[tokio::test]
    async fn in_memory_candidates_follow_the_filter() {
        let reference = medicine("ref", "Paracetamol", &["Paracetamol"]);
        let repo = InMemoryMedicineRepository::with_medicines(vec![
            reference.clone(),
            medicine("same-generic", "Paracetamol", &["Acetaminophen"]),
            medicine("unrelated", "Ibuprofen", &["Ibuprofen"]),
            medicine("shared", "Combination", &["Ibuprofen", "Paracetamol"]),
        ]);

        let candidates = repo
            .find_candidates(&CandidateFilter::for_reference(&reference, 10))
            .await
            .expect("candidates");
        let ids: Vec<&str> = candidates.iter().map(|medicine| medicine.id.as_str()).collect();

        assert_eq!(ids, vec!["same-generic", "shared"]);
    }

    #[tokio::test]
    async fn in_memory_list_is_newest_first() {
        let base = Utc::now();
        let mut older = medicine("older", "g", &["X"]);
        older.created_at = base - Duration::minutes(5);
        let newer = medicine("newer", "g", &["X"]);
        let repo = InMemoryMedicineRepository::with_medicines(vec![older, newer]);

        let page = repo.list(PageRequest { page: 1, limit: 1 }).await.expect("list");

        assert_eq!(page.items[0].id.as_str(), "newer");
        assert_eq!(page.total, 2);
        assert_eq!(page.pages, 2);
    }

    #[tokio::test]
    async fn in_memory_search_category_and_delete() {
        let repo = InMemoryMedicineRepository::with_medicines(vec![
            medicine("crocin", "Paracetamol", &["Paracetamol"]).with_category(Category::Painkiller),
            medicine("mox", "Amoxicillin", &["Amoxicillin"]).with_category(Category::Antibiotic),
        ]);

        assert_eq!(repo.search("AMOXI", 20).await.expect("search").len(), 1);
        assert_eq!(
            repo.list_by_category(Category::Painkiller, 50).await.expect("category").len(),
            1
        );
        assert!(repo.delete(&MedicineId::from("mox")).await.expect("delete"));
        assert!(repo.search("amoxi", 20).await.expect("search").is_empty());
    }
}
