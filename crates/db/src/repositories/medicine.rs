use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Row, Sqlite};

use medicord_core::catalog::{CandidateFilter, Page, PageRequest};
use medicord_core::domain::medicine::{
    Availability, Category, DosageForm, DosageGuidance, Medicine, MedicineId, Price, Ratings,
};

use super::{barcode_conflict, normalize_query, MedicineRepository, RepositoryError};
use crate::DbPool;

const MEDICINE_COLUMNS: &str = "m.id, m.name, m.generic_name, m.brand_name, m.manufacturer,
    m.composition_json, m.dosage_form, m.strength, m.price_mrp, m.price_discounted, m.currency,
    m.category, m.prescription_required, m.description, m.uses_json, m.side_effects_json,
    m.precautions_json, m.contraindications_json, m.interactions_json, m.dosage_adult,
    m.dosage_child, m.dosage_elderly, m.storage, m.in_stock, m.availability_updated_at,
    m.barcode, m.rating_average, m.rating_count, m.created_at, m.updated_at";

pub struct SqlMedicineRepository {
    pool: DbPool,
}

impl SqlMedicineRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn select<'a>() -> QueryBuilder<'a, Sqlite> {
        QueryBuilder::new(format!("SELECT {MEDICINE_COLUMNS} FROM medicine m"))
    }
}

fn decode_err(error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| decode_err(format!("{column}: {error}")))
}

fn parse_decimal(column: &str, value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value).map_err(|error| decode_err(format!("{column}: {error}")))
}

fn json_list(column: &str, value: &str) -> Result<Vec<String>, RepositoryError> {
    serde_json::from_str(value).map_err(|error| decode_err(format!("{column}: {error}")))
}

fn to_json_list(values: &[String]) -> Result<String, RepositoryError> {
    serde_json::to_string(values).map_err(decode_err)
}

fn like_pattern(needle: &str) -> String {
    let escaped = needle.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

fn row_to_medicine(row: &sqlx::sqlite::SqliteRow) -> Result<Medicine, RepositoryError> {
    let text = |column: &str| -> Result<String, RepositoryError> {
        row.try_get::<String, _>(column).map_err(decode_err)
    };
    let optional = |column: &str| -> Result<Option<String>, RepositoryError> {
        row.try_get::<Option<String>, _>(column).map_err(decode_err)
    };

    let dosage_form = DosageForm::from_str(&text("dosage_form")?).map_err(decode_err)?;
    let category = Category::from_str(&text("category")?).map_err(decode_err)?;
    let discounted = optional("price_discounted")?
        .map(|value| parse_decimal("price_discounted", &value))
        .transpose()?;
    let rating_count: i64 = row.try_get("rating_count").map_err(decode_err)?;

    Ok(Medicine {
        id: MedicineId(text("id")?),
        name: text("name")?,
        generic_name: text("generic_name")?,
        brand_name: text("brand_name")?,
        manufacturer: text("manufacturer")?,
        composition: json_list("composition_json", &text("composition_json")?)?,
        dosage_form,
        strength: text("strength")?,
        price: Price {
            mrp: parse_decimal("price_mrp", &text("price_mrp")?)?,
            discounted,
            currency: text("currency")?,
        },
        category,
        prescription_required: row.try_get("prescription_required").map_err(decode_err)?,
        description: text("description")?,
        uses: json_list("uses_json", &text("uses_json")?)?,
        side_effects: json_list("side_effects_json", &text("side_effects_json")?)?,
        precautions: json_list("precautions_json", &text("precautions_json")?)?,
        contraindications: json_list("contraindications_json", &text("contraindications_json")?)?,
        interactions: json_list("interactions_json", &text("interactions_json")?)?,
        dosage: DosageGuidance {
            adult: optional("dosage_adult")?,
            child: optional("dosage_child")?,
            elderly: optional("dosage_elderly")?,
        },
        storage: text("storage")?,
        availability: Availability {
            in_stock: row.try_get("in_stock").map_err(decode_err)?,
            last_updated: parse_timestamp(
                "availability_updated_at",
                &text("availability_updated_at")?,
            )?,
        },
        barcode: optional("barcode")?,
        ratings: Ratings {
            average: parse_decimal("rating_average", &text("rating_average")?)?,
            count: u32::try_from(rating_count).map_err(decode_err)?,
        },
        created_at: parse_timestamp("created_at", &text("created_at")?)?,
        updated_at: parse_timestamp("updated_at", &text("updated_at")?)?,
    })
}

#[async_trait::async_trait]
impl MedicineRepository for SqlMedicineRepository {
    async fn find_by_id(&self, id: &MedicineId) -> Result<Option<Medicine>, RepositoryError> {
        let mut query = Self::select();
        query.push(" WHERE m.id = ").push_bind(id.as_str());

        let row = query.build().fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_medicine).transpose()
    }

    async fn find_by_ids(&self, ids: &[MedicineId]) -> Result<Vec<Medicine>, RepositoryError> {
        let mut seen = HashSet::new();
        let distinct: Vec<&str> =
            ids.iter().map(MedicineId::as_str).filter(|id| seen.insert(*id)).collect();
        if distinct.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = Self::select();
        query.push(" WHERE m.id IN (");
        let mut separated = query.separated(", ");
        for id in distinct {
            separated.push_bind(id);
        }
        separated.push_unseparated(") ORDER BY m.rowid");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_medicine).collect()
    }

    async fn find_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<Medicine>, RepositoryError> {
        let mut query = Self::select();
        query
            .push(" WHERE m.id != ")
            .push_bind(filter.exclude_id.as_str())
            .push(" AND (m.generic_name = ")
            .push_bind(filter.generic_name.clone());

        if !filter.composition.is_empty() {
            query.push(
                " OR EXISTS (SELECT 1 FROM medicine_ingredient mi
                 WHERE mi.medicine_id = m.id AND mi.ingredient IN (",
            );
            let mut separated = query.separated(", ");
            for ingredient in &filter.composition {
                separated.push_bind(ingredient.clone());
            }
            separated.push_unseparated("))");
        }

        query
            .push(") ORDER BY m.rowid LIMIT ")
            .push_bind(i64::try_from(filter.limit).unwrap_or(i64::MAX));

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_medicine).collect()
    }

    async fn list(&self, request: PageRequest) -> Result<Page<Medicine>, RepositoryError> {
        let total = self.count().await?;

        let mut query = Self::select();
        query
            .push(" ORDER BY m.created_at DESC, m.rowid DESC LIMIT ")
            .push_bind(i64::from(request.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(request.offset()).unwrap_or(i64::MAX));

        let rows = query.build().fetch_all(&self.pool).await?;
        let items = rows.iter().map(row_to_medicine).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total, request))
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Medicine>, RepositoryError> {
        let Some(needle) = normalize_query(query) else {
            return Ok(Vec::new());
        };
        let pattern = like_pattern(&needle);

        let mut builder = Self::select();
        builder.push(" WHERE LOWER(m.name) LIKE ").push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR LOWER(m.generic_name) LIKE ").push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR LOWER(m.brand_name) LIKE ").push_bind(pattern.clone());
        builder
            .push(
                " ESCAPE '\\' OR EXISTS (SELECT 1 FROM medicine_ingredient mi
                 WHERE mi.medicine_id = m.id AND LOWER(mi.ingredient) LIKE ",
            )
            .push_bind(pattern)
            .push(" ESCAPE '\\') ORDER BY m.rowid LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_medicine).collect()
    }

    async fn list_by_category(
        &self,
        category: Category,
        limit: usize,
    ) -> Result<Vec<Medicine>, RepositoryError> {
        let mut query = Self::select();
        query
            .push(" WHERE m.category = ")
            .push_bind(category.as_str())
            .push(" ORDER BY m.rowid LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_medicine).collect()
    }

    async fn save(&self, medicine: Medicine) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO medicine
                (id, name, generic_name, brand_name, manufacturer, composition_json,
                 dosage_form, strength, price_mrp, price_discounted, currency, category,
                 prescription_required, description, uses_json, side_effects_json,
                 precautions_json, contraindications_json, interactions_json,
                 dosage_adult, dosage_child, dosage_elderly, storage, in_stock,
                 availability_updated_at, barcode, rating_average, rating_count,
                 created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                generic_name = excluded.generic_name,
                brand_name = excluded.brand_name,
                manufacturer = excluded.manufacturer,
                composition_json = excluded.composition_json,
                dosage_form = excluded.dosage_form,
                strength = excluded.strength,
                price_mrp = excluded.price_mrp,
                price_discounted = excluded.price_discounted,
                currency = excluded.currency,
                category = excluded.category,
                prescription_required = excluded.prescription_required,
                description = excluded.description,
                uses_json = excluded.uses_json,
                side_effects_json = excluded.side_effects_json,
                precautions_json = excluded.precautions_json,
                contraindications_json = excluded.contraindications_json,
                interactions_json = excluded.interactions_json,
                dosage_adult = excluded.dosage_adult,
                dosage_child = excluded.dosage_child,
                dosage_elderly = excluded.dosage_elderly,
                storage = excluded.storage,
                in_stock = excluded.in_stock,
                availability_updated_at = excluded.availability_updated_at,
                barcode = excluded.barcode,
                rating_average = excluded.rating_average,
                rating_count = excluded.rating_count,
                updated_at = excluded.updated_at",
        )
        .bind(medicine.id.as_str())
        .bind(&medicine.name)
        .bind(&medicine.generic_name)
        .bind(&medicine.brand_name)
        .bind(&medicine.manufacturer)
        .bind(to_json_list(&medicine.composition)?)
        .bind(medicine.dosage_form.as_str())
        .bind(&medicine.strength)
        .bind(medicine.price.mrp.to_string())
        .bind(medicine.price.discounted.map(|value| value.to_string()))
        .bind(&medicine.price.currency)
        .bind(medicine.category.as_str())
        .bind(medicine.prescription_required)
        .bind(&medicine.description)
        .bind(to_json_list(&medicine.uses)?)
        .bind(to_json_list(&medicine.side_effects)?)
        .bind(to_json_list(&medicine.precautions)?)
        .bind(to_json_list(&medicine.contraindications)?)
        .bind(to_json_list(&medicine.interactions)?)
        .bind(&medicine.dosage.adult)
        .bind(&medicine.dosage.child)
        .bind(&medicine.dosage.elderly)
        .bind(&medicine.storage)
        .bind(medicine.availability.in_stock)
        .bind(timestamp(&medicine.availability.last_updated))
        .bind(&medicine.barcode)
        .bind(medicine.ratings.average.to_string())
        .bind(i64::from(medicine.ratings.count))
        .bind(timestamp(&medicine.created_at))
        .bind(timestamp(&medicine.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(|error| match error {
            sqlx::Error::Database(ref database) if database.is_unique_violation() => {
                barcode_conflict(&medicine)
            }
            other => RepositoryError::Database(other),
        })?;

        sqlx::query("DELETE FROM medicine_ingredient WHERE medicine_id = ?")
            .bind(medicine.id.as_str())
            .execute(&mut *tx)
            .await?;

        for (position, ingredient) in medicine.composition.iter().enumerate() {
            sqlx::query(
                "INSERT INTO medicine_ingredient (medicine_id, position, ingredient)
                 VALUES (?, ?, ?)",
            )
            .bind(medicine.id.as_str())
            .bind(i64::try_from(position).map_err(decode_err)?)
            .bind(ingredient)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: &MedicineId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM medicine WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let total: i64 = sqlx::query("SELECT COUNT(*) AS count FROM medicine")
            .fetch_one(&self.pool)
            .await?
            .try_get("count")
            .map_err(decode_err)?;
        u64::try_from(total).map_err(decode_err)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use medicord_core::catalog::{CandidateFilter, PageRequest};
    use medicord_core::domain::medicine::{Category, Medicine, MedicineId};

    use super::SqlMedicineRepository;
    use crate::repositories::MedicineRepository;
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    fn medicine(id: &str, name: &str, generic: &str, composition: &[&str]) -> Medicine {
        Medicine::new(
            id,
            name,
            generic,
            composition.iter().map(|value| value.to_string()).collect(),
            Decimal::new(2550, 2),
        )
        .with_manufacturer("Acme Pharma")
    }

    #[tokio::test]
    async fn save_and_find_by_id_round_trips_every_field() {
        let repo = SqlMedicineRepository::new(setup_pool().await);
        let mut original = medicine("crocin", "Crocin", "Paracetamol", &["Paracetamol"])
            .with_rating(Decimal::new(43, 1))
            .with_category(Category::Painkiller)
            .with_interactions(vec!["Warfarin".to_string()]);
        original.price.discounted = Some(Decimal::new(2199, 2));
        original.dosage.adult = Some("1 tablet every 6 hours".to_string());
        original.barcode = Some("8901234567890".to_string());

        repo.save(original.clone()).await.expect("save");
        let found = repo.find_by_id(&original.id).await.expect("find").expect("should exist");

        assert_eq!(found.price, original.price);
        assert_eq!(found.composition, original.composition);
        assert_eq!(found.interactions, original.interactions);
        assert_eq!(found.dosage, original.dosage);
        assert_eq!(found.ratings, original.ratings);
        assert_eq!(found.category, Category::Painkiller);
        assert_eq!(found.barcode, original.barcode);
        assert_eq!(found.created_at.timestamp_micros(), original.created_at.timestamp_micros());
    }

    #[tokio::test]
    async fn find_by_id_returns_none_for_unknown_id() {
        let repo = SqlMedicineRepository::new(setup_pool().await);

        let found = repo.find_by_id(&MedicineId::from("missing")).await.expect("find");

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn find_by_ids_skips_unknown_and_repeated_ids() {
        let repo = SqlMedicineRepository::new(setup_pool().await);
        repo.save(medicine("a", "A", "alpha", &["X"])).await.expect("save a");
        repo.save(medicine("b", "B", "beta", &["Y"])).await.expect("save b");

        let ids = ["b", "missing", "a", "b"].map(MedicineId::from);
        let found = repo.find_by_ids(&ids).await.expect("find");

        let names: Vec<&str> = found.iter().map(|medicine| medicine.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn candidates_share_generic_name_or_an_ingredient() {
        let repo = SqlMedicineRepository::new(setup_pool().await);
        let reference = medicine("ref", "Dolo 650", "Paracetamol", &["Paracetamol"]);
        repo.save(reference.clone()).await.expect("save ref");
        repo.save(medicine("crocin", "Crocin", "Paracetamol", &["Acetaminophen"]))
            .await
            .expect("save crocin");
        repo.save(medicine("combiflam", "Combiflam", "Ibuprofen", &["Ibuprofen", "Paracetamol"]))
            .await
            .expect("save combiflam");
        repo.save(medicine("brufen", "Brufen", "Ibuprofen", &["Ibuprofen"]))
            .await
            .expect("save brufen");

        let candidates = repo
            .find_candidates(&CandidateFilter::for_reference(&reference, 10))
            .await
            .expect("candidates");
        let ids: Vec<&str> = candidates.iter().map(|medicine| medicine.id.as_str()).collect();
        assert_eq!(ids, vec!["crocin", "combiflam"]);

        let limited = repo
            .find_candidates(&CandidateFilter::for_reference(&reference, 1))
            .await
            .expect("candidates");
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn save_rewrites_the_ingredient_index() {
        let repo = SqlMedicineRepository::new(setup_pool().await);
        let reference = medicine("ref", "Ref", "ref-generic", &["Paracetamol"]);
        repo.save(reference.clone()).await.expect("save ref");
        let mut other = medicine("other", "Other", "other-generic", &["Paracetamol"]);
        repo.save(other.clone()).await.expect("save other");

        other.composition = vec!["Ibuprofen".to_string()];
        repo.save(other).await.expect("update other");

        let candidates = repo
            .find_candidates(&CandidateFilter::for_reference(&reference, 10))
            .await
            .expect("candidates");
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn list_pages_newest_first() {
        let repo = SqlMedicineRepository::new(setup_pool().await);
        let base = Utc::now();
        for index in 0..5 {
            let mut record = medicine(&format!("m{index}"), &format!("M{index}"), "generic", &["X"]);
            record.created_at = base + Duration::seconds(index);
            repo.save(record).await.expect("save");
        }

        let first = repo.list(PageRequest { page: 1, limit: 2 }).await.expect("page 1");
        let last = repo.list(PageRequest { page: 3, limit: 2 }).await.expect("page 3");

        assert_eq!(first.total, 5);
        assert_eq!(first.pages, 3);
        assert_eq!(first.items[0].id.as_str(), "m4");
        assert_eq!(first.items[1].id.as_str(), "m3");
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].id.as_str(), "m0");
    }

    #[tokio::test]
    async fn search_is_case_insensitive_across_names_and_composition() {
        let repo = SqlMedicineRepository::new(setup_pool().await);
        repo.save(medicine("crocin", "Crocin", "Paracetamol", &["Paracetamol"]))
            .await
            .expect("save crocin");
        repo.save(medicine("brufen", "Brufen", "Ibuprofen", &["Ibuprofen"]))
            .await
            .expect("save brufen");
        repo.save(medicine("combiflam", "Combiflam", "Combination", &["Ibuprofen", "Paracetamol"]))
            .await
            .expect("save combiflam");

        let by_name = repo.search("CROC", 20).await.expect("search");
        let by_ingredient = repo.search("paraceta", 20).await.expect("search");
        let wildcard = repo.search("%", 20).await.expect("search");
        let blank = repo.search("   ", 20).await.expect("search");

        assert_eq!(by_name.len(), 1);
        assert_eq!(by_ingredient.len(), 2);
        assert!(wildcard.is_empty());
        assert!(blank.is_empty());
    }

    #[tokio::test]
    async fn list_by_category_respects_limit() {
        let repo = SqlMedicineRepository::new(setup_pool().await);
        for index in 0..3 {
            repo.save(
                medicine(&format!("p{index}"), "Pain", "generic", &["X"])
                    .with_category(Category::Painkiller),
            )
            .await
            .expect("save");
        }
        repo.save(medicine("a", "Anti", "generic", &["Y"]).with_category(Category::Antibiotic))
            .await
            .expect("save");

        let pain = repo.list_by_category(Category::Painkiller, 2).await.expect("list");
        let antibiotics = repo.list_by_category(Category::Antibiotic, 50).await.expect("list");

        assert_eq!(pain.len(), 2);
        assert_eq!(antibiotics.len(), 1);
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_was_removed() {
        let repo = SqlMedicineRepository::new(setup_pool().await);
        repo.save(medicine("a", "A", "alpha", &["X"])).await.expect("save");

        assert!(repo.delete(&MedicineId::from("a")).await.expect("delete"));
        assert!(!repo.delete(&MedicineId::from("a")).await.expect("delete again"));
        assert_eq!(repo.count().await.expect("count"), 0);
    }
}
