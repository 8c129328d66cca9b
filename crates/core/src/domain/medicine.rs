use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

pub const DEFAULT_CURRENCY: &str = "INR";
pub const DEFAULT_STORAGE: &str = "Store in a cool, dry place away from direct sunlight";
pub const MAX_RATING: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MedicineId(pub String);

impl MedicineId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MedicineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MedicineId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DosageForm {
    Tablet,
    Capsule,
    Syrup,
    Injection,
    Cream,
    Ointment,
    Drops,
    Inhaler,
    Powder,
    Other,
}

impl DosageForm {
    pub const ALL: [Self; 10] = [
        Self::Tablet,
        Self::Capsule,
        Self::Syrup,
        Self::Injection,
        Self::Cream,
        Self::Ointment,
        Self::Drops,
        Self::Inhaler,
        Self::Powder,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tablet => "Tablet",
            Self::Capsule => "Capsule",
            Self::Syrup => "Syrup",
            Self::Injection => "Injection",
            Self::Cream => "Cream",
            Self::Ointment => "Ointment",
            Self::Drops => "Drops",
            Self::Inhaler => "Inhaler",
            Self::Powder => "Powder",
            Self::Other => "Other",
        }
    }
}

impl FromStr for DosageForm {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim();
        Self::ALL
            .into_iter()
            .find(|form| form.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| DomainError::InvalidRecord(format!("unknown dosage form `{needle}`")))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Antibiotic,
    Painkiller,
    Antiviral,
    Antifungal,
    Vitamin,
    Supplement,
    Cardiac,
    Diabetic,
    Other,
}

impl Category {
    pub const ALL: [Self; 9] = [
        Self::Antibiotic,
        Self::Painkiller,
        Self::Antiviral,
        Self::Antifungal,
        Self::Vitamin,
        Self::Supplement,
        Self::Cardiac,
        Self::Diabetic,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Antibiotic => "Antibiotic",
            Self::Painkiller => "Painkiller",
            Self::Antiviral => "Antiviral",
            Self::Antifungal => "Antifungal",
            Self::Vitamin => "Vitamin",
            Self::Supplement => "Supplement",
            Self::Cardiac => "Cardiac",
            Self::Diabetic => "Diabetic",
            Self::Other => "Other",
        }
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| DomainError::InvalidRecord(format!("unknown category `{needle}`")))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    #[serde(with = "rust_decimal::serde::float")]
    pub mrp: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub discounted: Option<Decimal>,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Price {
    pub fn mrp(mrp: Decimal) -> Self {
        Self { mrp, discounted: None, currency: DEFAULT_CURRENCY.to_string() }
    }
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ratings {
    #[serde(with = "rust_decimal::serde::float")]
    pub average: Decimal,
    #[serde(default)]
    pub count: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DosageGuidance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adult: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elderly: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub in_stock: bool,
    pub last_updated: DateTime<Utc>,
}

/// A catalog record. Immutable from the point of view of the scoring and
/// detection algorithms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    pub id: MedicineId,
    pub name: String,
    pub generic_name: String,
    pub brand_name: String,
    pub manufacturer: String,
    pub composition: Vec<String>,
    pub dosage_form: DosageForm,
    pub strength: String,
    pub price: Price,
    pub category: Category,
    pub prescription_required: bool,
    pub description: String,
    pub uses: Vec<String>,
    pub side_effects: Vec<String>,
    pub precautions: Vec<String>,
    pub contraindications: Vec<String>,
    pub interactions: Vec<String>,
    pub dosage: DosageGuidance,
    pub storage: String,
    pub availability: Availability,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    pub ratings: Ratings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Medicine {
    /// Minimal record with catalog defaults for every descriptive field.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        generic_name: impl Into<String>,
        composition: Vec<String>,
        mrp: Decimal,
    ) -> Self {
        let now = Utc::now();
        let name = name.into();
        Self {
            id: MedicineId(id.into()),
            brand_name: name.clone(),
            name,
            generic_name: generic_name.into(),
            manufacturer: String::new(),
            composition,
            dosage_form: DosageForm::Tablet,
            strength: String::new(),
            price: Price::mrp(mrp),
            category: Category::Other,
            prescription_required: false,
            description: String::new(),
            uses: Vec::new(),
            side_effects: Vec::new(),
            precautions: Vec::new(),
            contraindications: Vec::new(),
            interactions: Vec::new(),
            dosage: DosageGuidance::default(),
            storage: DEFAULT_STORAGE.to_string(),
            availability: Availability { in_stock: true, last_updated: now },
            barcode: None,
            ratings: Ratings::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_rating(mut self, average: Decimal) -> Self {
        self.ratings.average = average;
        self
    }

    pub fn with_interactions(mut self, interactions: Vec<String>) -> Self {
        self.interactions = interactions;
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = manufacturer.into();
        self
    }

    pub fn summary(&self) -> MedicineSummary {
        MedicineSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            generic_name: self.generic_name.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidRecord(format!("medicine `{}` has no name", self.id)));
        }
        if self.generic_name.trim().is_empty() {
            return Err(DomainError::InvalidRecord(format!(
                "medicine `{}` has no generic name",
                self.id
            )));
        }
        if self.composition.is_empty() {
            return Err(DomainError::InvalidRecord(format!(
                "medicine `{}` has an empty composition",
                self.id
            )));
        }
        if self.composition.iter().any(|ingredient| ingredient.trim().is_empty()) {
            return Err(DomainError::InvalidRecord(format!(
                "medicine `{}` lists a blank ingredient",
                self.id
            )));
        }
        if self.price.mrp < Decimal::ZERO {
            return Err(DomainError::InvalidRecord(format!(
                "medicine `{}` has a negative mrp",
                self.id
            )));
        }
        let rating = self.ratings.average;
        if rating < Decimal::ZERO || rating > MAX_RATING {
            return Err(DomainError::InvalidRecord(format!(
                "medicine `{}` has a rating outside 0..=5",
                self.id
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineSummary {
    pub id: MedicineId,
    pub name: String,
    pub generic_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineComposition {
    pub id: MedicineId,
    pub name: String,
    pub generic_name: String,
    pub composition: Vec<String>,
}

impl From<&Medicine> for MedicineComposition {
    fn from(medicine: &Medicine) -> Self {
        Self {
            id: medicine.id.clone(),
            name: medicine.name.clone(),
            generic_name: medicine.generic_name.clone(),
            composition: medicine.composition.clone(),
        }
    }
}

/// Create/update payload for catalog writes. Identity, timestamps and
/// ratings are owned by the catalog, not the caller.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineDraft {
    pub name: String,
    pub generic_name: String,
    #[serde(default)]
    pub brand_name: Option<String>,
    pub manufacturer: String,
    pub composition: Vec<String>,
    pub dosage_form: DosageForm,
    pub strength: String,
    pub price: Price,
    pub category: Category,
    #[serde(default)]
    pub prescription_required: bool,
    pub description: String,
    #[serde(default)]
    pub uses: Vec<String>,
    #[serde(default)]
    pub side_effects: Vec<String>,
    #[serde(default)]
    pub precautions: Vec<String>,
    #[serde(default)]
    pub contraindications: Vec<String>,
    #[serde(default)]
    pub interactions: Vec<String>,
    #[serde(default)]
    pub dosage: DosageGuidance,
    #[serde(default)]
    pub storage: Option<String>,
    #[serde(default)]
    pub in_stock: Option<bool>,
    #[serde(default)]
    pub barcode: Option<String>,
}

impl MedicineDraft {
    pub fn into_medicine(self, id: MedicineId, now: DateTime<Utc>) -> Result<Medicine, DomainError> {
        let in_stock = self.in_stock.unwrap_or(true);
        let medicine = Medicine {
            id,
            brand_name: self
                .brand_name
                .map(|value| value.trim().to_string())
                .unwrap_or_else(|| self.name.trim().to_string()),
            name: self.name.trim().to_string(),
            generic_name: self.generic_name.trim().to_string(),
            manufacturer: self.manufacturer.trim().to_string(),
            composition: trimmed(self.composition),
            dosage_form: self.dosage_form,
            strength: self.strength.trim().to_string(),
            price: self.price,
            category: self.category,
            prescription_required: self.prescription_required,
            description: self.description,
            uses: self.uses,
            side_effects: self.side_effects,
            precautions: self.precautions,
            contraindications: self.contraindications,
            interactions: trimmed(self.interactions),
            dosage: self.dosage,
            storage: self.storage.unwrap_or_else(|| DEFAULT_STORAGE.to_string()),
            availability: Availability { in_stock, last_updated: now },
            barcode: self.barcode,
            ratings: Ratings::default(),
            created_at: now,
            updated_at: now,
        };

        if medicine.manufacturer.is_empty() {
            return Err(DomainError::InvalidRecord("manufacturer is required".to_string()));
        }
        medicine.validate()?;
        Ok(medicine)
    }

    /// Replace every caller-owned field of `existing`.
    pub fn apply_to(self, existing: &Medicine, now: DateTime<Utc>) -> Result<Medicine, DomainError> {
        let mut updated = self.into_medicine(existing.id.clone(), now)?;
        updated.ratings = existing.ratings.clone();
        updated.created_at = existing.created_at;
        Ok(updated)
    }
}

fn trimmed(values: Vec<String>) -> Vec<String> {
    values.into_iter().map(|value| value.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::{Category, DosageForm, Medicine, MedicineDraft, MedicineId};
    use crate::errors::DomainError;

    fn draft() -> MedicineDraft {
        serde_json::from_value(serde_json::json!({
            "name": " Crocin 500 ",
            "genericName": "Paracetamol",
            "manufacturer": "GSK",
            "composition": ["Paracetamol "],
            "dosageForm": "Tablet",
            "strength": "500mg",
            "price": { "mrp": 30.5 },
            "category": "Painkiller",
            "description": "Fever and mild pain relief"
        }))
        .expect("draft should deserialize")
    }

    #[test]
    fn draft_fills_catalog_defaults_and_trims_fields() {
        let medicine = draft()
            .into_medicine(MedicineId::from("med-1"), Utc::now())
            .expect("valid draft");

        assert_eq!(medicine.name, "Crocin 500");
        assert_eq!(medicine.brand_name, "Crocin 500");
        assert_eq!(medicine.composition, vec!["Paracetamol".to_string()]);
        assert_eq!(medicine.price.currency, "INR");
        assert_eq!(medicine.price.mrp, Decimal::new(305, 1));
        assert!(medicine.availability.in_stock);
        assert_eq!(medicine.ratings.average, Decimal::ZERO);
    }

    #[test]
    fn draft_with_empty_composition_is_rejected() {
        let mut draft = draft();
        draft.composition.clear();

        let error = draft.into_medicine(MedicineId::from("med-1"), Utc::now()).unwrap_err();
        assert!(matches!(error, DomainError::InvalidRecord(ref message) if message.contains("composition")));
    }

    #[test]
    fn update_preserves_identity_ratings_and_creation_time() {
        let existing = Medicine::new(
            "med-9",
            "Old",
            "Paracetamol",
            vec!["Paracetamol".to_string()],
            Decimal::new(20, 0),
        )
        .with_rating(Decimal::new(42, 1));

        let updated = draft().apply_to(&existing, Utc::now()).expect("valid update");

        assert_eq!(updated.id, existing.id);
        assert_eq!(updated.created_at, existing.created_at);
        assert_eq!(updated.ratings.average, Decimal::new(42, 1));
        assert_eq!(updated.name, "Crocin 500");
    }

    #[test]
    fn validation_rejects_out_of_range_rating() {
        let medicine =
            Medicine::new("m", "A", "a", vec!["x".to_string()], Decimal::ONE).with_rating(Decimal::new(51, 1));

        assert!(medicine.validate().is_err());
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("tablet".parse::<DosageForm>().ok(), Some(DosageForm::Tablet));
        assert_eq!("CARDIAC".parse::<Category>().ok(), Some(Category::Cardiac));
        assert!("herbal".parse::<Category>().is_err());
    }

    #[test]
    fn medicine_serializes_with_camel_case_and_numeric_prices() {
        let mut medicine =
            Medicine::new("m-1", "Dolo 650", "Paracetamol", vec!["Paracetamol".to_string()], Decimal::new(3050, 2));
        medicine.price.discounted = Some(Decimal::new(28, 0));

        let value = serde_json::to_value(&medicine).expect("serialize");

        assert_eq!(value["genericName"], "Paracetamol");
        assert_eq!(value["price"]["mrp"], 30.5);
        assert_eq!(value["price"]["discounted"], 28.0);
        assert_eq!(value["availability"]["inStock"], true);
    }
}
