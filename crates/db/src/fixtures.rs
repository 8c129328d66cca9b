use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use medicord_core::domain::medicine::{Category, DosageForm, Medicine, MedicineId, Ratings};

use crate::repositories::{MedicineRepository, RepositoryError};

/// Demo catalog covering the interaction and substitute flows: paracetamol
/// brands for substitutes, an aspirin / warfarin / ibuprofen triangle for
/// interactions, and a combination product for duplicate-ingredient warnings.
const SEED_MEDICINES: &[SeedMedicine] = &[
    SeedMedicine {
        id: "seed-crocin-advance",
        name: "Crocin Advance",
        generic_name: "Paracetamol",
        manufacturer: "GSK Pharmaceuticals",
        composition: &["Paracetamol"],
        dosage_form: DosageForm::Tablet,
        strength: "500mg",
        mrp_paise: 3000,
        category: Category::Painkiller,
        prescription_required: false,
        description: "Fast-acting paracetamol for fever and mild to moderate pain.",
        uses: &["Fever", "Headache", "Body ache"],
        side_effects: &["Nausea", "Skin rash (rare)"],
        interactions: &["Warfarin (prolonged use may raise INR)", "Alcohol"],
        adult_dosage: "1-2 tablets every 4-6 hours, maximum 8 tablets a day",
        rating_tenths: 43,
        rating_count: 1280,
    },
    SeedMedicine {
        id: "seed-dolo-650",
        name: "Dolo 650",
        generic_name: "Paracetamol",
        manufacturer: "Micro Labs",
        composition: &["Paracetamol"],
        dosage_form: DosageForm::Tablet,
        strength: "650mg",
        mrp_paise: 3200,
        category: Category::Painkiller,
        prescription_required: false,
        description: "Paracetamol 650mg for fever and pain relief.",
        uses: &["Fever", "Toothache", "Post-vaccination fever"],
        side_effects: &["Nausea", "Stomach pain"],
        interactions: &["Warfarin"],
        adult_dosage: "1 tablet every 6 hours as needed",
        rating_tenths: 45,
        rating_count: 3410,
    },
    SeedMedicine {
        id: "seed-calpol-500",
        name: "Calpol 500",
        generic_name: "Paracetamol",
        manufacturer: "GSK Pharmaceuticals",
        composition: &["Paracetamol"],
        dosage_form: DosageForm::Tablet,
        strength: "500mg",
        mrp_paise: 1500,
        category: Category::Painkiller,
        prescription_required: false,
        description: "Economical paracetamol tablet.",
        uses: &["Fever", "Headache"],
        side_effects: &["Nausea"],
        interactions: &[],
        adult_dosage: "1-2 tablets every 4-6 hours",
        rating_tenths: 41,
        rating_count: 620,
    },
    SeedMedicine {
        id: "seed-brufen-400",
        name: "Brufen 400",
        generic_name: "Ibuprofen",
        manufacturer: "Abbott",
        composition: &["Ibuprofen"],
        dosage_form: DosageForm::Tablet,
        strength: "400mg",
        mrp_paise: 2500,
        category: Category::Painkiller,
        prescription_required: false,
        description: "NSAID for pain, inflammation and fever.",
        uses: &["Joint pain", "Dental pain", "Menstrual cramps"],
        side_effects: &["Heartburn", "Stomach upset", "Dizziness"],
        interactions: &["Aspirin", "Warfarin (bleeding risk)", "Lithium"],
        adult_dosage: "1 tablet up to three times a day after food",
        rating_tenths: 40,
        rating_count: 890,
    },
    SeedMedicine {
        id: "seed-combiflam",
        name: "Combiflam",
        generic_name: "Ibuprofen + Paracetamol",
        manufacturer: "Sanofi India",
        composition: &["Ibuprofen", "Paracetamol"],
        dosage_form: DosageForm::Tablet,
        strength: "400mg/325mg",
        mrp_paise: 4200,
        category: Category::Painkiller,
        prescription_required: false,
        description: "Combination analgesic for pain with inflammation.",
        uses: &["Muscle pain", "Back pain", "Fever"],
        side_effects: &["Acidity", "Nausea"],
        interactions: &["Aspirin", "Warfarin"],
        adult_dosage: "1 tablet up to three times a day after food",
        rating_tenths: 42,
        rating_count: 2100,
    },
    SeedMedicine {
        id: "seed-ecosprin-75",
        name: "Ecosprin 75",
        generic_name: "Aspirin",
        manufacturer: "USV Ltd",
        composition: &["Aspirin"],
        dosage_form: DosageForm::Tablet,
        strength: "75mg",
        mrp_paise: 550,
        category: Category::Cardiac,
        prescription_required: true,
        description: "Low-dose aspirin for prevention of heart attack and stroke.",
        uses: &["Prevention of heart attack", "Prevention of stroke"],
        side_effects: &["Gastric irritation", "Easy bruising"],
        interactions: &["Warfarin (increased bleeding risk)", "Ibuprofen"],
        adult_dosage: "1 tablet once daily after food",
        rating_tenths: 44,
        rating_count: 1540,
    },
    SeedMedicine {
        id: "seed-warf-5",
        name: "Warf 5",
        generic_name: "Warfarin",
        manufacturer: "Cipla",
        composition: &["Warfarin Sodium"],
        dosage_form: DosageForm::Tablet,
        strength: "5mg",
        mrp_paise: 9800,
        category: Category::Cardiac,
        prescription_required: true,
        description: "Oral anticoagulant.",
        uses: &["Deep vein thrombosis", "Atrial fibrillation"],
        side_effects: &["Bleeding", "Bruising"],
        interactions: &["Aspirin", "Ibuprofen", "Vitamin K rich foods"],
        adult_dosage: "As directed by your physician based on INR",
        rating_tenths: 40,
        rating_count: 210,
    },
    SeedMedicine {
        id: "seed-mox-500",
        name: "Mox 500",
        generic_name: "Amoxicillin",
        manufacturer: "Sun Pharma",
        composition: &["Amoxicillin"],
        dosage_form: DosageForm::Capsule,
        strength: "500mg",
        mrp_paise: 9000,
        category: Category::Antibiotic,
        prescription_required: true,
        description: "Penicillin-class antibiotic.",
        uses: &["Ear infection", "Throat infection", "Urinary tract infection"],
        side_effects: &["Diarrhoea", "Rash"],
        interactions: &["Methotrexate"],
        adult_dosage: "1 capsule three times a day",
        rating_tenths: 42,
        rating_count: 760,
    },
    SeedMedicine {
        id: "seed-augmentin-625",
        name: "Augmentin 625 Duo",
        generic_name: "Amoxicillin + Clavulanic Acid",
        manufacturer: "GSK Pharmaceuticals",
        composition: &["Amoxicillin", "Clavulanic Acid"],
        dosage_form: DosageForm::Tablet,
        strength: "500mg/125mg",
        mrp_paise: 20100,
        category: Category::Antibiotic,
        prescription_required: true,
        description: "Broad-spectrum antibiotic combination.",
        uses: &["Sinusitis", "Skin infection", "Respiratory tract infection"],
        side_effects: &["Diarrhoea", "Nausea"],
        interactions: &["Methotrexate", "Allopurinol"],
        adult_dosage: "1 tablet twice a day",
        rating_tenths: 45,
        rating_count: 1920,
    },
    SeedMedicine {
        id: "seed-glycomet-500",
        name: "Glycomet 500",
        generic_name: "Metformin",
        manufacturer: "USV Ltd",
        composition: &["Metformin Hydrochloride"],
        dosage_form: DosageForm::Tablet,
        strength: "500mg",
        mrp_paise: 3500,
        category: Category::Diabetic,
        prescription_required: true,
        description: "First-line oral medicine for type 2 diabetes.",
        uses: &["Type 2 diabetes"],
        side_effects: &["Nausea", "Metallic taste"],
        interactions: &["Alcohol", "Iodinated contrast"],
        adult_dosage: "1 tablet twice a day with meals",
        rating_tenths: 43,
        rating_count: 1330,
    },
];

#[derive(Debug, Clone, Copy)]
struct SeedMedicine {
    id: &'static str,
    name: &'static str,
    generic_name: &'static str,
    manufacturer: &'static str,
    composition: &'static [&'static str],
    dosage_form: DosageForm,
    strength: &'static str,
    mrp_paise: i64,
    category: Category,
    prescription_required: bool,
    description: &'static str,
    uses: &'static [&'static str],
    side_effects: &'static [&'static str],
    interactions: &'static [&'static str],
    adult_dosage: &'static str,
    rating_tenths: i64,
    rating_count: u32,
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

impl SeedMedicine {
    fn to_medicine(self) -> Medicine {
        let mut medicine = Medicine::new(
            self.id,
            self.name,
            self.generic_name,
            owned(self.composition),
            Decimal::new(self.mrp_paise, 2),
        )
        .with_manufacturer(self.manufacturer)
        .with_category(self.category)
        .with_interactions(owned(self.interactions));

        medicine.dosage_form = self.dosage_form;
        medicine.strength = self.strength.to_string();
        medicine.prescription_required = self.prescription_required;
        medicine.description = self.description.to_string();
        medicine.uses = owned(self.uses);
        medicine.side_effects = owned(self.side_effects);
        medicine.dosage.adult = Some(self.adult_dosage.to_string());
        medicine.ratings =
            Ratings { average: Decimal::new(self.rating_tenths, 1), count: self.rating_count };
        medicine.availability.last_updated = Utc::now();
        medicine
    }
}

/// Demo catalog seed.
pub struct CatalogSeedDataset;

impl CatalogSeedDataset {
    pub fn medicine_ids() -> Vec<&'static str> {
        SEED_MEDICINES.iter().map(|seed| seed.id).collect()
    }

    /// Seed records as domain values, in catalog order.
    pub fn medicines() -> Vec<Medicine> {
        SEED_MEDICINES.iter().map(|seed| seed.to_medicine()).collect()
    }

    /// Insert every seed record that is not already present. Existing
    /// records, including ones edited since seeding, are left untouched.
    pub async fn load(repo: &dyn MedicineRepository) -> Result<SeedResult, RepositoryError> {
        let mut inserted = Vec::new();
        let mut already_present = Vec::new();

        for seed in SEED_MEDICINES {
            let id = MedicineId::from(seed.id);
            if repo.find_by_id(&id).await?.is_some() {
                already_present.push(seed.id);
                continue;
            }
            repo.save(seed.to_medicine()).await?;
            inserted.push(seed.id);
        }

        info!(
            event_name = "db.seed.loaded",
            inserted = inserted.len(),
            already_present = already_present.len(),
            "catalog seed loaded"
        );

        Ok(SeedResult { inserted, already_present })
    }

    /// Check that every seed id resolves with its seeded composition.
    pub async fn verify(repo: &dyn MedicineRepository) -> Result<VerificationResult, RepositoryError> {
        let ids: Vec<MedicineId> = SEED_MEDICINES.iter().map(|seed| MedicineId::from(seed.id)).collect();
        let found = repo.find_by_ids(&ids).await?;

        let checks = SEED_MEDICINES
            .iter()
            .map(|seed| {
                let present = found.iter().any(|medicine| {
                    medicine.id.as_str() == seed.id
                        && medicine.composition.iter().map(String::as_str).eq(seed.composition.iter().copied())
                });
                (seed.id, present)
            })
            .collect::<Vec<_>>();

        Ok(VerificationResult { all_present: checks.iter().all(|(_, ok)| *ok), checks })
    }

    /// Remove seeded records.
    pub async fn clean(repo: &dyn MedicineRepository) -> Result<usize, RepositoryError> {
        let mut removed = 0;
        for seed in SEED_MEDICINES {
            if repo.delete(&MedicineId::from(seed.id)).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[derive(Debug)]
pub struct SeedResult {
    pub inserted: Vec<&'static str>,
    pub already_present: Vec<&'static str>,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
