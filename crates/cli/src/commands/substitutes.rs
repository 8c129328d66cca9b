use medicord_core::{catalog::CandidateFilter, MedicineId, SubstituteRanker};
use medicord_db::MedicineRepository;
use serde_json::json;

use crate::commands::{
    with_catalog, CommandResult, Failure, EXIT_DB, EXIT_INVALID_INPUT, EXIT_NOT_FOUND,
};

pub fn run(medicine_id: &str) -> CommandResult {
    let id = MedicineId::from(medicine_id.trim());
    if id.as_str().is_empty() {
        return CommandResult::failure(
            "substitutes",
            "invalid_input",
            "a medicine id is required",
            EXIT_INVALID_INPUT,
        );
    }

    let outcome = with_catalog("substitutes", |config, catalog| async move {
        let reference = catalog
            .find_by_id(&id)
            .await
            .map_err(|error| ("catalog_read", error.to_string(), EXIT_DB))?
            .ok_or_else(|| ("not_found", format!("medicine `{id}` not found"), EXIT_NOT_FOUND))?;

        let filter = CandidateFilter::for_reference(&reference, config.catalog.substitute_limit);
        let candidates = catalog
            .find_candidates(&filter)
            .await
            .map_err(|error| ("catalog_read", error.to_string(), EXIT_DB))?;
        let ranked = SubstituteRanker::new(config.scoring.policy())
            .rank(&reference, &candidates)
            .map_err(|error| ("invalid_input", error.to_string(), EXIT_INVALID_INPUT))?;
        Ok::<_, Failure>((reference, ranked))
    });

    match outcome {
        Ok((reference, ranked)) => {
            let message = match ranked.first() {
                Some(best) => format!(
                    "{} substitute(s) for {}; best match {} ({}%)",
                    ranked.len(),
                    reference.name,
                    best.medicine.name,
                    best.similarity_score
                ),
                None => format!("no substitutes found for {}", reference.name),
            };
            let rows: Vec<_> = ranked
                .iter()
                .map(|result| {
                    json!({
                        "id": result.medicine.id,
                        "name": result.medicine.name,
                        "similarityScore": result.similarity_score,
                        "savings": result.savings,
                        "priceDifference": result.price_difference.to_string(),
                    })
                })
                .collect();
            CommandResult::success_with_data(
                "substitutes",
                message,
                Some(json!({ "original": reference.summary(), "substitutes": rows })),
            )
        }
        Err(failure) => failure,
    }
}
