use medicord_core::{
    catalog::{distinct_ids, in_request_order},
    errors::DomainError,
    interactions::MIN_MEDICINES,
    InteractionDetector, Medicine, MedicineId,
};
use medicord_db::MedicineRepository;

use crate::commands::{
    to_data, with_catalog, CommandResult, Failure, EXIT_DB, EXIT_INVALID_INPUT, EXIT_NOT_FOUND,
};

pub fn run(raw_ids: &[String]) -> CommandResult {
    let ids = distinct_ids(raw_ids);
    if ids.len() < MIN_MEDICINES {
        let error = DomainError::InsufficientInput { required: MIN_MEDICINES, provided: ids.len() };
        return CommandResult::failure(
            "check",
            "invalid_input",
            error.to_string(),
            EXIT_INVALID_INPUT,
        );
    }

    let outcome = with_catalog("check", |config, catalog| async move {
        let found = catalog
            .find_by_ids(&ids)
            .await
            .map_err(|error| ("catalog_read", error.to_string(), EXIT_DB))?;
        let unknown = unknown_ids(&ids, &found);
        if found.len() < MIN_MEDICINES {
            let message = format!("not enough medicines found; unknown ids: {}", unknown.join(", "));
            return Err(("not_found", message, EXIT_NOT_FOUND));
        }

        let medicines = in_request_order(found, &ids);
        let report = InteractionDetector::new(config.interactions.mode())
            .check(&medicines)
            .map_err(|error| ("invalid_input", error.to_string(), EXIT_INVALID_INPUT))?;
        Ok::<_, Failure>((report, unknown))
    });

    match outcome {
        Ok((report, unknown)) => {
            let mut message = format!(
                "{} interaction(s) and {} warning(s) across {} medicines",
                report.interaction_count,
                report.warning_count,
                report.medicines.len()
            );
            if !unknown.is_empty() {
                message.push_str(&format!("; unknown ids skipped: {}", unknown.join(", ")));
            }
            CommandResult::success_with_data("check", message, to_data(&report))
        }
        Err(failure) => failure,
    }
}

/// Requested ids the catalog did not resolve, in request order.
pub(crate) fn unknown_ids(requested: &[MedicineId], found: &[Medicine]) -> Vec<String> {
    requested
        .iter()
        .filter(|id| !found.iter().any(|medicine| &medicine.id == *id))
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use medicord_core::catalog::distinct_ids;
    use medicord_db::CatalogSeedDataset;

    use super::unknown_ids;

    #[test]
    fn unknown_ids_keep_request_order() {
        let found: Vec<_> = CatalogSeedDataset::medicines()
            .into_iter()
            .filter(|medicine| medicine.id.as_str() == "seed-dolo-650")
            .collect();
        let requested = distinct_ids(&["ghost-b", "seed-dolo-650", "ghost-a"]);

        assert_eq!(unknown_ids(&requested, &found), vec!["ghost-b", "ghost-a"]);
    }
}
