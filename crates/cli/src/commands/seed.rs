use medicord_db::CatalogSeedDataset;
use serde_json::json;

use crate::commands::{with_catalog, CommandResult, Failure, EXIT_MIGRATION, EXIT_VERIFICATION};

pub fn run() -> CommandResult {
    let outcome = with_catalog("seed", |_, catalog| async move {
        let loaded = CatalogSeedDataset::load(&catalog)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), EXIT_MIGRATION))?;
        let verification = CatalogSeedDataset::verify(&catalog)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), EXIT_VERIFICATION))?;

        if !verification.all_present {
            let message = verification_message(&verification.checks);
            return Err(("seed_verification", message, EXIT_VERIFICATION));
        }
        Ok::<_, Failure>(loaded)
    });

    match outcome {
        Ok(loaded) => CommandResult::success_with_data(
            "seed",
            format!(
                "reference catalog ready: {} inserted, {} already present",
                loaded.inserted.len(),
                loaded.already_present.len()
            ),
            Some(json!({
                "inserted": loaded.inserted,
                "alreadyPresent": loaded.already_present,
            })),
        ),
        Err(failure) => failure,
    }
}

fn verification_message(checks: &[(&'static str, bool)]) -> String {
    let failed_checks =
        checks.iter().filter_map(|(check, passed)| (!passed).then_some(*check)).collect::<Vec<_>>();

    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::verification_message;

    #[test]
    fn verification_error_message_targets_failed_checks() {
        let checks = [("seed-dolo-650", true), ("seed-warf-5", false), ("seed-mox-500", false)];

        assert_eq!(
            verification_message(&checks),
            "Seed verification failed for: seed-warf-5, seed-mox-500"
        );
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        let checks = [("seed-dolo-650", true)];

        assert_eq!(verification_message(&checks), "Some seed data failed to load");
    }
}
