pub mod check;
pub mod config;
pub mod doctor;
pub mod migrate;
pub mod seed;
pub mod substitutes;

use std::future::Future;

use medicord_core::config::{AppConfig, LoadOptions};
use medicord_db::{connect_with_config, migrations, SqlMedicineRepository};
use serde::Serialize;
use serde_json::Value;

/// `(error_class, message, exit_code)` of a failed step.
pub(crate) type Failure = (&'static str, String, u8);

pub(crate) const EXIT_CONFIG: u8 = 2;
pub(crate) const EXIT_RUNTIME: u8 = 3;
pub(crate) const EXIT_DB: u8 = 4;
pub(crate) const EXIT_MIGRATION: u8 = 5;
pub(crate) const EXIT_VERIFICATION: u8 = 6;
pub(crate) const EXIT_INVALID_INPUT: u8 = 7;
pub(crate) const EXIT_NOT_FOUND: u8 = 8;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Load config, open and migrate the catalog database, then run `work`
/// against it on a current-thread runtime. The pool is closed afterwards.
pub(crate) fn with_catalog<T, F, Fut>(command: &str, work: F) -> Result<T, CommandResult>
where
    F: FnOnce(AppConfig, SqlMedicineRepository) -> Fut,
    Fut: Future<Output = Result<T, Failure>>,
{
    let config = AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG,
        )
    })?;

    let runtime =
        tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
            CommandResult::failure(
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                EXIT_RUNTIME,
            )
        })?;

    runtime
        .block_on(async move {
            let pool = connect_with_config(&config.database)
                .await
                .map_err(|error| ("db_connectivity", error.to_string(), EXIT_DB))?;
            migrations::run_pending(&pool)
                .await
                .map_err(|error| ("migration", error.to_string(), EXIT_MIGRATION))?;

            let outcome = work(config, SqlMedicineRepository::new(pool.clone())).await;
            pool.close().await;
            outcome
        })
        .map_err(|(error_class, message, exit_code)| {
            CommandResult::failure(command, error_class, message, exit_code)
        })
}

pub(crate) fn to_data(value: &impl Serialize) -> Option<Value> {
    serde_json::to_value(value).ok()
}
