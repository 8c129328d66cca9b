use medicord_core::config::{AppConfig, LoadOptions};
use medicord_db::{
    connect_with_config, migrations, DbPool, MedicineRepository, SqlMedicineRepository,
};
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

const DATABASE_CHECKS: [&str; 3] =
    ["database_connectivity", "schema_migrations", "catalog_population"];

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck::pass("config_validation", "configuration loaded and validated"));
            checks.push(check_admin_writes(&config));
            checks.extend(check_database(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            checks.push(DoctorCheck::skipped("admin_writes", "configuration did not load"));
            checks.extend(
                DATABASE_CHECKS
                    .into_iter()
                    .map(|name| DoctorCheck::skipped(name, "configuration did not load")),
            );
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_admin_writes(config: &AppConfig) -> DoctorCheck {
    let details = if config.admin.api_token.is_some() {
        "catalog writes enabled (bearer token configured)"
    } else {
        "catalog writes disabled (no admin.api_token); write routes answer 403"
    };
    DoctorCheck::pass("admin_writes", details)
}

fn check_database(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck::fail(
                    "database_connectivity",
                    format!("failed to initialize async runtime: {error}"),
                ),
                DoctorCheck::skipped("schema_migrations", "the database was not reachable"),
                DoctorCheck::skipped("catalog_population", "the database was not reachable"),
            ];
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_config(&config.database).await {
            Ok(pool) => pool,
            Err(error) => {
                return vec![
                    DoctorCheck::fail(
                        "database_connectivity",
                        format!("failed to connect to database: {error}"),
                    ),
                    DoctorCheck::skipped("schema_migrations", "the database was not reachable"),
                    DoctorCheck::skipped("catalog_population", "the database was not reachable"),
                ];
            }
        };

        let mut checks = vec![DoctorCheck::pass(
            "database_connectivity",
            format!("connected using `{}`", config.database.url),
        )];
        let schema = check_schema(&pool).await;
        let schema_ready = schema.status == CheckStatus::Pass;
        checks.push(schema);
        checks.push(if schema_ready {
            check_population(&pool).await
        } else {
            DoctorCheck::skipped("catalog_population", "migrations are pending")
        });

        pool.close().await;
        checks
    })
}

async fn check_schema(pool: &DbPool) -> DoctorCheck {
    match migrations::pending_count(pool).await {
        Ok(0) => DoctorCheck::pass("schema_migrations", "all migrations applied"),
        Ok(pending) => DoctorCheck::fail(
            "schema_migrations",
            format!("{pending} pending migration(s); run `medicord migrate`"),
        ),
        Err(error) => {
            DoctorCheck::fail("schema_migrations", format!("migration status query failed: {error}"))
        }
    }
}

async fn check_population(pool: &DbPool) -> DoctorCheck {
    match SqlMedicineRepository::new(pool.clone()).count().await {
        Ok(0) => DoctorCheck::fail("catalog_population", "catalog is empty; run `medicord seed`"),
        Ok(count) => DoctorCheck::pass("catalog_population", format!("{count} medicines in catalog")),
        Err(error) => {
            DoctorCheck::fail("catalog_population", format!("catalog count failed: {error}"))
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
