use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use medicord_db::{DbPool, MedicineRepository};
use serde::Serialize;
use tracing::warn;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    catalog: Arc<dyn MedicineRepository>,
}

impl HealthState {
    pub fn new(db_pool: DbPool, catalog: Arc<dyn MedicineRepository>) -> Self {
        Self { db_pool, catalog }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub catalog: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let catalog = catalog_check(state.catalog.as_ref()).await;
    let ready = database.status == "ready" && catalog.status == "ready";

    if !ready {
        warn!(
            event_name = "system.health.degraded",
            correlation_id = "health",
            database = %database.detail,
            catalog = %catalog.detail,
            "health check degraded"
        );
    }

    let payload = HealthResponse {
        success: ready,
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: format!("medicord-server {} running", env!("CARGO_PKG_VERSION")),
        },
        database,
        catalog,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}

async fn catalog_check(catalog: &dyn MedicineRepository) -> HealthCheck {
    match catalog.count().await {
        Ok(count) => HealthCheck { status: "ready", detail: format!("{count} medicines in catalog") },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("catalog count failed: {error}") }
        }
    }
}
