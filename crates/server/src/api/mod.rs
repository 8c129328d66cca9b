//! JSON API for the medicine catalog, interaction checks and substitutes.
//!
//! - `GET    /`                                   service index
//! - `GET    /api/medicines`                      paginated catalog, newest first
//! - `GET    /api/medicines/search?q=`            substring search
//! - `GET    /api/medicines/category/{category}`  records of one category
//! - `GET    /api/medicines/{id}`                 one record
//! - `POST   /api/medicines`                      create (admin)
//! - `PUT    /api/medicines/{id}`                 replace (admin)
//! - `DELETE /api/medicines/{id}`                 remove (admin)
//! - `POST   /api/interactions/check`             pairwise interaction report
//! - `GET    /api/substitutes/{medicineId}`       ranked substitutes
//! - `POST   /api/substitutes/compare`            side-by-side comparison

pub mod error;
pub mod interactions;
pub mod medicines;
pub mod substitutes;

use std::sync::Arc;

use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use medicord_core::{
    catalog,
    config::{AdminConfig, AppConfig, CatalogConfig},
    domain::medicine::{Medicine, MedicineId},
    errors::{DomainError, InterfaceError},
    interactions::MIN_MEDICINES,
    InteractionDetector, SubstituteRanker,
};
use medicord_db::MedicineRepository;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use error::ApiError;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Everything a handler needs, built once at startup.
#[derive(Clone)]
pub struct ApiState {
    pub catalog: Arc<dyn MedicineRepository>,
    pub detector: InteractionDetector,
    pub ranker: SubstituteRanker,
    pub limits: CatalogConfig,
    pub admin: AdminConfig,
}

impl ApiState {
    pub fn from_config(catalog: Arc<dyn MedicineRepository>, config: &AppConfig) -> Self {
        Self {
            catalog,
            detector: InteractionDetector::new(config.interactions.mode()),
            ranker: SubstituteRanker::new(config.scoring.policy()),
            limits: config.catalog.clone(),
            admin: config.admin.clone(),
        }
    }

    /// Bearer-token guard for catalog writes.
    pub(crate) fn authorize_admin(
        &self,
        headers: &HeaderMap,
        correlation_id: &str,
    ) -> Result<(), ApiError> {
        if self.admin.api_token.is_none() {
            return Err(ApiError::forbidden(
                "Catalog writes are disabled on this server",
                correlation_id,
            ));
        }

        let presented = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim);

        match presented {
            Some(token) if self.admin.authorizes(token) => Ok(()),
            _ => Err(InterfaceError::Unauthorized {
                message: "A valid admin token is required".to_string(),
                correlation_id: correlation_id.to_string(),
            }
            .into()),
        }
    }
}

/// `{ "medicineIds": [...] }`, shared by the interaction and compare routes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineIdsRequest {
    #[serde(default)]
    pub medicine_ids: Vec<String>,
}

impl MedicineIdsRequest {
    /// Trimmed, non-blank ids in request order with repeats removed.
    pub fn distinct_ids(&self) -> Vec<MedicineId> {
        catalog::distinct_ids(&self.medicine_ids)
    }
}

/// Resolve the requested ids, returned in request order. Fewer than two
/// distinct ids is a bad request; fewer than two resolved records is a 404.
pub(crate) async fn resolve_medicines(
    state: &ApiState,
    request: &MedicineIdsRequest,
    not_found_message: &str,
    correlation_id: &str,
) -> Result<Vec<Medicine>, ApiError> {
    let ids = request.distinct_ids();
    if ids.len() < MIN_MEDICINES {
        return Err(ApiError::application(
            DomainError::InsufficientInput { required: MIN_MEDICINES, provided: ids.len() },
            correlation_id,
        ));
    }

    let found = state
        .catalog
        .find_by_ids(&ids)
        .await
        .map_err(|error| ApiError::repository(error, correlation_id))?;
    if found.len() < MIN_MEDICINES {
        return Err(ApiError::application(
            DomainError::NotFound(not_found_message.to_string()),
            correlation_id,
        ));
    }

    Ok(catalog::in_request_order(found, &ids))
}

#[derive(Debug, Serialize)]
pub struct ServiceIndex {
    pub success: bool,
    pub message: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub endpoints: IndexEndpoints,
}

#[derive(Debug, Serialize)]
pub struct IndexEndpoints {
    pub medicines: &'static str,
    pub substitutes: &'static str,
    pub interactions: &'static str,
    pub health: &'static str,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/medicines", get(medicines::list).post(medicines::create))
        .route("/api/medicines/search", get(medicines::search))
        .route("/api/medicines/category/{category}", get(medicines::by_category))
        .route(
            "/api/medicines/{id}",
            get(medicines::get_one).put(medicines::update).delete(medicines::remove),
        )
        .route("/api/interactions/check", post(interactions::check))
        .route("/api/substitutes/compare", post(substitutes::compare))
        .route("/api/substitutes/{medicine_id}", get(substitutes::list))
        .fallback(route_not_found)
        .with_state(state)
}

async fn index() -> Json<ServiceIndex> {
    Json(ServiceIndex {
        success: true,
        message: "Welcome to Medicord API",
        version: env!("CARGO_PKG_VERSION"),
        status: "active",
        endpoints: IndexEndpoints {
            medicines: "/api/medicines",
            substitutes: "/api/substitutes",
            interactions: "/api/interactions",
            health: "/health",
        },
    })
}

async fn route_not_found(headers: HeaderMap) -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Route not found", &correlation_id(&headers))
}

/// The caller's `x-correlation-id` when present, otherwise a fresh one.
pub(crate) fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty() && value.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string())
}


#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
    use medicord_core::config::AppConfig;
    use serde_json::json;

    use super::test_support::{seeded_router, seeded_state, send};
    use super::{correlation_id, MedicineIdsRequest, CORRELATION_HEADER};

    #[tokio::test]
    async fn index_lists_endpoints() {
        let (status, body) = send(seeded_router(), Method::GET, "/", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "active");
        assert_eq!(body["endpoints"]["medicines"], "/api/medicines");
    }

    #[tokio::test]
    async fn unknown_routes_use_the_failure_envelope() {
        let (status, body) = send(seeded_router(), Method::GET, "/api/nope", None, None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "success": false, "message": "Route not found" }));
    }

    #[test]
    fn distinct_ids_keep_request_order_and_drop_blanks() {
        let request = MedicineIdsRequest {
            medicine_ids: vec![" b ".into(), "a".into(), "b".into(), "  ".into()],
        };

        let ids: Vec<String> = request.distinct_ids().iter().map(ToString::to_string).collect();

        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn correlation_id_is_echoed_or_generated() {
        let mut headers = HeaderMap::new();
        assert_eq!(correlation_id(&headers).len(), 32);

        headers.insert(CORRELATION_HEADER, HeaderValue::from_static("req-42"));
        assert_eq!(correlation_id(&headers), "req-42");
    }

    #[test]
    fn admin_guard_is_forbidden_without_a_configured_token() {
        let mut state = seeded_state();
        state.admin = AppConfig::default().admin;

        let error = state.authorize_admin(&HeaderMap::new(), "req-1").expect_err("forbidden");

        assert_eq!(error.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn admin_guard_rejects_a_wrong_token() {
        let state = seeded_state();
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer wrong"));

        let error = state.authorize_admin(&headers, "req-1").expect_err("unauthorized");

        assert_eq!(error.status(), StatusCode::UNAUTHORIZED);
    }
}
