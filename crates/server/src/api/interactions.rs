use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use medicord_core::InteractionReport;
use serde::Serialize;
use tracing::info;

use super::{correlation_id, resolve_medicines, ApiError, ApiState, MedicineIdsRequest};

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: InteractionReport,
}

pub async fn check(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Result<Json<MedicineIdsRequest>, JsonRejection>,
) -> Result<Json<CheckResponse>, ApiError> {
    let correlation_id = correlation_id(&headers);
    let Json(request) = body.map_err(|rejection| ApiError::json_rejection(rejection, &correlation_id))?;

    let medicines =
        resolve_medicines(&state, &request, "Not enough medicines found", &correlation_id).await?;
    let report = state
        .detector
        .check(&medicines)
        .map_err(|error| ApiError::application(error, &correlation_id))?;

    info!(
        event_name = "api.interactions.checked",
        correlation_id = %correlation_id,
        medicine_count = medicines.len(),
        interaction_count = report.interaction_count,
        warning_count = report.warning_count,
        "interaction check completed"
    );

    Ok(Json(CheckResponse { success: true, report }))
}
