use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    Json,
};
use medicord_core::{
    catalog::CandidateFilter,
    compare_substitutes,
    domain::medicine::{Medicine, MedicineId},
    ComparisonReport, SubstituteResult,
};
use serde::Serialize;
use tracing::info;

use super::{correlation_id, resolve_medicines, ApiError, ApiState, MedicineIdsRequest};

#[derive(Debug, Serialize)]
pub struct SubstitutesResponse {
    pub success: bool,
    pub original: Medicine,
    pub count: usize,
    pub data: Vec<SubstituteResult>,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub success: bool,
    pub data: ComparisonReport,
}

pub async fn list(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(medicine_id): Path<String>,
) -> Result<Json<SubstitutesResponse>, ApiError> {
    let correlation_id = correlation_id(&headers);
    let reference = state
        .catalog
        .find_by_id(&MedicineId::from(medicine_id.as_str()))
        .await
        .map_err(|error| ApiError::repository(error, &correlation_id))?
        .ok_or_else(|| ApiError::not_found("Medicine not found", &correlation_id))?;

    let filter = CandidateFilter::for_reference(&reference, state.limits.substitute_limit);
    let candidates = state
        .catalog
        .find_candidates(&filter)
        .await
        .map_err(|error| ApiError::repository(error, &correlation_id))?;
    let ranked = state
        .ranker
        .rank(&reference, &candidates)
        .map_err(|error| ApiError::application(error, &correlation_id))?;

    info!(
        event_name = "api.substitutes.ranked",
        correlation_id = %correlation_id,
        medicine_id = %reference.id,
        candidate_count = candidates.len(),
        "substitutes ranked"
    );

    Ok(Json(SubstitutesResponse {
        success: true,
        original: reference,
        count: ranked.len(),
        data: ranked,
    }))
}

pub async fn compare(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Result<Json<MedicineIdsRequest>, JsonRejection>,
) -> Result<Json<CompareResponse>, ApiError> {
    let correlation_id = correlation_id(&headers);
    let Json(request) = body.map_err(|rejection| ApiError::json_rejection(rejection, &correlation_id))?;

    let medicines = resolve_medicines(
        &state,
        &request,
        "Not enough medicines found for comparison",
        &correlation_id,
    )
    .await?;
    let report = compare_substitutes(&medicines)
        .map_err(|error| ApiError::application(error, &correlation_id))?;

    info!(
        event_name = "api.substitutes.compared",
        correlation_id = %correlation_id,
        medicine_count = report.medicines.len(),
        cheapest_id = %report.cheapest.id,
        "medicines compared"
    );

    Ok(Json(CompareResponse { success: true, data: report }))
}
