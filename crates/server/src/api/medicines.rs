use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use medicord_core::{
    catalog::PageRequest,
    domain::medicine::{Category, Medicine, MedicineDraft, MedicineId},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{correlation_id, ApiError, ApiState};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub count: usize,
    pub total: u64,
    pub page: u32,
    pub pages: u64,
    pub data: Vec<Medicine>,
}

#[derive(Debug, Serialize)]
pub struct CollectionResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<Medicine>,
}

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub data: Medicine,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

fn medicine_not_found(correlation_id: &str) -> ApiError {
    ApiError::not_found("Medicine not found", correlation_id)
}

pub async fn list(
    State(state): State<ApiState>,
    headers: HeaderMap,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ListResponse>, ApiError> {
    let correlation_id = correlation_id(&headers);
    let Query(query) = query.map_err(|rejection| ApiError::query_rejection(rejection, &correlation_id))?;
    let request = PageRequest::new(
        query.page,
        query.limit,
        state.limits.default_page_size,
        state.limits.max_page_size,
    );

    let page = state
        .catalog
        .list(request)
        .await
        .map_err(|error| ApiError::repository(error, &correlation_id))?;

    info!(
        event_name = "api.medicines.listed",
        correlation_id = %correlation_id,
        page = page.page,
        count = page.items.len(),
        total = page.total,
        "catalog page served"
    );

    Ok(Json(ListResponse {
        success: true,
        count: page.items.len(),
        total: page.total,
        page: page.page,
        pages: page.pages,
        data: page.items,
    }))
}

pub async fn search(
    State(state): State<ApiState>,
    headers: HeaderMap,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<CollectionResponse>, ApiError> {
    let correlation_id = correlation_id(&headers);
    let Query(query) = query.map_err(|rejection| ApiError::query_rejection(rejection, &correlation_id))?;
    let needle = query.q.as_deref().map(str::trim).unwrap_or_default();
    if needle.is_empty() {
        return Err(ApiError::bad_request("Search query is required", &correlation_id));
    }

    let data = state
        .catalog
        .search(needle, state.limits.search_limit)
        .await
        .map_err(|error| ApiError::repository(error, &correlation_id))?;

    info!(
        event_name = "api.medicines.searched",
        correlation_id = %correlation_id,
        count = data.len(),
        "catalog search served"
    );

    Ok(Json(CollectionResponse { success: true, count: data.len(), data }))
}

pub async fn by_category(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(category): Path<String>,
) -> Result<Json<CollectionResponse>, ApiError> {
    let correlation_id = correlation_id(&headers);
    let category = category
        .parse::<Category>()
        .map_err(|error| ApiError::application(error, &correlation_id))?;

    let data = state
        .catalog
        .list_by_category(category, state.limits.category_limit)
        .await
        .map_err(|error| ApiError::repository(error, &correlation_id))?;

    info!(
        event_name = "api.medicines.category_listed",
        correlation_id = %correlation_id,
        category = category.as_str(),
        count = data.len(),
        "category listing served"
    );

    Ok(Json(CollectionResponse { success: true, count: data.len(), data }))
}

pub async fn get_one(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<RecordResponse>, ApiError> {
    let correlation_id = correlation_id(&headers);
    let medicine = state
        .catalog
        .find_by_id(&MedicineId::from(id.as_str()))
        .await
        .map_err(|error| ApiError::repository(error, &correlation_id))?
        .ok_or_else(|| medicine_not_found(&correlation_id))?;

    Ok(Json(RecordResponse { success: true, message: None, data: medicine }))
}

pub async fn create(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Result<Json<MedicineDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<RecordResponse>), ApiError> {
    let correlation_id = correlation_id(&headers);
    state.authorize_admin(&headers, &correlation_id)?;
    let Json(draft) = body.map_err(|rejection| ApiError::json_rejection(rejection, &correlation_id))?;

    let medicine = draft
        .into_medicine(MedicineId::generate(), Utc::now())
        .map_err(|error| ApiError::application(error, &correlation_id))?;
    state
        .catalog
        .save(medicine.clone())
        .await
        .map_err(|error| ApiError::repository(error, &correlation_id))?;

    info!(
        event_name = "api.medicines.created",
        correlation_id = %correlation_id,
        medicine_id = %medicine.id,
        "medicine created"
    );

    Ok((
        StatusCode::CREATED,
        Json(RecordResponse {
            success: true,
            message: Some("Medicine created successfully"),
            data: medicine,
        }),
    ))
}

pub async fn update(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<MedicineDraft>, JsonRejection>,
) -> Result<Json<RecordResponse>, ApiError> {
    let correlation_id = correlation_id(&headers);
    state.authorize_admin(&headers, &correlation_id)?;
    let Json(draft) = body.map_err(|rejection| ApiError::json_rejection(rejection, &correlation_id))?;

    let existing = state
        .catalog
        .find_by_id(&MedicineId::from(id.as_str()))
        .await
        .map_err(|error| ApiError::repository(error, &correlation_id))?
        .ok_or_else(|| medicine_not_found(&correlation_id))?;
    let updated = draft
        .apply_to(&existing, Utc::now())
        .map_err(|error| ApiError::application(error, &correlation_id))?;
    state
        .catalog
        .save(updated.clone())
        .await
        .map_err(|error| ApiError::repository(error, &correlation_id))?;

    info!(
        event_name = "api.medicines.updated",
        correlation_id = %correlation_id,
        medicine_id = %updated.id,
        "medicine updated"
    );

    Ok(Json(RecordResponse {
        success: true,
        message: Some("Medicine updated successfully"),
        data: updated,
    }))
}

pub async fn remove(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let correlation_id = correlation_id(&headers);
    state.authorize_admin(&headers, &correlation_id)?;

    let removed = state
        .catalog
        .delete(&MedicineId::from(id.as_str()))
        .await
        .map_err(|error| ApiError::repository(error, &correlation_id))?;
    if !removed {
        return Err(medicine_not_found(&correlation_id));
    }

    info!(
        event_name = "api.medicines.deleted",
        correlation_id = %correlation_id,
        medicine_id = %id,
        "medicine deleted"
    );

    Ok(Json(MessageResponse { success: true, message: "Medicine deleted successfully" }))
}
