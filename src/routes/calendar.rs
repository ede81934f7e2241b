use axum::{extract::Path, http::StatusCode, Json};
use serde_json::json;

use crate::{
    middleware::tenant::Tenant,
    models::calendar::{CreateEntryRequest, CreateStatusRequest, UpdateEntryRequest},
    routes::{users::failure, ApiResult},
    services::calendar::CalendarService,
};

// ─── Statuses ─────────────────────────────────────────────────────────────────

pub async fn list_statuses(Tenant(tenant): Tenant) -> ApiResult {
    let statuses = CalendarService::list_statuses(&tenant).await?;
    Ok(Json(json!({ "success": true, "statuses": statuses })))
}

pub async fn create_status(
    Tenant(tenant): Tenant,
    Json(body): Json<CreateStatusRequest>,
) -> ApiResult {
    let desc = body.status_desc.trim();
    if desc.is_empty() {
        return Err(failure(StatusCode::BAD_REQUEST, "Status description is required"));
    }
    let status = CalendarService::create_status(&tenant, desc).await?;
    Ok(Json(json!({ "success": true, "status": status })))
}

pub async fn delete_status(
    Tenant(tenant): Tenant,
    Path((_, id)): Path<(String, i32)>,
) -> ApiResult {
    if CalendarService::delete_status(&tenant, id).await? {
        Ok(Json(json!({ "success": true })))
    } else {
        Ok(Json(json!({
            "success": false,
            "message": "Cannot delete status (used or not found)",
        })))
    }
}

// ─── Entries ──────────────────────────────────────────────────────────────────

pub async fn list_entries(Tenant(tenant): Tenant) -> ApiResult {
    let entries = CalendarService::list_entries(&tenant).await?;
    Ok(Json(json!({ "success": true, "entries": entries })))
}

pub async fn create_entry(
    Tenant(tenant): Tenant,
    Json(body): Json<CreateEntryRequest>,
) -> ApiResult {
    let entry = CalendarService::create_entry(&tenant, &body).await?;
    Ok(Json(json!({ "success": true, "agenda": entry })))
}

pub async fn update_entry(
    Tenant(tenant): Tenant,
    Path((_, id)): Path<(String, i32)>,
    Json(body): Json<UpdateEntryRequest>,
) -> ApiResult {
    match CalendarService::update_entry(&tenant, id, &body).await? {
        Some(entries) => Ok(Json(json!({ "success": true, "entries": entries }))),
        None => Err(failure(StatusCode::NOT_FOUND, "Not found")),
    }
}

pub async fn delete_entry(
    Tenant(tenant): Tenant,
    Path((_, id)): Path<(String, i32)>,
) -> ApiResult {
    if !CalendarService::delete_entry(&tenant, id).await? {
        return Err(failure(StatusCode::NOT_FOUND, "Not found"));
    }
    Ok(Json(json!({ "success": true })))
}
