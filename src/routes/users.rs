use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::{
    models::user::CreateUserRequest,
    routes::ApiResult,
    services::directory::{CreateUserOutcome, DirectoryService},
    AppState,
};

pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> ApiResult {
    let outcome = DirectoryService::create_user(state.tenants.registry(), &body).await?;

    let (status, message) = match outcome {
        CreateUserOutcome::Created => {
            return Ok(Json(json!({
                "success": true,
                "message": format!("User {} created successfully", body.username),
            })))
        }
        CreateUserOutcome::CreatorNotFound => (StatusCode::NOT_FOUND, "Creator not found"),
        CreateUserOutcome::NotAllowed(reason) => (StatusCode::FORBIDDEN, reason),
        CreateUserOutcome::UnknownCompany => (StatusCode::NOT_FOUND, "Unknown company"),
        CreateUserOutcome::AlreadyExists => (StatusCode::BAD_REQUEST, "User already exists"),
    };
    Err(failure(status, message))
}

// ─── Superadmin views ─────────────────────────────────────────────────────────

pub async fn overview(State(state): State<AppState>) -> ApiResult {
    let registry = state.tenants.registry();
    let companies = DirectoryService::list_companies(registry).await?;
    let users = DirectoryService::list_users(registry).await?;
    Ok(Json(json!({ "success": true, "companies": companies, "users": users })))
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult {
    let users = DirectoryService::list_users(state.tenants.registry()).await?;
    Ok(Json(json!(users)))
}

pub async fn list_companies(State(state): State<AppState>) -> ApiResult {
    let companies = DirectoryService::list_companies(state.tenants.registry()).await?;
    Ok(Json(json!(companies)))
}

pub(crate) fn failure(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "success": false, "message": message })))
}
