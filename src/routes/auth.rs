use axum::{extract::State, Json};
use serde_json::json;

use crate::{
    models::user::LoginRequest, routes::ApiResult, services::directory::DirectoryService,
    AppState,
};

/// Checks a user's credentials within a company. Wrong credentials are a
/// normal answer (`success: false`), not an HTTP error.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult {
    let user = DirectoryService::authenticate(
        state.tenants.registry(),
        &body.username,
        &body.company,
        &body.password,
    )
    .await?;

    Ok(Json(match user {
        Some(user) => json!({ "success": true, "user": user }),
        None => json!({ "success": false, "message": "Invalid credentials" }),
    }))
}

