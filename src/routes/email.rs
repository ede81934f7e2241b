use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::{
    middleware::tenant::Tenant,
    models::email::SaveEmailSettingsRequest,
    routes::{users::failure, ApiResult},
    services::email_settings::{tenant_error, EmailSettingsService},
    AppState,
};

pub async fn save_config(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    Json(body): Json<SaveEmailSettingsRequest>,
) -> ApiResult {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(failure(StatusCode::BAD_REQUEST, "Email and password are required"));
    }
    let config = EmailSettingsService::save(&tenant, &state.encryption_key, &body)
        .await
        .map_err(email_error)?;
    Ok(Json(json!({ "success": true, "config": config })))
}

pub async fn get_config(State(state): State<AppState>, Tenant(tenant): Tenant) -> ApiResult {
    match EmailSettingsService::load(&tenant, &state.encryption_key)
        .await
        .map_err(email_error)?
    {
        Some(config) => Ok(Json(json!(config))),
        None => Err(failure(StatusCode::NOT_FOUND, "No configuration found")),
    }
}

fn email_error(err: anyhow::Error) -> (StatusCode, Json<Value>) {
    if let Some(tenant_err) = tenant_error(&err) {
        let status = tenant_err.status();
        if status.is_server_error() {
            tracing::error!("{tenant_err}");
        }
        return failure(status, &tenant_err.public_message());
    }
    tracing::error!("Email settings failed: {err:#}");
    failure(StatusCode::INTERNAL_SERVER_ERROR, "Email settings error")
}
