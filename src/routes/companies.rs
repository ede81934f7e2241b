use axum::{extract::State, Json};
use serde_json::json;

use crate::{
    models::{company::CreateCompanyRequest, user::UserRole},
    routes::ApiResult,
    services::directory::DirectoryService,
    AppState,
};

/// Provisions a company on behalf of `body.username`.
///
/// The caller's role gates everything; an unknown caller is treated like a
/// plain user. When a password is supplied, an `admin` account is recorded for
/// the new company under `admin_username` (or the caller's name).
pub async fn create_company(
    State(state): State<AppState>,
    Json(body): Json<CreateCompanyRequest>,
) -> ApiResult {
    let registry = state.tenants.registry();
    let role = DirectoryService::user_role(registry, &body.username)
        .await?
        .unwrap_or(UserRole::User);

    let outcome = state.tenants.provision_new_tenant(&body.company, &role).await?;

    if let Some(password) = body.password.as_deref().filter(|p| !p.is_empty()) {
        let admin = body.admin_username.as_deref().unwrap_or(&body.username);
        let created = DirectoryService::insert_user(
            registry,
            admin,
            password,
            body.email.as_deref(),
            &body.company,
            UserRole::Admin,
        )
        .await?;
        if !created {
            tracing::debug!("Admin {admin} already present in {:?}", body.company);
        }
    }

    if outcome.database_created {
        tracing::info!("Created database {} for {:?}", outcome.database, body.company);
    }

    Ok(Json(json!({
        "success": true,
        "message": format!("Company '{}' created successfully", body.company),
        "database": outcome.database.as_str(),
        "created": outcome.directory_created,
    })))
}
