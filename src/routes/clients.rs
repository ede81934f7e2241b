use axum::{extract::Query, http::StatusCode, Json};
use serde_json::json;

use crate::{
    middleware::tenant::Tenant,
    models::client::{ClientSearch, CreateClientRequest},
    routes::{users::failure, ApiResult},
    services::clients::ClientService,
};

pub async fn search_clients(
    Tenant(tenant): Tenant,
    Query(search): Query<ClientSearch>,
) -> ApiResult {
    let clients = ClientService::search(&tenant, &search).await?;
    Ok(Json(json!({ "success": true, "clients": clients })))
}

pub async fn create_client(
    Tenant(tenant): Tenant,
    Json(body): Json<CreateClientRequest>,
) -> ApiResult {
    if body.firstname.trim().is_empty() {
        return Err(failure(StatusCode::BAD_REQUEST, "First name is required"));
    }
    let client = ClientService::create(&tenant, &body).await?;
    Ok(Json(json!({ "success": true, "client": client })))
}
