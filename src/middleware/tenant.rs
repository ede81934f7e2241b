use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, RawPathParams},
    http::{request::Parts, StatusCode},
    Json,
};
use serde_json::{json, Value};

use crate::{db::TenantPool, AppState};

/// Path parameter carrying the company identifier on tenant-scoped routes.
pub const COMPANY_PARAM: &str = "company";

/// Resolves the `{company}` path segment to that company's pool.
///
/// Resolution is lazy: an unknown company still yields a pool, and the first
/// query through it reports `TenantNotFound`.
#[derive(Clone)]
pub struct Tenant(pub Arc<TenantPool>);

impl FromRequestParts<AppState> for Tenant {
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let params = RawPathParams::from_request_parts(parts, state)
            .await
            .map_err(|_| missing_company())?;

        let company = params
            .iter()
            .find(|(key, _)| *key == COMPANY_PARAM)
            .map(|(_, value)| value.to_string())
            .ok_or_else(missing_company)?;

        let pool = state.tenants.resolve_tenant(&company)?;
        Ok(Tenant(pool))
    }
}

fn missing_company() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "message": "Missing company" })),
    )
}
