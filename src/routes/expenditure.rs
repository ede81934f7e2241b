use axum::{http::StatusCode, Json};
use serde_json::json;

use crate::{
    middleware::tenant::Tenant,
    models::expenditure::{CreateCategoryRequest, CreateExpenditureRequest},
    routes::{users::failure, ApiResult},
    services::expenditure::ExpenditureService,
};

const REQUIRED_FIELDS: &str = "Category, description, and amount are required";

pub async fn list_categories(Tenant(tenant): Tenant) -> ApiResult {
    let categories = ExpenditureService::list_categories(&tenant).await?;
    Ok(Json(json!({ "success": true, "categories": categories })))
}

pub async fn create_category(
    Tenant(tenant): Tenant,
    Json(body): Json<CreateCategoryRequest>,
) -> ApiResult {
    let name = body.category_name.trim();
    if name.is_empty() {
        return Err(failure(StatusCode::BAD_REQUEST, "Category name is required"));
    }
    let category = ExpenditureService::ensure_category(&tenant, name).await?;
    Ok(Json(json!({ "success": true, "category": category })))
}

pub async fn list_expenditures(Tenant(tenant): Tenant) -> ApiResult {
    let expenditures = ExpenditureService::list(&tenant).await?;
    Ok(Json(json!({ "success": true, "expenditures": expenditures })))
}

/// A category may be given by id or by name; a new name creates the category.
pub async fn create_expenditure(
    Tenant(tenant): Tenant,
    Json(body): Json<CreateExpenditureRequest>,
) -> ApiResult {
    let description = body.description.as_deref().map(str::trim).unwrap_or_default();
    let amount = body.amount.filter(|a| *a != 0.0);
    let category_name = body
        .category_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let Some(amount) = amount.filter(|_| !description.is_empty()) else {
        return Err(failure(StatusCode::BAD_REQUEST, REQUIRED_FIELDS));
    };

    let category_id = match (body.category_id, category_name) {
        (Some(id), _) => id,
        (None, Some(name)) => ExpenditureService::ensure_category(&tenant, name).await?.id,
        (None, None) => return Err(failure(StatusCode::BAD_REQUEST, REQUIRED_FIELDS)),
    };

    let expenditure =
        ExpenditureService::create(&tenant, &body, category_id, description, amount).await?;
    Ok(Json(json!({ "success": true, "expenditure": expenditure })))
}
