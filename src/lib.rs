pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    http::{header, Method},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use services::tenancy::TenantRouter;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub tenants: TenantRouter,
    /// Master key the per-tenant secret keys are derived from.
    pub encryption_key: Arc<[u8; 32]>,
}

impl AppState {
    pub fn new(tenants: TenantRouter, encryption_key: [u8; 32]) -> Self {
        Self { tenants, encryption_key: Arc::new(encryption_key) }
    }
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_origin(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        // Control plane
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/users/create-user", post(routes::users::create_user))
        .route("/api/users/superadmin/overview", get(routes::users::overview))
        .route("/api/users/superadmin/users", get(routes::users::list_users))
        .route("/api/users/superadmin/companies", get(routes::users::list_companies))
        .route("/api/companies/create-company", post(routes::companies::create_company))
        // Calendar
        .route("/api/status/{company}", get(routes::calendar::list_statuses).post(routes::calendar::create_status))
        .route("/api/status/{company}/{id}", delete(routes::calendar::delete_status))
        .route("/api/calendar/{company}", get(routes::calendar::list_entries).post(routes::calendar::create_entry))
        .route("/api/calendar/{company}/{id}", put(routes::calendar::update_entry).delete(routes::calendar::delete_entry))
        // Clients
        .route("/api/search-clients/{company}", get(routes::clients::search_clients))
        .route("/api/clients/{company}", post(routes::clients::create_client))
        // Expenditure
        .route("/api/expense-categories/{company}", get(routes::expenditure::list_categories).post(routes::expenditure::create_category))
        .route("/api/expenditures/{company}", get(routes::expenditure::list_expenditures).post(routes::expenditure::create_expenditure))
        // Email
        .route("/api/email/config/{company}", get(routes::email::get_config).post(routes::email::save_config))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
