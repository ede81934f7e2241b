use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Directory entry in the control plane. `company_name` is the human-readable
/// identifier; the tenant database name is derived from it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Company {
    pub id: i32,
    pub company_name: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    /// Username of the caller; must be a superadmin.
    pub username: String,
    pub company: String,
    /// When present, an `admin` user with these credentials is recorded for the
    /// new company.
    pub admin_username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
}
