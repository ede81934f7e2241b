use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientSummary {
    pub id: i32,
    /// First name.
    pub name: String,
    pub surname: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClientSearch {
    pub name: String,
    pub surname: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    pub firstname: String,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}
