use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row as stored: `password` holds the encrypted secret.
#[derive(Debug, Clone, FromRow)]
pub struct EmailSettingsRow {
    pub id: i32,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<i32>,
    pub imap_host: Option<String>,
    pub imap_port: Option<i32>,
    pub email: String,
    pub password: String,
}

/// Settings as returned to the tenant's settings screen, password decrypted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailSettings {
    pub id: i32,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<i32>,
    pub imap_host: Option<String>,
    pub imap_port: Option<i32>,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveEmailSettingsRequest {
    pub smtp_host: Option<String>,
    pub smtp_port: Option<i32>,
    pub imap_host: Option<String>,
    pub imap_port: Option<i32>,
    pub email: String,
    pub password: String,
}
