use axum::{http::StatusCode, Json};
use serde_json::Value;

pub mod auth;
pub mod calendar;
pub mod clients;
pub mod companies;
pub mod email;
pub mod expenditure;
pub mod health;
pub mod users;

/// Handler result: JSON body on success, status plus JSON error body otherwise.
pub type ApiResult<T = Json<Value>> = Result<T, (StatusCode, Json<Value>)>;
