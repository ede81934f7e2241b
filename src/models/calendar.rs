use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CalendarStatus {
    pub id: i32,
    pub status_desc: String,
}

/// Calendar row joined with its status and client names.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CalendarEntry {
    pub id: i32,
    pub agenda: String,
    pub time: NaiveTime,
    pub date: NaiveDate,
    pub status_id: Option<i32>,
    pub status_desc: Option<String>,
    pub client_id: Option<i32>,
    /// Client first name.
    pub name: Option<String>,
    pub surname: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateStatusRequest {
    pub status_desc: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    pub agenda: String,
    pub status_id: Option<i32>,
    pub client_id: Option<i32>,
    pub time: Option<NaiveTime>,
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEntryRequest {
    /// New agenda text.
    pub title: String,
    pub time: NaiveTime,
    pub status_id: Option<i32>,
    pub date: NaiveDate,
}
