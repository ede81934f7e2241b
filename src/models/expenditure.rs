use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExpenseCategory {
    pub id: i32,
    pub category_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Expenditure {
    pub id: i32,
    pub date: NaiveDate,
    pub supplier: Option<String>,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
    pub description: String,
    pub amount: f64,
    pub vat_amount: f64,
    pub payment_method: Option<String>,
    pub receipt_no: Option<String>,
    pub scan: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub category_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateExpenditureRequest {
    pub date: Option<NaiveDate>,
    pub supplier: Option<String>,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub vat_amount: Option<f64>,
    pub payment_method: Option<String>,
    pub receipt_no: Option<String>,
    pub scan: Option<String>,
    pub notes: Option<String>,
}
