// src/models/client.rs
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Serialize, sqlx::FromRow, Clone)]
pub struct ClientRow {
    pub id: i64,
    pub full_name: String,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub registered_on: NaiveDate,
    pub medical_data: Option<String>,
}
