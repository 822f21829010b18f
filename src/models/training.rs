// src/models/training.rs
use chrono::NaiveDateTime;
use serde::Serialize;

// === GROUP ===

#[derive(Debug, Serialize, sqlx::FromRow, Clone)]
pub struct GroupTrainingRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub max_participants: i64,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub level: String,
    pub trainer_id: i64,
    pub trainer_name: String,
    pub zone_id: i64,
    pub zone_name: String,
}

// === PERSONAL ===

#[derive(Debug, Serialize, sqlx::FromRow, Clone)]
pub struct PersonalTrainingRow {
    pub id: i64,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub status: String,
    pub price: Option<f64>,
    pub subscription_id: i64,
    pub client_id: i64,
    pub client_name: String,
    pub trainer_id: i64,
    pub trainer_name: String,
}
