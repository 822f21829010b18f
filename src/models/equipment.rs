// src/models/equipment.rs
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use validator::Validate;

// === ENUMS ===
// Stored values are the Russian labels; the extra spellings are what older
// forms send and are folded into the canonical label.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, AsRefStr)]
pub enum EquipmentStatus {
    #[default]
    #[strum(to_string = "Исправен", serialize = "Работает", serialize = "исправен")]
    Operational,
    #[strum(to_string = "На ремонте", serialize = "ремонт")]
    InRepair,
    #[strum(to_string = "Списан", serialize = "Списано")]
    Decommissioned,
}

impl EquipmentStatus {
    /// Unknown labels fall back to `Исправен`.
    pub fn normalize(raw: &str) -> Self {
        raw.trim().parse().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, AsRefStr)]
pub enum RepairStatus {
    #[default]
    #[strum(to_string = "Открыта")]
    Open,
    #[strum(to_string = "В работе", serialize = "В_работе", serialize = "В процессе")]
    InProgress,
    #[strum(to_string = "Закрыта", serialize = "Завершена")]
    Closed,
}

impl RepairStatus {
    /// Unknown labels fall back to `Открыта`.
    pub fn normalize(raw: &str) -> Self {
        raw.trim().parse().unwrap_or_default()
    }

    /// Open and in-progress tickets keep their equipment in repair.
    pub fn is_active(&self) -> bool {
        matches!(self, RepairStatus::Open | RepairStatus::InProgress)
    }
}

pub const DEFAULT_PRIORITY: &str = "Средний";

// === EQUIPMENT ===

#[derive(Debug, Serialize, sqlx::FromRow, Clone)]
pub struct EquipmentRow {
    pub id: i64,
    pub zone_id: i64,
    pub zone_name: String,
    pub name: String,
    pub purchase_date: Option<NaiveDate>,
    pub last_service_date: Option<NaiveDate>,
    pub status: String,
    pub has_photo: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEquipmentRequest {
    #[validate(range(min = 1, message = "Укажите зону"))]
    pub zone_id: i64,
    #[validate(length(min = 1, max = 200, message = "Название: от 1 до 200 символов"))]
    pub name: String,
    pub purchase_date: Option<NaiveDate>,
    pub last_service_date: Option<NaiveDate>,
    #[validate(length(min = 1, message = "Укажите статус"))]
    pub status: String,
}

// === REPAIR TICKETS ===

#[derive(Debug, Serialize, sqlx::FromRow, Clone)]
pub struct RepairTicketRow {
    pub id: i64,
    pub equipment_id: i64,
    pub equipment_name: String,
    pub created_at: NaiveDateTime,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub has_photo: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRepairRequest {
    #[validate(length(min = 1, message = "Укажите статус"))]
    pub status: String,
    #[validate(length(min = 1, max = 50))]
    pub priority: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub description: Option<String>,
}

/// Parsed multipart form of a new ticket.
#[derive(Debug, Default)]
pub struct NewRepairTicket {
    pub equipment_id: i64,
    pub description: String,
    pub priority: String,
    pub photo: Option<Vec<u8>>,
}
