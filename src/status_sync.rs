// src/status_sync.rs
//! Статус оборудования, производный от заявок на ремонт.
//!
//! Ticket writes are the primary operation. The equipment update that follows
//! is a secondary effect: it runs after the ticket statement has returned,
//! reads the ticket set as it is at that moment, and a failure here is only
//! logged. The ticket mutation is never rolled back because of it.

use std::future::Future;

use crate::db::Database;
use crate::error::ApiResult;
use crate::models::{EquipmentStatus, RepairStatus};

/// Tickets of the equipment that are still open or in progress.
pub async fn active_ticket_count(db: &Database, equipment_id: i64) -> ApiResult<i64> {
    db.timed(
        sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM "Заявка_на_ремонт"
               WHERE "id_оборудования" = ?1 AND "Статус" IN (?2, ?3)"#,
        )
        .bind(equipment_id)
        .bind(RepairStatus::Open.as_ref())
        .bind(RepairStatus::InProgress.as_ref())
        .fetch_one(db.pool()),
    )
    .await
}

async fn force_in_repair(db: &Database, equipment_id: i64) -> ApiResult<()> {
    db.timed(
        sqlx::query(r#"UPDATE "Оборудование" SET "Статус" = ?2 WHERE "id_оборудования" = ?1"#)
            .bind(equipment_id)
            .bind(EquipmentStatus::InRepair.as_ref())
            .execute(db.pool()),
    )
    .await?;
    Ok(())
}

/// Returns equipment to service once no active ticket is left.
/// Only equipment currently marked as in repair is touched, so a
/// decommissioned item stays decommissioned.
async fn release_if_idle(db: &Database, equipment_id: i64) -> ApiResult<()> {
    let active = active_ticket_count(db, equipment_id).await?;
    if active > 0 {
        log::debug!("Equipment {} keeps {} active ticket(s)", equipment_id, active);
        return Ok(());
    }

    db.timed(
        sqlx::query(
            r#"UPDATE "Оборудование" SET "Статус" = ?2
               WHERE "id_оборудования" = ?1 AND "Статус" = ?3"#,
        )
        .bind(equipment_id)
        .bind(EquipmentStatus::Operational.as_ref())
        .bind(EquipmentStatus::InRepair.as_ref())
        .execute(db.pool()),
    )
    .await?;
    Ok(())
}

async fn best_effort<F>(event: &str, equipment_id: i64, sync: F)
where
    F: Future<Output = ApiResult<()>>,
{
    if let Err(e) = sync.await {
        log::error!(
            "Equipment {} status sync after {} failed (ticket change kept): {}",
            equipment_id,
            event,
            e
        );
    }
}

/// A new ticket always puts its equipment in repair.
pub async fn after_ticket_created(db: &Database, equipment_id: i64) {
    best_effort("ticket creation", equipment_id, force_in_repair(db, equipment_id)).await
}

pub async fn after_ticket_status_changed(db: &Database, equipment_id: i64, status: RepairStatus) {
    if status.is_active() {
        best_effort("ticket update", equipment_id, force_in_repair(db, equipment_id)).await
    } else {
        best_effort("ticket close", equipment_id, release_if_idle(db, equipment_id)).await
    }
}

pub async fn after_ticket_removed(db: &Database, equipment_id: i64) {
    best_effort("ticket removal", equipment_id, release_if_idle(db, equipment_id)).await
}

/// Status to store when a client edits equipment directly: while active
/// tickets exist only decommissioning is honoured.
pub async fn guarded_status(
    db: &Database,
    equipment_id: i64,
    requested: EquipmentStatus,
) -> ApiResult<EquipmentStatus> {
    if requested == EquipmentStatus::Decommissioned {
        return Ok(requested);
    }
    if active_ticket_count(db, equipment_id).await? > 0 {
        return Ok(EquipmentStatus::InRepair);
    }
    Ok(requested)
}
