// src/subscription_handlers.rs
//! Subscription removal together with the rows that reference it.
//!
//! Personal trainings and group enrollments have no ON DELETE CASCADE, so
//! they are deleted explicitly inside one transaction before the root row.

use actix_web::{web, HttpResponse};
use serde::Serialize;
use std::sync::Arc;

use crate::db::Database;
use crate::error::{ApiError, ApiResult};
use crate::handlers::ApiResponse;
use crate::query_builders::path_id;
use crate::AppState;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CascadeReport {
    pub subscription_id: i64,
    pub personal_trainings: u64,
    pub enrollments: u64,
}

/// All-or-nothing: a missing subscription or any failing statement
/// rolls back the dependent deletes too.
pub async fn delete_subscription_cascade(db: &Database, id: i64) -> ApiResult<CascadeReport> {
    db.in_transaction(|tx| {
        Box::pin(async move {
            let personal_trainings = sqlx::query(
                r#"DELETE FROM "Персональная_тренировка" WHERE "id_абонемента" = ?1"#,
            )
            .bind(id)
            .execute(&mut **tx)
            .await?
            .rows_affected();

            let enrollments = sqlx::query(
                r#"DELETE FROM "Запись_на_групповую_тренировку" WHERE "id_абонемента" = ?1"#,
            )
            .bind(id)
            .execute(&mut **tx)
            .await?
            .rows_affected();

            let removed = sqlx::query(r#"DELETE FROM "Абонемент" WHERE "id_абонемента" = ?1"#)
                .bind(id)
                .execute(&mut **tx)
                .await?
                .rows_affected();

            if removed == 0 {
                return Err(ApiError::not_found("Абонемент не найден"));
            }

            Ok::<_, ApiError>(CascadeReport {
                subscription_id: id,
                personal_trainings,
                enrollments,
            })
        })
    })
    .await
}

pub async fn delete_subscription(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = path_id(&path.into_inner())?;
    let report = delete_subscription_cascade(&app_state.db, id).await?;

    log::info!(
        "Subscription {} deleted with {} personal trainings and {} enrollments",
        id,
        report.personal_trainings,
        report.enrollments
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        report,
        "Абонемент удалён".to_string(),
    )))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/subscriptions/{id}", web::delete().to(delete_subscription));
}
