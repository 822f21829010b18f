// src/equipment_handlers.rs
//! Equipment handlers: listing, editing, repair tickets and photos.
//!
//! Ticket writes are followed by `status_sync` so the equipment status
//! reflects the tickets that are still open.

use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::assets::{self, read_photo_field, read_text_field, validate_photo, AssetOwner, PHOTO_FIELD};
use crate::error::{ApiError, ApiResult};
use crate::handlers::ApiResponse;
use crate::models::{
    EquipmentRow, EquipmentStatus, NewRepairTicket, RepairStatus, RepairTicketRow,
    UpdateEquipmentRequest, UpdateRepairRequest, DEFAULT_PRIORITY,
};
use crate::pagination::{fetch_page, PageRequest};
use crate::query_builders::{flag, id_filter, path_id, Listing, PredicateBuilder};
use crate::status_sync;
use crate::AppState;

const FORM_TEXT_LIMIT: usize = 8 * 1024;
const LATEST_REPAIRS: i64 = 10;

const EQUIPMENT: Listing<'static> = Listing {
    select: r#"SELECT e."id_оборудования" AS id,
                      e."id_зоны" AS zone_id,
                      z."Название" AS zone_name,
                      e."Название" AS name,
                      e."Дата_покупки" AS purchase_date,
                      e."Дата_последнего_ТО" AS last_service_date,
                      e."Статус" AS status,
                      (e."Фото" IS NOT NULL) AS has_photo"#,
    from: r#""Оборудование" e
             JOIN "Зона" z ON z."id_зоны" = e."id_зоны""#,
    order_by: r#"e."id_оборудования""#,
};

// ==================== LISTING ====================

#[derive(Debug, Deserialize, Default)]
pub struct EquipmentListQuery {
    pub q: Option<String>,
    pub zone_id: Option<String>,
    pub status: Option<String>,
    pub has_photo: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
}

impl EquipmentListQuery {
    fn filters(&self) -> ApiResult<PredicateBuilder> {
        let zone_id = id_filter("zone_id", self.zone_id.as_deref())?;
        let status = match self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => None,
            Some(raw) => Some(
                raw.parse::<EquipmentStatus>()
                    .map_err(|_| ApiError::BadRequest(format!("Неизвестный статус: {}", raw)))?,
            ),
        };

        let mut filters = PredicateBuilder::new();
        filters
            .search(&[r#"e."Название""#, r#"z."Название""#], self.q.as_deref())
            .eq(r#"e."id_зоны""#, zone_id)
            .eq(r#"e."Статус""#, status.map(|s| s.to_string()))
            .when(flag(self.has_photo.as_deref()), r#"e."Фото" IS NOT NULL"#);
        Ok(filters)
    }
}

pub async fn get_equipment(
    app_state: web::Data<Arc<AppState>>,
    query: web::Query<EquipmentListQuery>,
) -> ApiResult<HttpResponse> {
    let filters = query.filters()?;
    let request = PageRequest::from_query(query.page.as_deref(), query.size.as_deref());

    let page = fetch_page::<EquipmentRow>(&app_state.db, &EQUIPMENT, &filters, request).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(page)))
}

// ==================== EQUIPMENT UPDATE ====================

#[derive(Debug, Serialize)]
pub struct EquipmentStatusView {
    pub id: i64,
    pub status: String,
}

pub async fn update_equipment(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    body: web::Json<UpdateEquipmentRequest>,
) -> ApiResult<HttpResponse> {
    let id = path_id(&path.into_inner())?;
    let update = body.into_inner();
    update.validate()?;

    let name = update.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Заполните обязательные поля"));
    }

    let db = &app_state.db;
    let zone_exists: Option<i64> = db
        .timed(
            sqlx::query_scalar(r#"SELECT "id_зоны" FROM "Зона" WHERE "id_зоны" = ?1"#)
                .bind(update.zone_id)
                .fetch_optional(db.pool()),
        )
        .await?;
    if zone_exists.is_none() {
        return Err(ApiError::bad_request("Зона не существует"));
    }

    let requested = EquipmentStatus::normalize(&update.status);
    let stored = status_sync::guarded_status(db, id, requested).await?;

    let result = db
        .timed(
            sqlx::query(
                r#"UPDATE "Оборудование"
                   SET "id_зоны" = ?2, "Название" = ?3, "Дата_покупки" = ?4,
                       "Дата_последнего_ТО" = ?5, "Статус" = ?6
                   WHERE "id_оборудования" = ?1"#,
            )
            .bind(id)
            .bind(update.zone_id)
            .bind(name)
            .bind(update.purchase_date)
            .bind(update.last_service_date)
            .bind(stored.as_ref())
            .execute(db.pool()),
        )
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Оборудование не найдено"));
    }

    let message = if stored != requested {
        format!("Статус оставлен «{}»: есть открытые заявки", stored)
    } else {
        "Оборудование обновлено".to_string()
    };
    let view = EquipmentStatusView { id, status: stored.to_string() };
    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(view, message)))
}

// ==================== REPAIR TICKETS ====================

async fn read_ticket_form(mut payload: Multipart) -> ApiResult<NewRepairTicket> {
    let mut ticket = NewRepairTicket {
        priority: DEFAULT_PRIORITY.to_string(),
        ..Default::default()
    };

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?;
        let name = field.content_disposition().get_name().unwrap_or("").to_string();

        match name.as_str() {
            "eq_id" => {
                let raw = read_text_field(&mut field, 32).await?;
                ticket.equipment_id = raw.trim().parse().unwrap_or(0);
            }
            "description" => {
                ticket.description = read_text_field(&mut field, FORM_TEXT_LIMIT).await?.trim().to_string();
            }
            "priority" => {
                let priority = read_text_field(&mut field, 64).await?;
                if !priority.trim().is_empty() {
                    ticket.priority = priority.trim().to_string();
                }
            }
            PHOTO_FIELD => {
                let bytes = read_photo_field(&mut field).await?;
                // An empty file input means "no photo" here
                if !bytes.is_empty() {
                    validate_photo(&bytes)?;
                    ticket.photo = Some(bytes);
                }
            }
            _ => {
                read_text_field(&mut field, FORM_TEXT_LIMIT).await?;
            }
        }
    }

    if ticket.equipment_id <= 0 || ticket.description.is_empty() {
        return Err(ApiError::bad_request("Укажите оборудование и описание"));
    }
    Ok(ticket)
}

pub async fn create_repair(
    app_state: web::Data<Arc<AppState>>,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let ticket = read_ticket_form(payload).await?;
    let db = &app_state.db;

    let equipment: Option<i64> = db
        .timed(
            sqlx::query_scalar(r#"SELECT "id_оборудования" FROM "Оборудование" WHERE "id_оборудования" = ?1"#)
                .bind(ticket.equipment_id)
                .fetch_optional(db.pool()),
        )
        .await?;
    if equipment.is_none() {
        return Err(ApiError::not_found("Оборудование не найдено"));
    }

    // "Статус" is left to the column default
    let id: i64 = db
        .timed(
            sqlx::query_scalar(
                r#"INSERT INTO "Заявка_на_ремонт"
                   ("id_оборудования", "Описание_проблемы", "Приоритет", "Фото")
                   VALUES (?1, ?2, ?3, ?4)
                   RETURNING "id_заявки""#,
            )
            .bind(ticket.equipment_id)
            .bind(&ticket.description)
            .bind(&ticket.priority)
            .bind(ticket.photo.as_deref())
            .fetch_one(db.pool()),
        )
        .await?;

    log::info!("Repair ticket {} opened for equipment {}", id, ticket.equipment_id);
    status_sync::after_ticket_created(db, ticket.equipment_id).await;

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        serde_json::json!({ "id": id }),
        "Заявка создана".to_string(),
    )))
}

pub async fn update_repair(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    body: web::Json<UpdateRepairRequest>,
) -> ApiResult<HttpResponse> {
    let id = path_id(&path.into_inner())?;
    let update = body.into_inner();
    update.validate()?;

    let status = RepairStatus::normalize(&update.status);
    let db = &app_state.db;

    let equipment_id: Option<i64> = db
        .timed(
            sqlx::query_scalar(
                r#"UPDATE "Заявка_на_ремонт"
                   SET "Статус" = ?2,
                       "Приоритет" = COALESCE(?3, "Приоритет"),
                       "Описание_проблемы" = COALESCE(?4, "Описание_проблемы")
                   WHERE "id_заявки" = ?1
                   RETURNING "id_оборудования""#,
            )
            .bind(id)
            .bind(status.as_ref())
            .bind(update.priority.as_deref())
            .bind(update.description.as_deref())
            .fetch_optional(db.pool()),
        )
        .await?;

    let equipment_id = equipment_id.ok_or_else(|| ApiError::not_found("Заявка не найдена"))?;
    status_sync::after_ticket_status_changed(db, equipment_id, status).await;

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        serde_json::json!({ "id": id, "status": status.to_string() }),
        "Заявка обновлена".to_string(),
    )))
}

pub async fn delete_repair(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = path_id(&path.into_inner())?;
    let db = &app_state.db;

    let equipment_id: Option<i64> = db
        .timed(
            sqlx::query_scalar(
                r#"DELETE FROM "Заявка_на_ремонт" WHERE "id_заявки" = ?1 RETURNING "id_оборудования""#,
            )
            .bind(id)
            .fetch_optional(db.pool()),
        )
        .await?;

    let equipment_id = equipment_id.ok_or_else(|| ApiError::not_found("Заявка не найдена"))?;
    status_sync::after_ticket_removed(db, equipment_id).await;

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(id, "Заявка удалена".to_string())))
}

pub async fn get_latest_repairs(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let db = &app_state.db;
    let repairs: Vec<RepairTicketRow> = db
        .timed(
            sqlx::query_as(
                r#"SELECT r."id_заявки" AS id,
                          r."id_оборудования" AS equipment_id,
                          e."Название" AS equipment_name,
                          r."Дата_создания" AS created_at,
                          r."Описание_проблемы" AS description,
                          r."Статус" AS status,
                          r."Приоритет" AS priority,
                          (r."Фото" IS NOT NULL) AS has_photo
                   FROM "Заявка_на_ремонт" r
                   JOIN "Оборудование" e ON e."id_оборудования" = r."id_оборудования"
                   ORDER BY r."id_заявки" DESC
                   LIMIT ?1"#,
            )
            .bind(LATEST_REPAIRS)
            .fetch_all(db.pool()),
        )
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(repairs)))
}

// ==================== PHOTOS ====================

pub async fn upload_equipment_photo(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    assets::upload_photo(AssetOwner::Equipment, app_state, &path.into_inner(), payload).await
}

pub async fn get_equipment_photo(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    req: HttpRequest,
) -> ApiResult<HttpResponse> {
    assets::get_photo(AssetOwner::Equipment, app_state, &path.into_inner(), req).await
}

pub async fn delete_equipment_photo(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    assets::clear_photo(AssetOwner::Equipment, app_state, &path.into_inner()).await
}

pub async fn upload_repair_photo(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    assets::upload_photo(AssetOwner::RepairTicket, app_state, &path.into_inner(), payload).await
}

pub async fn get_repair_photo(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    req: HttpRequest,
) -> ApiResult<HttpResponse> {
    assets::get_photo(AssetOwner::RepairTicket, app_state, &path.into_inner(), req).await
}

pub async fn delete_repair_photo(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    assets::clear_photo(AssetOwner::RepairTicket, app_state, &path.into_inner()).await
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/equipment")
            .route("", web::get().to(get_equipment))
            .route("/{id}", web::put().to(update_equipment))
            .route("/{id}/upload-photo", web::post().to(upload_equipment_photo))
            .route("/{id}/photo", web::get().to(get_equipment_photo))
            .route("/{id}/photo", web::delete().to(delete_equipment_photo)),
    )
    .service(
        web::scope("/repairs")
            .route("", web::post().to(create_repair))
            .route("/latest", web::get().to(get_latest_repairs))
            .route("/{id}", web::put().to(update_repair))
            .route("/{id}", web::delete().to(delete_repair))
            .route("/{id}/upload-photo", web::post().to(upload_repair_photo))
            .route("/{id}/photo", web::get().to(get_repair_photo))
            .route("/{id}/photo", web::delete().to(delete_repair_photo)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::fixtures::*;
    use crate::db::test_support::*;
    use crate::db::Database;
    use actix_web::http::header;
    use actix_web::{test, App};

    const BOUNDARY: &str = "gymboundary";

    fn multipart_request(uri: &str, body: Vec<u8>) -> test::TestRequest {
        test::TestRequest::post()
            .uri(uri)
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(body)
    }

    fn text_part(name: &str, value: &str) -> Vec<u8> {
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            BOUNDARY, name, value
        )
        .into_bytes()
    }

    fn ticket_form(eq_id: i64, description: &str, photo: Option<&[u8]>) -> Vec<u8> {
        let mut body = text_part("eq_id", &eq_id.to_string());
        body.extend(text_part("description", description));
        match photo {
            Some(bytes) => body.extend(multipart_body(BOUNDARY, PHOTO_FIELD, "p.png", bytes)),
            None => body.extend(format!("--{}--\r\n", BOUNDARY).into_bytes()),
        }
        body
    }

    async fn status_of(db: &Database, id: i64) -> String {
        sqlx::query_scalar(r#"SELECT "Статус" FROM "Оборудование" WHERE "id_оборудования" = ?1"#)
            .bind(id)
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    macro_rules! app {
        ($db:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(crate::test_state($db.clone())))
                    .configure(configure),
            )
            .await
        };
    }

    #[actix_rt::test]
    async fn test_ticket_lifecycle_drives_equipment_status() {
        let db = test_db().await;
        let zone = insert_zone(&db, "Зал").await;
        let eq = insert_equipment(&db, zone, "Беговая дорожка", "Исправен").await;
        let app = app!(db);

        let req = multipart_request("/repairs", ticket_form(eq, "Рвётся лента", None)).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        let ticket = body["data"]["id"].as_i64().unwrap();
        assert_eq!(status_of(&db, eq).await, "На ремонте");

        let stored: String =
            sqlx::query_scalar(r#"SELECT "Статус" || '/' || "Приоритет" FROM "Заявка_на_ремонт" WHERE "id_заявки" = ?1"#)
                .bind(ticket)
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(stored, "Открыта/Средний");

        let req = test::TestRequest::put()
            .uri(&format!("/repairs/{}", ticket))
            .set_json(serde_json::json!({ "status": "Завершена" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(status_of(&db, eq).await, "Исправен");
    }

    #[actix_rt::test]
    async fn test_create_ticket_with_photo_and_read_it_back() {
        let db = test_db().await;
        let zone = insert_zone(&db, "Зал").await;
        let eq = insert_equipment(&db, zone, "Гантели", "Исправен").await;
        let app = app!(db);

        let photo = jpeg_bytes();
        let req = multipart_request("/repairs", ticket_form(eq, "Треснула ручка", Some(photo.as_slice()))).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let ticket = body["data"]["id"].as_i64().unwrap();

        let req = test::TestRequest::get().uri(&format!("/repairs/{}/photo", ticket)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(test::read_body(resp).await.to_vec(), photo);
    }

    #[actix_rt::test]
    async fn test_create_ticket_rejects_bad_input() {
        let db = test_db().await;
        let zone = insert_zone(&db, "Зал").await;
        let eq = insert_equipment(&db, zone, "Скамья", "Исправен").await;
        let app = app!(db);

        let req = multipart_request("/repairs", ticket_form(eq, "   ", None)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = multipart_request("/repairs", ticket_form(999, "Сломано", None)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = multipart_request("/repairs", ticket_form(eq, "Сломано", Some(&b"not an image"[..]))).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "Заявка_на_ремонт""#)
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert_eq!(status_of(&db, eq).await, "Исправен");
    }

    #[actix_rt::test]
    async fn test_delete_last_ticket_releases_equipment() {
        let db = test_db().await;
        let zone = insert_zone(&db, "Зал").await;
        let eq = insert_equipment(&db, zone, "Тренажёр", "На ремонте").await;
        let ticket = insert_ticket(&db, eq, "Открыта").await;
        let app = app!(db);

        let req = test::TestRequest::delete().uri(&format!("/repairs/{}", ticket)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);
        assert_eq!(status_of(&db, eq).await, "Исправен");

        let req = test::TestRequest::delete().uri(&format!("/repairs/{}", ticket)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }

    #[actix_rt::test]
    async fn test_update_equipment_respects_open_tickets() {
        let db = test_db().await;
        let zone = insert_zone(&db, "Зал").await;
        let eq = insert_equipment(&db, zone, "Кроссовер", "На ремонте").await;
        insert_ticket(&db, eq, "В работе").await;
        let app = app!(db);

        let req = test::TestRequest::put()
            .uri(&format!("/equipment/{}", eq))
            .set_json(serde_json::json!({ "zone_id": zone, "name": "Кроссовер", "status": "Работает" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["status"], "На ремонте");
        assert_eq!(status_of(&db, eq).await, "На ремонте");

        let req = test::TestRequest::put()
            .uri(&format!("/equipment/{}", eq))
            .set_json(serde_json::json!({ "zone_id": zone, "name": "Кроссовер", "status": "Списано" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["status"], "Списан");

        let req = test::TestRequest::put()
            .uri("/equipment/777")
            .set_json(serde_json::json!({ "zone_id": zone, "name": "X", "status": "Исправен" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }

    #[actix_rt::test]
    async fn test_equipment_listing_filters() {
        let db = test_db().await;
        let hall = insert_zone(&db, "Зал").await;
        let cardio = insert_zone(&db, "Кардио").await;
        insert_equipment(&db, hall, "Штанга", "Исправен").await;
        let bike = insert_equipment(&db, cardio, "Велотренажёр", "На ремонте").await;
        insert_equipment(&db, cardio, "Эллипс", "Исправен").await;
        crate::assets::store(&db, AssetOwner::Equipment, bike, &png_bytes()).await.unwrap();
        let app = app!(db);

        let req = test::TestRequest::get()
            .uri(&format!("/equipment?zone_id={}&status=%D1%80%D0%B5%D0%BC%D0%BE%D0%BD%D1%82", cardio))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["pagination"]["total"], 1);
        assert_eq!(body["data"]["items"][0]["id"], bike);
        assert_eq!(body["data"]["items"][0]["has_photo"], true);

        let req = test::TestRequest::get().uri("/equipment?has_photo=1").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["pagination"]["total"], 1);

        let req = test::TestRequest::get().uri("/equipment?status=bogus").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }

    #[actix_rt::test]
    async fn test_equipment_photo_endpoints() {
        let db = test_db().await;
        let zone = insert_zone(&db, "Зал").await;
        let eq = insert_equipment(&db, zone, "Гиря", "Исправен").await;
        let app = app!(db);

        let req = multipart_request(
            &format!("/equipment/{}/upload-photo", eq),
            multipart_body(BOUNDARY, "document", "a.png", &png_bytes()),
        )
        .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = multipart_request(
            &format!("/equipment/{}/upload-photo", eq),
            multipart_body(BOUNDARY, PHOTO_FIELD, "photo.png", b""),
        )
        .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 413);

        let req = multipart_request(
            &format!("/equipment/{}/upload-photo", eq),
            multipart_body(BOUNDARY, PHOTO_FIELD, "photo.png", b"plain text pretending"),
        )
        .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = multipart_request(
            &format!("/equipment/{}/upload-photo", eq),
            multipart_body(BOUNDARY, PHOTO_FIELD, "photo.png", &png_bytes()),
        )
        .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let req = test::TestRequest::delete().uri(&format!("/equipment/{}/photo", eq)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let req = test::TestRequest::get().uri(&format!("/equipment/{}/photo", eq)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = test::TestRequest::get().uri("/equipment/abc/photo").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }

    #[actix_rt::test]
    async fn test_oversized_stream_is_rejected() {
        let db = test_db().await;
        let zone = insert_zone(&db, "Зал").await;
        let eq = insert_equipment(&db, zone, "Штанга", "Исправен").await;
        let app = app!(db);

        let mut huge = png_bytes();
        huge.resize(crate::assets::MAX_PHOTO_BYTES + 1, 0);
        let req = multipart_request(
            &format!("/equipment/{}/upload-photo", eq),
            multipart_body(BOUNDARY, PHOTO_FIELD, "huge.png", &huge),
        )
        .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 413);

        let req = test::TestRequest::get().uri(&format!("/equipment/{}/photo", eq)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }

    #[actix_rt::test]
    async fn test_declared_part_length_over_limit_is_rejected() {
        let db = test_db().await;
        let zone = insert_zone(&db, "Зал").await;
        let eq = insert_equipment(&db, zone, "Скамья", "Исправен").await;
        let app = app!(db);

        let mut body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{f}\"; filename=\"p.png\"\r\n\
             Content-Type: image/png\r\nContent-Length: 6000000\r\n\r\n",
            b = BOUNDARY,
            f = PHOTO_FIELD
        )
        .into_bytes();
        body.extend_from_slice(&png_bytes());
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        let req = multipart_request(&format!("/equipment/{}/upload-photo", eq), body).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 413);

        let stored: Option<Vec<u8>> =
            sqlx::query_scalar(r#"SELECT "Фото" FROM "Оборудование" WHERE "id_оборудования" = ?1"#)
                .bind(eq)
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert!(stored.is_none());
    }
}
