// src/assets.rs
//! Фото, хранящиеся прямо в строке владельца (BLOB-колонка "Фото").
//!
//! One set of rules for every owner: size ceiling checked against the
//! declared part length and again while reading, content type sniffed from
//! the bytes themselves, weak ETag derived from the bytes for conditional GET.

use actix_multipart::{Field, Multipart};
use actix_web::http::header::{self, CacheControl, CacheDirective, ETag, EntityTag, IfNoneMatch};
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use futures_util::StreamExt;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::db::Database;
use crate::error::{ApiError, ApiResult};
use crate::handlers::ApiResponse;
use crate::query_builders::path_id;
use crate::AppState;

pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;
pub const PHOTO_FIELD: &str = "photo";
const SNIFF_LEN: usize = 512;
const MAX_AGE_SECS: u32 = 3600;
const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

// ==================== OWNERS ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetOwner {
    Zone,
    Equipment,
    RepairTicket,
}

impl AssetOwner {
    fn table(self) -> &'static str {
        match self {
            AssetOwner::Zone => "Зона",
            AssetOwner::Equipment => "Оборудование",
            AssetOwner::RepairTicket => "Заявка_на_ремонт",
        }
    }

    fn id_column(self) -> &'static str {
        match self {
            AssetOwner::Zone => "id_зоны",
            AssetOwner::Equipment => "id_оборудования",
            AssetOwner::RepairTicket => "id_заявки",
        }
    }

    fn not_found(self) -> ApiError {
        ApiError::not_found(match self {
            AssetOwner::Zone => "Зона не найдена",
            AssetOwner::Equipment => "Оборудование не найдено",
            AssetOwner::RepairTicket => "Заявка не найдена",
        })
    }
}

// ==================== VALIDATION ====================

/// MIME type guessed from the first 512 bytes; anything unrecognised is
/// `application/octet-stream`.
pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    let head = &bytes[..bytes.len().min(SNIFF_LEN)];
    match image::guess_format(head) {
        Ok(format) => format.to_mime_type(),
        Err(_) => FALLBACK_CONTENT_TYPE,
    }
}

/// Checks a complete payload and returns its sniffed content type.
pub fn validate_photo(bytes: &[u8]) -> ApiResult<&'static str> {
    if bytes.is_empty() {
        return Err(ApiError::too_large("Пустой файл"));
    }
    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(ApiError::too_large("Фото превышает 5 МБ"));
    }

    let content_type = sniff_content_type(bytes);
    if !ALLOWED_IMAGE_TYPES.contains(&content_type) {
        return Err(ApiError::ValidationError(
            "Разрешены только JPEG/PNG/WebP".to_string(),
        ));
    }
    Ok(content_type)
}

/// Hex of the first 16 bytes of SHA-256 over the asset.
pub fn content_validator(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(&digest[..16])
}

// ==================== MULTIPART ====================

/// Reads one file part, never buffering more than the ceiling.
pub async fn read_photo_field(field: &mut Field) -> ApiResult<Vec<u8>> {
    let declared = field
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<usize>().ok());
    if matches!(declared, Some(len) if len > MAX_PHOTO_BYTES) {
        return Err(ApiError::too_large("Фото превышает 5 МБ"));
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| ApiError::BadRequest(format!("Ошибка чтения файла: {}", e)))?;
        if bytes.len() + chunk.len() > MAX_PHOTO_BYTES {
            return Err(ApiError::too_large("Фото превышает 5 МБ"));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Reads a short text part (form fields next to the photo).
pub async fn read_text_field(field: &mut Field, limit: usize) -> ApiResult<String> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| ApiError::BadRequest(format!("Ошибка чтения формы: {}", e)))?;
        if bytes.len() + chunk.len() > limit {
            return Err(ApiError::bad_request("Слишком длинное поле формы"));
        }
        bytes.extend_from_slice(&chunk);
    }
    String::from_utf8(bytes).map_err(|_| ApiError::bad_request("Поле формы не в UTF-8"))
}

async fn take_photo(mut payload: Multipart) -> ApiResult<Vec<u8>> {
    let mut photo = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?;
        let is_photo = field.content_disposition().get_name() == Some(PHOTO_FIELD);

        if is_photo && photo.is_none() {
            photo = Some(read_photo_field(&mut field).await?);
        } else {
            // drain unrelated parts
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?;
            }
        }
    }

    photo.ok_or_else(|| ApiError::bad_request("Файл photo не передан"))
}

// ==================== STORAGE ====================

/// Overwrites the owner's photo in one UPDATE.
pub async fn store(db: &Database, owner: AssetOwner, id: i64, bytes: &[u8]) -> ApiResult<()> {
    let sql = format!(
        r#"UPDATE "{}" SET "Фото" = ?2 WHERE "{}" = ?1"#,
        owner.table(),
        owner.id_column()
    );
    let result = db
        .timed(sqlx::query(&sql).bind(id).bind(bytes).execute(db.pool()))
        .await?;

    if result.rows_affected() == 0 {
        return Err(owner.not_found());
    }
    Ok(())
}

/// Missing owner and missing photo are both `NotFound`.
pub async fn fetch(db: &Database, owner: AssetOwner, id: i64) -> ApiResult<Vec<u8>> {
    let sql = format!(
        r#"SELECT "Фото" FROM "{}" WHERE "{}" = ?1"#,
        owner.table(),
        owner.id_column()
    );
    let row: Option<Option<Vec<u8>>> = db
        .timed(sqlx::query_scalar(&sql).bind(id).fetch_optional(db.pool()))
        .await?;

    match row {
        None => Err(owner.not_found()),
        Some(None) => Err(ApiError::not_found("Фото отсутствует")),
        Some(Some(bytes)) if bytes.is_empty() => Err(ApiError::not_found("Фото отсутствует")),
        Some(Some(bytes)) => Ok(bytes),
    }
}

pub async fn clear(db: &Database, owner: AssetOwner, id: i64) -> ApiResult<()> {
    let sql = format!(
        r#"UPDATE "{}" SET "Фото" = NULL WHERE "{}" = ?1"#,
        owner.table(),
        owner.id_column()
    );
    let result = db
        .timed(sqlx::query(&sql).bind(id).execute(db.pool()))
        .await?;

    if result.rows_affected() == 0 {
        return Err(owner.not_found());
    }
    Ok(())
}

// ==================== HTTP ====================

fn cache_control() -> CacheControl {
    CacheControl(vec![CacheDirective::Public, CacheDirective::MaxAge(MAX_AGE_SECS)])
}

/// 304 without a body when the client already holds these bytes,
/// otherwise the bytes with their validator.
pub fn photo_response(req: &HttpRequest, bytes: Vec<u8>) -> HttpResponse {
    let tag = EntityTag::new_weak(content_validator(&bytes));

    let fresh = match req.get_header::<IfNoneMatch>() {
        Some(IfNoneMatch::Any) => true,
        Some(IfNoneMatch::Items(items)) => items.iter().any(|seen| seen.weak_eq(&tag)),
        None => false,
    };
    if fresh {
        return HttpResponse::NotModified()
            .insert_header(ETag(tag))
            .insert_header(cache_control())
            .finish();
    }

    let content_type = match sniff_content_type(&bytes) {
        ct if ct.starts_with("image/") => ct,
        _ => FALLBACK_CONTENT_TYPE,
    };

    HttpResponse::Ok()
        .content_type(content_type)
        .insert_header(ETag(tag))
        .insert_header(cache_control())
        .body(bytes)
}

#[derive(Debug, Serialize)]
pub struct StoredPhoto {
    pub id: i64,
    pub content_type: &'static str,
    pub size: usize,
}

pub async fn upload_photo(
    owner: AssetOwner,
    app_state: web::Data<Arc<AppState>>,
    raw_id: &str,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let id = path_id(raw_id)?;
    let bytes = take_photo(payload).await?;
    let content_type = validate_photo(&bytes)?;

    store(&app_state.db, owner, id, &bytes).await?;
    log::info!("Stored {} byte {} photo for {:?} {}", bytes.len(), content_type, owner, id);

    let stored = StoredPhoto { id, content_type, size: bytes.len() };
    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        stored,
        "Фото загружено".to_string(),
    )))
}

pub async fn get_photo(
    owner: AssetOwner,
    app_state: web::Data<Arc<AppState>>,
    raw_id: &str,
    req: HttpRequest,
) -> ApiResult<HttpResponse> {
    let id = path_id(raw_id)?;
    let bytes = fetch(&app_state.db, owner, id).await?;
    Ok(photo_response(&req, bytes))
}

pub async fn clear_photo(
    owner: AssetOwner,
    app_state: web::Data<Arc<AppState>>,
    raw_id: &str,
) -> ApiResult<HttpResponse> {
    let id = path_id(raw_id)?;
    clear(&app_state.db, owner, id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(id, "Фото удалено".to_string())))
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::db::test_support::*;

    #[test]
    fn test_sniffing() {
        assert_eq!(sniff_content_type(&png_bytes()), "image/png");
        assert_eq!(sniff_content_type(&jpeg_bytes()), "image/jpeg");
        assert_eq!(sniff_content_type(&webp_bytes()), "image/webp");
        assert_eq!(sniff_content_type(b"hello, plain text"), FALLBACK_CONTENT_TYPE);
    }

    #[test]
    fn test_validate_photo() {
        assert!(matches!(validate_photo(&[]), Err(ApiError::PayloadTooLarge(_))));
        assert!(matches!(
            validate_photo(b"just text named photo.png"),
            Err(ApiError::ValidationError(_))
        ));

        let mut huge = png_bytes();
        huge.resize(MAX_PHOTO_BYTES + 1, 0);
        assert!(matches!(validate_photo(&huge), Err(ApiError::PayloadTooLarge(_))));

        assert_eq!(validate_photo(&webp_bytes()).unwrap(), "image/webp");
    }

    #[test]
    fn test_validator_is_stable_and_content_bound() {
        let bytes = png_bytes();
        assert_eq!(content_validator(&bytes), content_validator(&bytes.clone()));
        assert_eq!(content_validator(&bytes).len(), 32);

        let mut changed = bytes.clone();
        changed[20] ^= 0xFF;
        assert_ne!(content_validator(&bytes), content_validator(&changed));
    }

    #[actix_rt::test]
    async fn test_store_fetch_clear() {
        let db = test_db().await;
        let zone = insert_zone(&db, "Кардио").await;

        assert!(matches!(fetch(&db, AssetOwner::Zone, zone).await, Err(ApiError::NotFound(_))));

        let bytes = jpeg_bytes();
        store(&db, AssetOwner::Zone, zone, &bytes).await.unwrap();
        assert_eq!(fetch(&db, AssetOwner::Zone, zone).await.unwrap(), bytes);

        // full overwrite
        let replacement = png_bytes();
        store(&db, AssetOwner::Zone, zone, &replacement).await.unwrap();
        assert_eq!(fetch(&db, AssetOwner::Zone, zone).await.unwrap(), replacement);

        clear(&db, AssetOwner::Zone, zone).await.unwrap();
        assert!(matches!(fetch(&db, AssetOwner::Zone, zone).await, Err(ApiError::NotFound(_))));

        let stored_null: Option<Vec<u8>> =
            sqlx::query_scalar(r#"SELECT "Фото" FROM "Зона" WHERE "id_зоны" = ?1"#)
                .bind(zone)
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert!(stored_null.is_none());
    }

    #[actix_rt::test]
    async fn test_missing_owner_is_not_found() {
        let db = test_db().await;

        for owner in [AssetOwner::Zone, AssetOwner::Equipment, AssetOwner::RepairTicket] {
            assert!(matches!(store(&db, owner, 404, &png_bytes()).await, Err(ApiError::NotFound(_))));
            assert!(matches!(fetch(&db, owner, 404).await, Err(ApiError::NotFound(_))));
            assert!(matches!(clear(&db, owner, 404).await, Err(ApiError::NotFound(_))));
        }
    }

    #[actix_rt::test]
    async fn test_empty_blob_counts_as_absent() {
        let db = test_db().await;
        let zone = insert_zone(&db, "Бассейн").await;
        sqlx::query(r#"UPDATE "Зона" SET "Фото" = X'' WHERE "id_зоны" = ?1"#)
            .bind(zone)
            .execute(db.pool())
            .await
            .unwrap();

        assert!(matches!(fetch(&db, AssetOwner::Zone, zone).await, Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_photo_response_conditional() {
        use actix_web::test::TestRequest;

        let bytes = png_bytes();
        let current = format!("W/\"{}\"", content_validator(&bytes));

        let req = TestRequest::default().to_http_request();
        let resp = photo_response(&req, bytes.clone());
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers().get(header::ETAG).unwrap().to_str().unwrap(), current);
        assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
        assert_eq!(
            resp.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=3600"
        );

        let req = TestRequest::default()
            .insert_header((header::IF_NONE_MATCH, current.as_str()))
            .to_http_request();
        assert_eq!(photo_response(&req, bytes.clone()).status(), 304);

        let req = TestRequest::default()
            .insert_header((header::IF_NONE_MATCH, "W/\"0000\""))
            .to_http_request();
        assert_eq!(photo_response(&req, bytes).status(), 200);
    }

    #[test]
    fn test_non_image_bytes_are_served_as_octet_stream() {
        use actix_web::test::TestRequest;

        let req = TestRequest::default().to_http_request();
        let resp = photo_response(&req, b"%PDF-1.4 legacy upload".to_vec());
        assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), FALLBACK_CONTENT_TYPE);
    }
}
