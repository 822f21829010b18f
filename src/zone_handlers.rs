// src/zone_handlers.rs
use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use std::sync::Arc;

use crate::assets::{self, AssetOwner};
use crate::error::ApiResult;
use crate::AppState;

pub async fn upload_zone_photo(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    assets::upload_photo(AssetOwner::Zone, app_state, &path.into_inner(), payload).await
}

pub async fn get_zone_photo(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    req: HttpRequest,
) -> ApiResult<HttpResponse> {
    assets::get_photo(AssetOwner::Zone, app_state, &path.into_inner(), req).await
}

pub async fn delete_zone_photo(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    assets::clear_photo(AssetOwner::Zone, app_state, &path.into_inner()).await
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/zones")
            .route("/{id}/upload-photo", web::post().to(upload_zone_photo))
            .route("/{id}/photo", web::get().to(get_zone_photo))
            .route("/{id}/photo", web::delete().to(delete_zone_photo)),
    );
}
