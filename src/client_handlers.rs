// src/client_handlers.rs
//! Список клиентов с поиском и флагами.

use actix_web::{web, HttpResponse};
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiResult;
use crate::handlers::ApiResponse;
use crate::models::ClientRow;
use crate::pagination::{fetch_page, PageRequest};
use crate::query_builders::{flag, Listing, PredicateBuilder};
use crate::AppState;

const RECENT_DAYS: i64 = 30;

const CLIENTS: Listing<'static> = Listing {
    select: r#"SELECT "id_клиента" AS id,
                      "ФИО" AS full_name,
                      "Номер_телефона" AS phone,
                      "Дата_рождения" AS birth_date,
                      "Дата_регистрации" AS registered_on,
                      "Медицинские_данные" AS medical_data"#,
    from: r#""Клиент""#,
    order_by: r#""id_клиента""#,
};

#[derive(Debug, Deserialize, Default)]
pub struct ClientListQuery {
    pub q: Option<String>,
    pub medical: Option<String>,
    pub recent: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
}

impl ClientListQuery {
    fn filters(&self) -> PredicateBuilder {
        let mut filters = PredicateBuilder::new();
        filters
            .search(
                &[
                    r#""ФИО""#,
                    r#""Номер_телефона""#,
                    r#"CAST("id_клиента" AS TEXT)"#,
                ],
                self.q.as_deref(),
            )
            .when(
                flag(self.medical.as_deref()),
                r#"COALESCE("Медицинские_данные", '') <> ''"#,
            );

        if flag(self.recent.as_deref()) {
            // "Дата_регистрации" defaults to SQLite date('now'), which is UTC
            let since = Utc::now().date_naive() - Duration::days(RECENT_DAYS);
            filters.at_least(r#""Дата_регистрации""#, Some(since));
        }
        filters
    }
}

pub async fn get_clients(
    app_state: web::Data<Arc<AppState>>,
    query: web::Query<ClientListQuery>,
) -> ApiResult<HttpResponse> {
    let request = PageRequest::from_query(query.page.as_deref(), query.size.as_deref());
    let page = fetch_page::<ClientRow>(&app_state.db, &CLIENTS, &query.filters(), request).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(page)))
}
