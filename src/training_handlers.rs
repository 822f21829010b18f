// src/training_handlers.rs
//! Групповые и персональные тренировки: общие фильтры, разные базовые выборки.

use actix_web::{web, HttpResponse};
use chrono::{Duration, Local, NaiveDateTime};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiResult;
use crate::handlers::ApiResponse;
use crate::models::{GroupTrainingRow, PersonalTrainingRow};
use crate::pagination::{fetch_page, PageRequest};
use crate::query_builders::{datetime_filter, flag, id_filter, text_filter, Listing, PredicateBuilder};
use crate::AppState;

const RECENT_DAYS: i64 = 30;

const GROUP_TRAININGS: Listing<'static> = Listing {
    select: r#"SELECT g."id_групповой_тренировки" AS id,
                      g."Название" AS title,
                      COALESCE(g."Описание", '') AS description,
                      g."Максимум_участников" AS max_participants,
                      g."Время_начала" AS starts_at,
                      g."Время_окончания" AS ends_at,
                      COALESCE(g."Уровень_сложности", '') AS level,
                      t."id_тренера" AS trainer_id,
                      t."ФИО" AS trainer_name,
                      z."id_зоны" AS zone_id,
                      z."Название" AS zone_name"#,
    from: r#""Групповая_тренировка" g
             JOIN "Тренер" t ON t."id_тренера" = g."id_тренера"
             JOIN "Зона" z ON z."id_зоны" = g."id_зоны""#,
    order_by: r#"g."Время_начала" DESC, g."id_групповой_тренировки" DESC"#,
};

const PERSONAL_TRAININGS: Listing<'static> = Listing {
    select: r#"SELECT p."id_персональной_тренировки" AS id,
                      p."Время_начала" AS starts_at,
                      p."Время_окончания" AS ends_at,
                      p."Статус" AS status,
                      p."Стоимость" AS price,
                      p."id_абонемента" AS subscription_id,
                      a."id_клиента" AS client_id,
                      c."ФИО" AS client_name,
                      t."id_тренера" AS trainer_id,
                      t."ФИО" AS trainer_name"#,
    from: r#""Персональная_тренировка" p
             JOIN "Абонемент" a ON a."id_абонемента" = p."id_абонемента"
             JOIN "Клиент" c ON c."id_клиента" = a."id_клиента"
             JOIN "Тренер" t ON t."id_тренера" = p."id_тренера""#,
    order_by: r#"p."Время_начала" DESC, p."id_персональной_тренировки" DESC"#,
};

#[derive(Debug, Deserialize, Default)]
pub struct TrainingListQuery {
    pub q: Option<String>,
    pub trainer_id: Option<String>,
    pub zone_id: Option<String>,
    pub level: Option<String>,
    pub status: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub upcoming: Option<String>,
    pub recent: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
}

/// Validated form of the query string. Built before any database call,
/// so every malformed value is a 400.
#[derive(Debug)]
struct TrainingFilters {
    q: Option<String>,
    trainer_id: Option<i64>,
    zone_id: Option<i64>,
    level: Option<String>,
    status: Option<String>,
    from: Option<NaiveDateTime>,
    to: Option<NaiveDateTime>,
    upcoming_since: Option<NaiveDateTime>,
    recent_since: Option<NaiveDateTime>,
}

impl TrainingFilters {
    fn parse(query: &TrainingListQuery, now: NaiveDateTime) -> ApiResult<Self> {
        Ok(Self {
            q: text_filter(query.q.as_deref()),
            trainer_id: id_filter("trainer_id", query.trainer_id.as_deref())?,
            zone_id: id_filter("zone_id", query.zone_id.as_deref())?,
            level: text_filter(query.level.as_deref()),
            status: text_filter(query.status.as_deref()),
            from: datetime_filter("from", query.from.as_deref())?,
            to: datetime_filter("to", query.to.as_deref())?,
            upcoming_since: flag(query.upcoming.as_deref()).then_some(now),
            recent_since: flag(query.recent.as_deref()).then(|| now - Duration::days(RECENT_DAYS)),
        })
    }

    fn apply_time(&self, filters: &mut PredicateBuilder, start_column: &str) {
        filters
            .at_least(start_column, self.from)
            .at_most(start_column, self.to)
            .at_least(start_column, self.upcoming_since)
            .at_least(start_column, self.recent_since);
    }

    fn group(&self) -> PredicateBuilder {
        let mut filters = PredicateBuilder::new();
        filters
            .search(&[r#"g."Название""#, r#"t."ФИО""#, r#"z."Название""#], self.q.as_deref())
            .eq(r#"g."id_тренера""#, self.trainer_id)
            .eq(r#"g."id_зоны""#, self.zone_id)
            .eq(r#"g."Уровень_сложности""#, self.level.clone());
        self.apply_time(&mut filters, r#"g."Время_начала""#);
        filters
    }

    fn personal(&self) -> PredicateBuilder {
        let mut filters = PredicateBuilder::new();
        filters
            .search(&[r#"c."ФИО""#, r#"t."ФИО""#], self.q.as_deref())
            .eq(r#"p."id_тренера""#, self.trainer_id)
            .eq(r#"p."Статус""#, self.status.clone());
        self.apply_time(&mut filters, r#"p."Время_начала""#);
        filters
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub async fn get_group_trainings(
    app_state: web::Data<Arc<AppState>>,
    query: web::Query<TrainingListQuery>,
) -> ApiResult<HttpResponse> {
    let filters = TrainingFilters::parse(&query, now())?;
    let request = PageRequest::from_query(query.page.as_deref(), query.size.as_deref());

    let page = fetch_page::<GroupTrainingRow>(&app_state.db, &GROUP_TRAININGS, &filters.group(), request).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(page)))
}

pub async fn get_personal_trainings(
    app_state: web::Data<Arc<AppState>>,
    query: web::Query<TrainingListQuery>,
) -> ApiResult<HttpResponse> {
    let filters = TrainingFilters::parse(&query, now())?;
    let request = PageRequest::from_query(query.page.as_deref(), query.size.as_deref());

    let page =
        fetch_page::<PersonalTrainingRow>(&app_state.db, &PERSONAL_TRAININGS, &filters.personal(), request).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(page)))
}
