// src/pagination.rs
//! Page-based пагинация поверх PredicateBuilder: сначала COUNT, затем страница
//! с теми же аргументами фильтра + [limit, offset].

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;

use crate::db::Database;
use crate::error::ApiResult;
use crate::query_builders::{to_arguments, Listing, PredicateBuilder};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

// ==================== REQUEST ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
}

impl PageRequest {
    /// Never fails: page below 1 becomes 1, size outside 1..=100 becomes 20.
    pub fn new(page: Option<i64>, size: Option<i64>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let size = match size {
            Some(s) if (1..=MAX_PAGE_SIZE).contains(&s) => s,
            _ => DEFAULT_PAGE_SIZE,
        };
        Self { page, size }
    }

    /// Raw query-string values; unparsable numbers fall back to defaults.
    pub fn from_query(page: Option<&str>, size: Option<&str>) -> Self {
        let parse = |raw: Option<&str>| raw.and_then(|s| s.trim().parse::<i64>().ok());
        Self::new(parse(page), parse(size))
    }

    pub fn limit(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

// ==================== RESPONSE ====================

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PaginationInfo {
    pub page: i64,
    pub size: i64,
    pub total: i64,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev: Option<i64>,
    pub next: Option<i64>,
}

impl PaginationInfo {
    pub fn from_page(total: i64, request: PageRequest) -> Self {
        let has_next = request.page.saturating_mul(request.size) < total;
        let has_prev = request.page > 1;
        Self {
            page: request.page,
            size: request.size,
            total,
            has_prev,
            has_next,
            prev: has_prev.then(|| request.page - 1),
            next: has_next.then(|| request.page + 1),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PaginationInfo,
}

// ==================== FETCH ====================

pub async fn fetch_page<T>(
    db: &Database,
    listing: &Listing<'_>,
    filters: &PredicateBuilder,
    request: PageRequest,
) -> ApiResult<Page<T>>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let built = filters.build(listing, request.limit(), request.offset());

    let total: i64 = db
        .timed(
            sqlx::query_scalar_with(&built.count_sql, to_arguments(&built.count_args))
                .fetch_one(db.pool()),
        )
        .await?;

    let items: Vec<T> = if total == 0 {
        Vec::new()
    } else {
        db.timed(
            sqlx::query_as_with(&built.page_sql, to_arguments(&built.page_args))
                .fetch_all(db.pool()),
        )
        .await?
    };

    Ok(Page {
        items,
        pagination: PaginationInfo::from_page(total, request),
    })
}
