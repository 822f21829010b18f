// src/query_builders/mod.rs
//! Query builders для безопасного построения SQL запросов

pub mod predicate;
pub mod value;

pub use predicate::{Listing, PredicateBuilder};
pub use value::to_arguments;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{ApiError, ApiResult};

// ==================== ЭКРАНИРОВАНИЕ ====================

/// Шаблон подстрочного поиска для `REGEXP`: термин берётся буквально,
/// регистр не учитывается для любых букв, включая кириллицу.
pub fn search_pattern(term: &str) -> String {
    format!("(?i){}", regex::escape(term))
}

// ==================== РАЗБОР ВХОДНЫХ ФИЛЬТРОВ ====================
// Все ошибки разбора - 400, до обращения к БД.

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Checkbox-style flag: only `"1"` switches it on.
pub fn flag(raw: Option<&str>) -> bool {
    present(raw) == Some("1")
}

pub fn text_filter(raw: Option<&str>) -> Option<String> {
    present(raw).map(str::to_string)
}

/// Foreign-key filter: positive integer or absent.
pub fn id_filter(name: &str, raw: Option<&str>) -> ApiResult<Option<i64>> {
    match present(raw) {
        None => Ok(None),
        Some(s) => match s.parse::<i64>() {
            Ok(id) if id > 0 => Ok(Some(id)),
            _ => Err(ApiError::BadRequest(format!("Некорректный фильтр {}: {}", name, s))),
        },
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM` and `YYYY-MM-DDTHH:MM:SS`
/// (a space works in place of `T`). A bare date means midnight.
pub fn datetime_filter(name: &str, raw: Option<&str>) -> ApiResult<Option<NaiveDateTime>> {
    let s = match present(raw) {
        None => return Ok(None),
        Some(s) => s,
    };

    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d %H:%M:%S",
    ];
    for format in FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Some(t));
        }
    }
    if let Some(t) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(Some(t));
    }

    Err(ApiError::BadRequest(format!("Некорректная дата {}: {}", name, s)))
}

/// Path id: positive integer, otherwise `400 Некорректный id`.
pub fn path_id(raw: &str) -> ApiResult<i64> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::invalid_id()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_pattern_is_literal_and_case_blind() {
        assert_eq!(search_pattern("Иванов"), "(?i)Иванов");
        assert_eq!(search_pattern("50%_off"), "(?i)50%_off");
        assert_eq!(search_pattern("a.b+"), "(?i)a\\.b\\+");

        let re = regex::Regex::new(&search_pattern("иванов")).unwrap();
        assert!(re.is_match("Иванов Иван"));
        assert!(!regex::Regex::new(&search_pattern(".")).unwrap().is_match("Иванов"));
    }

    #[test]
    fn test_flag() {
        assert!(flag(Some("1")));
        assert!(!flag(Some("0")));
        assert!(!flag(Some("true")));
        assert!(!flag(None));
    }

    #[test]
    fn test_id_filter() {
        assert_eq!(id_filter("zone_id", None).unwrap(), None);
        assert_eq!(id_filter("zone_id", Some(" ")).unwrap(), None);
        assert_eq!(id_filter("zone_id", Some("12")).unwrap(), Some(12));
        assert!(matches!(id_filter("zone_id", Some("abc")), Err(ApiError::BadRequest(_))));
        assert!(matches!(id_filter("zone_id", Some("-3")), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_datetime_filter_formats() {
        let midnight = datetime_filter("from", Some("2024-03-05")).unwrap().unwrap();
        assert_eq!(midnight.to_string(), "2024-03-05 00:00:00");

        let minutes = datetime_filter("from", Some("2024-03-05T18:30")).unwrap().unwrap();
        assert_eq!(minutes.to_string(), "2024-03-05 18:30:00");

        assert!(datetime_filter("to", Some("05.03.2024")).is_err());
        assert!(datetime_filter("to", Some("2024-13-01")).is_err());
        assert_eq!(datetime_filter("to", None).unwrap(), None);
    }

    #[test]
    fn test_path_id() {
        assert_eq!(path_id("42").unwrap(), 42);
        assert!(path_id("0").is_err());
        assert!(path_id("x1").is_err());
    }
}
