// src/query_builders/value.rs
//! Типы значений фильтра для безопасного биндинга в sqlx

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::sqlite::SqliteArguments;
use sqlx::Arguments;

/// Значение параметра - типобезопасный контейнер для биндинга
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl SqlValue {
    #[inline] pub fn text(s: impl Into<String>) -> Self { SqlValue::Text(s.into()) }
    #[inline] pub fn integer(n: i64) -> Self { SqlValue::Integer(n) }

    fn add_to(&self, args: &mut SqliteArguments<'static>) {
        match self {
            SqlValue::Text(s) => args.add(s.clone()),
            SqlValue::Integer(n) => args.add(*n),
            SqlValue::Date(d) => args.add(*d),
            SqlValue::Timestamp(t) => args.add(*t),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(n: i64) -> Self {
        SqlValue::Integer(n)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(d: NaiveDate) -> Self {
        SqlValue::Date(d)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(t: NaiveDateTime) -> Self {
        SqlValue::Timestamp(t)
    }
}

/// Собирает аргументы в порядке ординалов: values[0] -> ?1, values[1] -> ?2 ...
pub fn to_arguments(values: &[SqlValue]) -> SqliteArguments<'static> {
    let mut args = SqliteArguments::default();
    for value in values {
        value.add_to(&mut args);
    }
    args
}
