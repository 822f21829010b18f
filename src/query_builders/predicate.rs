// src/query_builders/predicate.rs
//! Построитель WHERE с нумерованными плейсхолдерами (?1, ?2, ...).
//!
//! Каждый фильтр добавляет свою клаузу и свои аргументы; номер плейсхолдера
//! всегда равен позиции аргумента в списке. COUNT и страничный запрос
//! строятся из одного и того же списка, поэтому ординалы у них совпадают,
//! а LIMIT/OFFSET получают два следующих номера.

use super::search_pattern;
use super::value::SqlValue;

/// Fixed part of a listing: projection, relation (with joins) and ordering.
#[derive(Debug, Clone, Copy)]
pub struct Listing<'a> {
    pub select: &'a str,
    pub from: &'a str,
    pub order_by: &'a str,
}

/// Both statements of one listing plus their argument lists.
#[derive(Debug, Clone)]
pub struct BuiltQuery {
    pub count_sql: String,
    pub page_sql: String,
    pub count_args: Vec<SqlValue>,
    pub page_args: Vec<SqlValue>,
}

#[derive(Debug, Default, Clone)]
pub struct PredicateBuilder {
    clauses: Vec<String>,
    args: Vec<SqlValue>,
}

impl PredicateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn bind(&mut self, value: SqlValue) -> String {
        self.args.push(value);
        format!("?{}", self.args.len())
    }

    /// Поиск подстроки по нескольким колонкам без учёта регистра: одна
    /// OR-группа, свой ординал на каждую колонку даже при одинаковом значении.
    /// Нужна функция `REGEXP` на соединении (см. `db::connect_options`).
    pub fn search(&mut self, columns: &[&str], term: Option<&str>) -> &mut Self {
        let term = match term.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => t,
            None => return self,
        };
        if columns.is_empty() {
            return self;
        }

        let pattern = search_pattern(term);
        let parts: Vec<String> = columns
            .iter()
            .map(|column| {
                let ph = self.bind(SqlValue::text(pattern.clone()));
                format!("COALESCE({}, '') REGEXP {}", column, ph)
            })
            .collect();

        self.clauses.push(format!("({})", parts.join(" OR ")));
        self
    }

    pub fn eq(&mut self, column: &str, value: Option<impl Into<SqlValue>>) -> &mut Self {
        if let Some(value) = value {
            let ph = self.bind(value.into());
            self.clauses.push(format!("{} = {}", column, ph));
        }
        self
    }

    pub fn at_least(&mut self, column: &str, value: Option<impl Into<SqlValue>>) -> &mut Self {
        if let Some(value) = value {
            let ph = self.bind(value.into());
            self.clauses.push(format!("{} >= {}", column, ph));
        }
        self
    }

    pub fn at_most(&mut self, column: &str, value: Option<impl Into<SqlValue>>) -> &mut Self {
        if let Some(value) = value {
            let ph = self.bind(value.into());
            self.clauses.push(format!("{} <= {}", column, ph));
        }
        self
    }

    /// Клауза без параметров (флаги вида `medical=1`).
    pub fn when(&mut self, active: bool, clause: &str) -> &mut Self {
        if active {
            self.clauses.push(clause.to_string());
        }
        self
    }

    /// `" WHERE a AND b"` or an empty string when no filter is active.
    pub fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn build(&self, listing: &Listing<'_>, limit: i64, offset: i64) -> BuiltQuery {
        let where_sql = self.where_clause();
        let n = self.args.len();

        let count_sql = format!("SELECT COUNT(*) FROM {}{}", listing.from, where_sql);
        let page_sql = format!(
            "{} FROM {}{} ORDER BY {} LIMIT ?{} OFFSET ?{}",
            listing.select,
            listing.from,
            where_sql,
            listing.order_by,
            n + 1,
            n + 2
        );

        let count_args = self.args.clone();
        let mut page_args = self.args.clone();
        page_args.push(SqlValue::integer(limit));
        page_args.push(SqlValue::integer(offset));

        BuiltQuery { count_sql, page_sql, count_args, page_args }
    }
}
