// src/db.rs - Database handle, per-call timeouts and schema migrations

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use futures_util::future::BoxFuture;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::{ApiError, ApiResult};

/// Shared handle passed to every handler through `AppState`.
/// Cloning is cheap: the pool is reference counted.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    call_timeout: Duration,
}

impl Database {
    pub fn new(pool: SqlitePool, call_timeout: Duration) -> Self {
        Self { pool, call_timeout }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Runs one database call under the configured timeout.
    /// A call that does not finish in time is dropped, which aborts it.
    pub async fn timed<T, F>(&self, call: F) -> ApiResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result.map_err(ApiError::from),
            Err(_) => {
                log::warn!("Database call exceeded {:?}", self.call_timeout);
                Err(ApiError::Timeout)
            }
        }
    }

    /// Scoped transaction: commits only when `work` returns `Ok`,
    /// rolls back on any error or on timeout.
    pub async fn in_transaction<T, F>(&self, work: F) -> ApiResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut Transaction<'static, Sqlite>) -> BoxFuture<'c, ApiResult<T>>,
    {
        let mut tx = self.timed(self.pool.begin()).await?;

        let outcome = match tokio::time::timeout(self.call_timeout, work(&mut tx)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                log::warn!("Transaction exceeded {:?}", self.call_timeout);
                Err(ApiError::Timeout)
            }
        };

        match outcome {
            Ok(value) => {
                self.timed(tx.commit()).await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    log::error!("Transaction rollback failed: {}", rollback_err);
                }
                Err(err)
            }
        }
    }
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS "Клиент" (
        "id_клиента" INTEGER PRIMARY KEY AUTOINCREMENT,
        "ФИО" TEXT NOT NULL CHECK(length("ФИО") > 0),
        "Номер_телефона" TEXT,
        "Дата_рождения" DATE,
        "Дата_регистрации" DATE NOT NULL DEFAULT (date('now')),
        "Медицинские_данные" TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "Тренер" (
        "id_тренера" INTEGER PRIMARY KEY AUTOINCREMENT,
        "ФИО" TEXT NOT NULL CHECK(length("ФИО") > 0),
        "Номер_телефона" TEXT,
        "Специализация" TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "Тариф" (
        "id_тарифа" INTEGER PRIMARY KEY AUTOINCREMENT,
        "Название" TEXT NOT NULL,
        "Описание" TEXT,
        "Стоимость" REAL NOT NULL DEFAULT 0 CHECK("Стоимость" >= 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "Абонемент" (
        "id_абонемента" INTEGER PRIMARY KEY AUTOINCREMENT,
        "id_клиента" INTEGER NOT NULL REFERENCES "Клиент" ("id_клиента"),
        "id_тарифа" INTEGER NOT NULL REFERENCES "Тариф" ("id_тарифа"),
        "Дата_начала" DATE NOT NULL,
        "Дата_окончания" DATE NOT NULL,
        "Статус" TEXT NOT NULL DEFAULT 'Активен',
        "Цена" REAL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "Зона" (
        "id_зоны" INTEGER PRIMARY KEY AUTOINCREMENT,
        "Название" TEXT NOT NULL,
        "Описание" TEXT,
        "Вместимость" INTEGER NOT NULL DEFAULT 1 CHECK("Вместимость" > 0),
        "Статус" TEXT NOT NULL DEFAULT 'Доступна' CHECK(
            "Статус" IN ('Доступна', 'На ремонте', 'Закрыта')
        ),
        "Фото" BLOB
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "Оборудование" (
        "id_оборудования" INTEGER PRIMARY KEY AUTOINCREMENT,
        "id_зоны" INTEGER NOT NULL REFERENCES "Зона" ("id_зоны"),
        "Название" TEXT NOT NULL,
        "Дата_покупки" DATE,
        "Дата_последнего_ТО" DATE,
        "Статус" TEXT NOT NULL DEFAULT 'Исправен' CHECK(
            "Статус" IN ('Исправен', 'На ремонте', 'Списан')
        ),
        "Фото" BLOB
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "Заявка_на_ремонт" (
        "id_заявки" INTEGER PRIMARY KEY AUTOINCREMENT,
        "id_оборудования" INTEGER NOT NULL
            REFERENCES "Оборудование" ("id_оборудования") ON DELETE CASCADE,
        "Дата_создания" DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        "Описание_проблемы" TEXT NOT NULL,
        "Статус" TEXT NOT NULL DEFAULT 'Открыта' CHECK(
            "Статус" IN ('Открыта', 'В работе', 'Закрыта')
        ),
        "Приоритет" TEXT NOT NULL DEFAULT 'Средний',
        "Фото" BLOB
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "Групповая_тренировка" (
        "id_групповой_тренировки" INTEGER PRIMARY KEY AUTOINCREMENT,
        "id_тренера" INTEGER NOT NULL REFERENCES "Тренер" ("id_тренера"),
        "id_зоны" INTEGER NOT NULL REFERENCES "Зона" ("id_зоны"),
        "Название" TEXT NOT NULL,
        "Описание" TEXT,
        "Максимум_участников" INTEGER NOT NULL DEFAULT 10 CHECK("Максимум_участников" > 0),
        "Время_начала" DATETIME NOT NULL,
        "Время_окончания" DATETIME NOT NULL,
        "Уровень_сложности" TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "Персональная_тренировка" (
        "id_персональной_тренировки" INTEGER PRIMARY KEY AUTOINCREMENT,
        "id_абонемента" INTEGER NOT NULL REFERENCES "Абонемент" ("id_абонемента"),
        "id_тренера" INTEGER NOT NULL REFERENCES "Тренер" ("id_тренера"),
        "Время_начала" DATETIME NOT NULL,
        "Время_окончания" DATETIME NOT NULL,
        "Статус" TEXT NOT NULL DEFAULT 'Запланирована',
        "Стоимость" REAL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "Запись_на_групповую_тренировку" (
        "id_записи" INTEGER PRIMARY KEY AUTOINCREMENT,
        "id_групповой_тренировки" INTEGER NOT NULL
            REFERENCES "Групповая_тренировка" ("id_групповой_тренировки"),
        "id_абонемента" INTEGER NOT NULL REFERENCES "Абонемент" ("id_абонемента"),
        "Статус" TEXT NOT NULL DEFAULT 'Записан'
    )
    "#,
    r#"CREATE INDEX IF NOT EXISTS idx_equipment_zone ON "Оборудование" ("id_зоны")"#,
    r#"CREATE INDEX IF NOT EXISTS idx_repair_equipment_status ON "Заявка_на_ремонт" ("id_оборудования", "Статус")"#,
    r#"CREATE INDEX IF NOT EXISTS idx_group_start ON "Групповая_тренировка" ("Время_начала")"#,
    r#"CREATE INDEX IF NOT EXISTS idx_personal_start ON "Персональная_тренировка" ("Время_начала")"#,
    r#"CREATE INDEX IF NOT EXISTS idx_personal_subscription ON "Персональная_тренировка" ("id_абонемента")"#,
    r#"CREATE INDEX IF NOT EXISTS idx_enrollment_subscription ON "Запись_на_групповую_тренировку" ("id_абонемента")"#,
];

/// Options every pooled connection is opened with. `REGEXP` backs the
/// case-insensitive listing search.
pub fn connect_options(url: &str) -> Result<SqliteConnectOptions> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .with_regexp();
    Ok(options)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Enable foreign keys and WAL mode
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(pool)
        .await?;

    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    log::info!("Database schema is up to date ({} statements)", SCHEMA.len());
    Ok(())
}
