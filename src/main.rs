// Gym back office: HTTP server wiring
use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::{Compress, DefaultHeaders, Logger};
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Module declarations
mod assets;
mod client_handlers;
mod config;
mod db;
mod equipment_handlers;
mod error;
mod handlers;
mod models;
mod monitoring;
mod pagination;
mod query_builders;
mod status_sync;
mod subscription_handlers;
mod training_handlers;
mod zone_handlers;

use crate::config::{load_config, Config};
use crate::db::Database;
use crate::error::ApiError;

const JSON_LIMIT: usize = 256 * 1024;

pub struct AppState {
    pub db: Database,
}

// ==================== MAIN ====================

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (this calls load_env_file internally)
    let config = load_config()?;

    setup_logging(&config)?;
    config.print_startup_info();

    let pool = create_database_pool(&config.database).await?;
    db::run_migrations(&pool).await?;

    let app_state = Arc::new(AppState {
        db: Database::new(pool, config.database.call_timeout()),
    });

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    log::info!("Starting server at http://{}", bind_address);

    let server_config = config.clone();
    let mut server = HttpServer::new(move || {
        let cors = setup_improved_cors(&server_config);
        let security_headers = setup_security_headers(&server_config.security);

        App::new()
            .wrap(cors)
            .wrap(security_headers)
            .wrap(Logger::default())
            .wrap(Compress::default())
            .app_data(web::Data::new(app_state.clone()))
            .app_data(json_config())
            .app_data(query_config())
            // Health checks
            .route("/health", web::get().to(monitoring::health_check))
            .route("/ready", web::get().to(monitoring::readiness_check))
            .service(
                web::scope("/api")
                    .route("/clients", web::get().to(client_handlers::get_clients))
                    .service(
                        web::scope("/trainings")
                            .route("/group", web::get().to(training_handlers::get_group_trainings))
                            .route("/personal", web::get().to(training_handlers::get_personal_trainings)),
                    )
                    .configure(equipment_handlers::configure)
                    .configure(zone_handlers::configure)
                    .configure(subscription_handlers::configure),
            )
    })
    .keep_alive(Duration::from_secs(config.server.keep_alive));

    if let Some(workers) = config.server.workers {
        server = server.workers(workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run()
        .await
        .context("Server failed to run")?;

    Ok(())
}

// ==================== HELPER FUNCTIONS ====================

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| ApiError::BadRequest(format!("Некорректный JSON: {}", err)).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(format!("Некорректный запрос: {}", err)).into())
}

pub fn setup_improved_cors(config: &Config) -> Cors {
    let allowed_origins = &config.security.allowed_origins;
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::IF_NONE_MATCH,
        ])
        .expose_headers(vec![header::CONTENT_LENGTH, header::ETAG])
        .max_age(3600);

    if allowed_origins.iter().any(|o| o == "*") {
        if config.is_production() {
            log::error!("Wildcard CORS origin (*) ignored in production");
        } else {
            log::warn!("Using wildcard CORS (*) in development mode");
            return cors.allow_any_origin().allow_any_header().allow_any_method();
        }
    }

    for origin in allowed_origins.iter().filter(|o| !o.is_empty() && o.as_str() != "*") {
        log::debug!("Adding CORS origin: {}", origin);
        cors = cors.allowed_origin(origin);
    }
    cors
}

fn setup_logging(config: &Config) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            let level = config.logging.level.as_str();
            tracing_subscriber::EnvFilter::new(level)
        });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(())
}

async fn create_database_pool(db_config: &config::DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let options = db::connect_options(&db_config.url)
        .with_context(|| format!("Invalid DATABASE_URL: {}", db_config.url))?;

    let pool = SqlitePoolOptions::new()
        .max_connections(db_config.max_connections)
        .min_connections(db_config.min_connections)
        .acquire_timeout(Duration::from_secs(db_config.connect_timeout))
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database {}", db_config.url))?;
    Ok(pool)
}

fn setup_security_headers(config: &config::SecurityConfig) -> DefaultHeaders {
    let mut headers = DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "DENY"))
        .add(("Referrer-Policy", "strict-origin-when-cross-origin"));

    if config.require_https {
        headers = headers.add((
            "Strict-Transport-Security",
            "max-age=31536000; includeSubDomains",
        ));
    }

    headers
}

#[cfg(test)]
pub fn test_state(db: Database) -> Arc<AppState> {
    Arc::new(AppState { db })
}
