mod catalog;
mod config;
mod core;
mod models;
mod routes;
mod services;

use crate::catalog::Catalog;
use crate::config::Settings;
use crate::routes::search::AppState;
use crate::services::{AnnotationClient, AnnotationConfig, AnnotationScheduler};
use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .content_type("application/json")
            .body(serde_json::to_string(self).unwrap())
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Initialize logging
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting Coffinding matching service...");

    // Load configuration
    let settings = Settings::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        panic!("Configuration error: {}", e);
    });

    info!("Configuration loaded successfully");

    if settings.openrouter.api_key.is_empty() {
        error!("No OpenRouter API key configured; annotations will fall back to offline text");
    }

    // Initialize the annotation client from injected configuration
    let model = settings.openrouter.model.clone();
    let annotation_config = AnnotationConfig {
        endpoint: settings.openrouter.endpoint,
        api_key: settings.openrouter.api_key,
        model: settings.openrouter.model,
        referer: settings.openrouter.referer,
        app_title: settings.openrouter.app_title,
        max_attempts: settings.annotation.max_attempts,
        rate_limit_backoff: Duration::from_millis(settings.annotation.rate_limit_backoff_ms),
        transport_backoff: Duration::from_millis(settings.annotation.transport_backoff_ms),
        request_timeout: Duration::from_secs(settings.annotation.request_timeout_secs),
        temperature: settings.annotation.temperature,
    };

    let client = Arc::new(AnnotationClient::new(annotation_config));

    info!("Annotation client initialized (model: {})", model);

    // Initialize the scheduler that staggers annotation tasks per search
    let scheduler = Arc::new(AnnotationScheduler::new(
        client,
        Duration::from_millis(settings.annotation.stagger_interval_ms),
    ));

    info!(
        "Annotation scheduler initialized (stagger: {}ms, attempts: {})",
        settings.annotation.stagger_interval_ms, settings.annotation.max_attempts
    );

    // Load the venue catalog
    let catalog = Arc::new(Catalog::seed());

    info!("Catalog loaded ({} venues)", catalog.len());

    // Build application state
    let app_state = AppState { catalog, scheduler };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
