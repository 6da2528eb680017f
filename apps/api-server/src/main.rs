//! # Quill API Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::middleware::Condition;
use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

use api_server::handlers::configure_routes;
use api_server::middleware::{RateLimitMiddleware, error::internal_error_details};
use api_server::observability::RequestIdMiddleware;
use api_server::{AppConfig, AppState, telemetry};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    telemetry::init_telemetry(&config.telemetry);

    tracing::info!(
        "Starting Quill API Server on {}:{} ({})",
        config.host,
        config.port,
        config.environment
    );

    let state = AppState::new(&config).await?;
    let rate_limiter = state.rate_limiter.clone();
    let trust_proxy = config.rate_limit.trust_proxy;
    let expose_errors = config.is_development();

    HttpServer::new(move || {
        App::new()
            .wrap(Condition::new(expose_errors, internal_error_details()))
            .wrap(RateLimitMiddleware::new(rate_limiter.clone()).trust_proxy(trust_proxy))
            .wrap(RequestIdMiddleware)
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
