//! Service banner, liveness and the catch-all 404.

use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;

use quill_shared::ApiResponse;

use crate::observability::RequestId;
use crate::state::AppState;

#[derive(Serialize)]
pub struct BannerResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub storage: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub storage: &'static str,
    pub timestamp: String,
}

/// GET /
pub async fn banner(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(BannerResponse {
        message: "Blog API Server",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        storage: state.storage,
    })
}

/// Health check endpoint - returns server status.
///
/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let response = HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage: state.storage,
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    HttpResponse::Ok().json(response)
}

pub async fn route_not_found(req: HttpRequest, request_id: RequestId) -> HttpResponse {
    tracing::debug!(
        request_id = request_id.as_str(),
        method = %req.method(),
        path = req.path(),
        "no route matched"
    );
    HttpResponse::NotFound().json(ApiResponse::failure("Route not found"))
}
