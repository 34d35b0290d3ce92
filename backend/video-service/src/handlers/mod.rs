//! HTTP handlers for the video service
//!
//! Each handler runs inside the request span opened by `TracingLogger` and
//! passes it down as the explicit parent of the service call.

use actix_web::{web, HttpResponse};
use prometheus::{Encoder, Registry, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::Span;
use video_cache::CacheOperations;

use crate::error::{AppError, Result};
use crate::service::VideoHostingService;

#[derive(Debug, Deserialize)]
pub struct VideoUrlQuery {
    pub resolution: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VideoUrlResponse {
    pub presigned_url: String,
}

/// Readiness probes
#[derive(Clone)]
pub struct HealthState {
    pub cache: Arc<dyn CacheOperations>,
}

/// Get video metadata
pub async fn get_video_info(
    service: web::Data<VideoHostingService>,
    video_id: web::Path<String>,
) -> Result<HttpResponse> {
    let metadata = service.get_video_info(&Span::current(), &video_id).await?;
    Ok(HttpResponse::Ok().json(metadata))
}

/// Get a signed playback URL for one resolution
pub async fn get_video_url(
    service: web::Data<VideoHostingService>,
    video_id: web::Path<String>,
    query: web::Query<VideoUrlQuery>,
) -> Result<HttpResponse> {
    let presigned_url = service
        .get_video_url(&Span::current(), &video_id, &query.resolution)
        .await?;
    Ok(HttpResponse::Ok().json(VideoUrlResponse { presigned_url }))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub async fn ready(state: web::Data<HealthState>) -> Result<HttpResponse> {
    state.cache.ping().await.map_err(|e| {
        tracing::warn!(error = %e, "readiness check failed");
        AppError::CacheError(e.to_string())
    })?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ready" })))
}

pub async fn metrics(registry: web::Data<Registry>) -> HttpResponse {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    match encoder.encode(&registry.gather(), &mut buffer) {
        Ok(_) => HttpResponse::Ok()
            .content_type(encoder.format_type())
            .body(buffer),
        Err(err) => HttpResponse::InternalServerError().body(err.to_string()),
    }
}

/// Configure video routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/videos")
            .route("/{video_id}", web::get().to(get_video_info))
            .route("/{video_id}/url", web::get().to(get_video_url)),
    )
    .route("/health", web::get().to(health))
    .route("/health/ready", web::get().to(ready))
    .route("/metrics", web::get().to(metrics));
}
