use actix_web::{web, App, HttpServer};
use anyhow::Context;
use prometheus::Registry;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

use opentelemetry_config::{init_tracing, shutdown_tracing};
use s3_utils::S3Client;
use video_cache::{CacheMetrics, CacheOperations, InMemoryCache, RedisVideoCache};
use video_service::config::{CacheBackend, Config};
use video_service::db::{create_pool, PgMetadataStore};
use video_service::handlers::{self, HealthState};
use video_service::repository::VideoRepository;
use video_service::service::VideoHostingService;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("failed to load configuration")?;

    init_tracing("video-service", &config.tracing)?;

    tracing::info!("Starting video-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let db_pool = create_pool(&config.database.url, config.database.max_connections)
        .await
        .context("failed to create database pool")?;
    let store = Arc::new(PgMetadataStore::new(db_pool));

    let cache: Arc<dyn CacheOperations> = match config.cache.backend {
        CacheBackend::Redis => Arc::new(
            RedisVideoCache::connect(&config.cache.redis_url)
                .await
                .context("failed to connect to Redis")?,
        ),
        CacheBackend::Memory => {
            tracing::warn!("using in-process cache; entries are not shared between replicas");
            Arc::new(InMemoryCache::new())
        }
    };

    let s3 = S3Client::with_config(config.s3.clone()).await;
    if let Err(e) = s3.health_check().await {
        tracing::warn!(bucket = %config.s3.bucket, error = %e, "blob store not reachable at startup");
    }
    let blobs = Arc::new(s3.operations());

    let repo = Arc::new(VideoRepository::new(
        cache.clone(),
        store,
        blobs,
        config.repository_settings(),
    ));
    let service = web::Data::new(VideoHostingService::new(repo, config.resolutions.clone()));

    let registry = Registry::new();
    CacheMetrics::register(&registry).context("failed to register cache metrics")?;
    let registry = web::Data::new(registry);
    let health = web::Data::new(HealthState { cache });

    let bind_addr = format!("0.0.0.0:{}", config.app.port);
    tracing::info!("HTTP server listening on {}", bind_addr);

    let result = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(service.clone())
            .app_data(registry.clone())
            .app_data(health.clone())
            .configure(handlers::configure_routes)
    })
    .bind(&bind_addr)?
    .run()
    .await;

    shutdown_tracing();
    result.context("HTTP server error")
}
