mod adapters;
mod batch;
mod cache;
mod classify;
mod config;
mod pipeline;
mod routes;
mod upload;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use adapters::Analyzers;
use batch::BatchCoordinator;
use cache::FingerprintCache;
use config::Settings;
use pipeline::VisualPipeline;
use routes::configure_routes;
use std::io;

fn cors(allowed_origins: &[String]) -> Cors {
    let cors = if allowed_origins.iter().any(|origin| origin == "*") {
        Cors::default().allow_any_origin()
    } else {
        allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };
    cors.allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![
            actix_web::http::header::AUTHORIZATION,
            actix_web::http::header::ACCEPT,
            actix_web::http::header::CONTENT_TYPE,
        ])
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    let analyzers = Analyzers::from_settings(&settings).map_err(|e| {
        log::error!("Failed to initialize analyzers: {}", e);
        io::Error::other(e)
    })?;
    if !analyzers.captioner.is_available() {
        log::warn!("CAPTION_ENDPOINT is not set; every analysis request will fail until it is configured");
    }
    if !analyzers.detector.is_available() {
        log::info!("DETECTION_ENDPOINT is not set; objects will be detected from descriptions");
    }

    let pipeline = VisualPipeline::new(
        analyzers,
        FingerprintCache::new(settings.cache_default_ttl()),
        settings.analysis_cache_ttl(),
    );
    let coordinator = BatchCoordinator::new(settings.batch_concurrency);

    let bind_address = settings.bind_address();
    let allowed_origins = settings.allowed_origins.clone();
    let pipeline = web::Data::new(pipeline);
    let coordinator = web::Data::new(coordinator);
    let settings = web::Data::new(settings);

    log::info!(
        "Starting server on {} (batch concurrency {})",
        bind_address,
        coordinator.concurrency()
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(cors(&allowed_origins))
            .app_data(pipeline.clone())
            .app_data(coordinator.clone())
            .app_data(settings.clone())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
