use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError, web};
use log::{error, info};
use serde::Deserialize;
use serde_json::json;
use shared::{
    CaptionPayload, CaptionResponse, ErrorResponse, FeatureFlags, SearchCategory, SearchPayload,
    SimilarImage,
};
use std::time::Instant;

use crate::batch::{BatchCoordinator, BatchError};
use crate::config::Settings;
use crate::pipeline::{
    AnalysisRequest, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_TARGET_LANGUAGE, PipelineError,
    VisualPipeline,
};
use crate::upload::{UploadError, UploadedFile, read_multipart, read_single_image};

const SEARCH_RESULTS_PER_IMAGE: usize = 5;

#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("{0}")]
    InvalidQuery(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upload(_) | ApiError::Batch(_) | ApiError::InvalidQuery(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        HttpResponse::build(status).json(ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            detail: Some(self.to_string()),
        })
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(
            web::scope("/visual")
                .route("/analyze", web::post().to(visual_analyze))
                .route("/quick-scan", web::post().to(quick_scan))
                .route("/smart-search", web::post().to(smart_search))
                .route("/health", web::get().to(visual_health)),
        )
        .service(
            web::scope("/batch")
                .route("/analyze-multiple", web::post().to(analyze_multiple))
                .route("/search-multiple", web::post().to(search_multiple))
                .route("/analyze-full", web::post().to(analyze_full))
                .route("/health", web::get().to(batch_health)),
        )
        .service(
            web::scope("/analyze")
                .route("/caption", web::post().to(caption))
                .route("/health", web::get().to(analyze_health)),
        )
        .service(
            web::scope("/search")
                .route("/by-image", web::post().to(search_by_image))
                .route("/health", web::get().to(search_health)),
        )
        .service(
            web::scope("/cache")
                .route("/stats", web::get().to(cache_stats))
                .route("/clear", web::post().to(cache_clear)),
        );
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct AnalyzeQuery {
    include_objects: bool,
    include_text: bool,
    include_shopping: bool,
    include_translation: bool,
    target_language: String,
    include_landmarks: bool,
    include_nature: bool,
    include_food: bool,
    confidence_threshold: f32,
}

impl Default for AnalyzeQuery {
    fn default() -> Self {
        let features = FeatureFlags::default();
        Self {
            include_objects: features.objects,
            include_text: features.text,
            include_shopping: features.shopping,
            include_translation: features.translation,
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            include_landmarks: features.landmarks,
            include_nature: features.nature,
            include_food: features.food,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

impl AnalyzeQuery {
    fn into_request(self, file: UploadedFile) -> Result<AnalysisRequest, ApiError> {
        if !(0.1..=1.0).contains(&self.confidence_threshold) {
            return Err(ApiError::InvalidQuery(
                "confidence_threshold must be between 0.1 and 1.0".to_string(),
            ));
        }
        let image_info = file.image_info();
        Ok(AnalysisRequest {
            features: FeatureFlags {
                objects: self.include_objects,
                text: self.include_text,
                shopping: self.include_shopping,
                translation: self.include_translation,
                landmarks: self.include_landmarks,
                nature: self.include_nature,
                food: self.include_food,
            },
            confidence_threshold: self.confidence_threshold,
            target_language: self.target_language,
            ..AnalysisRequest::new(file.data, image_info)
        })
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SmartSearchQuery {
    search_type: SearchCategory,
}

#[derive(Debug, Deserialize)]
struct CountQuery {
    count: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct BatchQuery {
    max_files: Option<usize>,
    results_per_image: Option<usize>,
}

/// Callers may lower the configured file limit, never raise it.
fn file_limit(requested: Option<usize>, configured: usize) -> usize {
    requested.map_or(configured, |max| max.min(configured))
}

fn search_count(requested: Option<usize>, default: usize, max: usize) -> Result<usize, ApiError> {
    let count = requested.unwrap_or(default);
    if count == 0 || count > max {
        return Err(ApiError::InvalidQuery(format!(
            "count must be between 1 and {}",
            max
        )));
    }
    Ok(count)
}

async fn visual_analyze(
    pipeline: web::Data<VisualPipeline>,
    settings: web::Data<Settings>,
    query: web::Query<AnalyzeQuery>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let file = read_single_image(payload, settings.max_visual_image_size).await?;
    let request = query.into_inner().into_request(file)?;
    let response = pipeline.analyze(&request).await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn quick_scan(
    pipeline: web::Data<VisualPipeline>,
    settings: web::Data<Settings>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let file = read_single_image(payload, settings.max_visual_image_size).await?;
    let image_info = file.image_info();
    let response = pipeline.quick_scan(file.data, image_info).await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn smart_search(
    pipeline: web::Data<VisualPipeline>,
    settings: web::Data<Settings>,
    query: web::Query<SmartSearchQuery>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let file = read_single_image(payload, settings.max_visual_image_size).await?;
    let response = pipeline.smart_search(&file.data, query.search_type).await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn caption(
    pipeline: web::Data<VisualPipeline>,
    settings: web::Data<Settings>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let started = Instant::now();
    let file = read_single_image(payload, settings.max_image_size).await?;
    let captioned = pipeline.caption(&file.data).await?;
    Ok(HttpResponse::Ok().json(CaptionResponse {
        caption: captioned.caption,
        processing_time: started.elapsed().as_secs_f64(),
        cached: captioned.cached,
    }))
}

async fn search_by_image(
    pipeline: web::Data<VisualPipeline>,
    settings: web::Data<Settings>,
    query: web::Query<CountQuery>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let count = search_count(
        query.count,
        settings.default_search_count,
        settings.max_search_count,
    )?;
    let file = read_single_image(payload, settings.max_image_size).await?;
    info!("Generating caption for uploaded image...");
    let response = pipeline.search_by_image(&file.data, count).await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn analyze_multiple(
    pipeline: web::Data<VisualPipeline>,
    coordinator: web::Data<BatchCoordinator>,
    settings: web::Data<Settings>,
    query: web::Query<BatchQuery>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let max_files = file_limit(query.max_files, settings.max_batch_files);
    let files = read_multipart(payload, settings.max_image_size, max_files).await?;
    let pipeline = pipeline.get_ref();

    let response = coordinator
        .run(files, max_files, settings.max_image_size, |file| async move {
            pipeline
                .caption(&file.data)
                .await
                .map(|captioned| CaptionPayload {
                    caption: captioned.caption,
                })
        })
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn search_multiple(
    pipeline: web::Data<VisualPipeline>,
    coordinator: web::Data<BatchCoordinator>,
    settings: web::Data<Settings>,
    query: web::Query<BatchQuery>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let max_files = file_limit(query.max_files, settings.max_search_batch_files);
    let per_image = search_count(
        query.results_per_image,
        SEARCH_RESULTS_PER_IMAGE,
        settings.max_search_count,
    )?;
    let files = read_multipart(payload, settings.max_image_size, max_files).await?;
    let pipeline = pipeline.get_ref();

    let response = coordinator
        .run(files, max_files, settings.max_image_size, |file| async move {
            let captioned = pipeline.caption(&file.data).await?;
            let search = pipeline
                .search_by_description(&captioned.caption, per_image)
                .await?;
            Ok::<_, PipelineError>(SearchPayload {
                caption: captioned.caption,
                similar_images: search
                    .results
                    .into_iter()
                    .map(|result| SimilarImage {
                        url: result.url,
                        thumbnail: result.thumbnail,
                        title: result.title,
                        source: result.source,
                    })
                    .collect(),
            })
        })
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn analyze_full(
    pipeline: web::Data<VisualPipeline>,
    coordinator: web::Data<BatchCoordinator>,
    settings: web::Data<Settings>,
    query: web::Query<BatchQuery>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let max_files = file_limit(query.max_files, settings.max_batch_files);
    let files = read_multipart(payload, settings.max_visual_image_size, max_files).await?;
    let pipeline = pipeline.get_ref();

    let response = coordinator
        .run(files, max_files, settings.max_visual_image_size, |file| async move {
            let image_info = file.image_info();
            pipeline
                .analyze(&AnalysisRequest::new(file.data, image_info))
                .await
        })
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn cache_stats(pipeline: web::Data<VisualPipeline>) -> HttpResponse {
    HttpResponse::Ok().json(pipeline.cache().stats())
}

async fn cache_clear(pipeline: web::Data<VisualPipeline>) -> HttpResponse {
    pipeline.cache().clear();
    HttpResponse::Ok().json(json!({ "message": "Cache cleared" }))
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "Image Lens API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/visual/analyze",
            "/visual/quick-scan",
            "/visual/smart-search",
            "/batch/analyze-multiple",
            "/batch/search-multiple",
            "/batch/analyze-full",
            "/analyze/caption",
            "/search/by-image",
            "/cache/stats",
            "/cache/clear",
            "/health"
        ]
    }))
}

async fn health(pipeline: web::Data<VisualPipeline>) -> HttpResponse {
    let analyzers = pipeline.analyzers();
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "image_lens",
        "adapters": {
            "captioning": analyzers.captioner.is_available(),
            "object_detection": analyzers.detector.is_available(),
            "image_search": analyzers.search.provider(),
        },
        "cache": pipeline.cache().stats(),
    }))
}

async fn visual_health(pipeline: web::Data<VisualPipeline>) -> HttpResponse {
    let detection = if pipeline.analyzers().detector.is_available() {
        pipeline.analyzers().detector.method()
    } else {
        "description_based"
    };
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "visual_intelligence",
        "features": [
            "comprehensive_analysis",
            "smart_search",
            "quick_scan",
            "object_detection",
            "text_recognition",
            "shopping_integration",
            "nature_identification",
            "food_analysis",
            "landmark_recognition",
            "code_scanning"
        ],
        "object_detection": detection,
        "note": "Text, translation and code scanning run on placeholder analyzers"
    }))
}

async fn batch_health(coordinator: web::Data<BatchCoordinator>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "batch_processing",
        "features": [
            "multiple_image_analysis",
            "batch_search",
            "full_batch_analysis",
            "concurrent_processing"
        ],
        "concurrency": coordinator.concurrency(),
    }))
}

async fn analyze_health(pipeline: web::Data<VisualPipeline>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "image_analysis",
        "captioning": pipeline.analyzers().captioner.is_available(),
    }))
}

async fn search_health(pipeline: web::Data<VisualPipeline>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "image_search",
        "features": ["image_to_caption_to_search"],
        "api": pipeline.analyzers().search.provider(),
    }))
}
