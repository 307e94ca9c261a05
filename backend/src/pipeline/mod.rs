//! The single-image analysis pipeline.
//!
//! Captioning is the only mandatory step. Every other analyzer is settled into
//! its own slot, so one failing collaborator never costs the caller the rest of
//! the result.

pub mod heuristics;

use futures::join;
use log::{error, info, warn};
use serde_json::{Value, json};
use shared::{
    AnalysisMeta, AnalysisResponse, AnalysisResults, BasicInfo, CodeScanResult, DescriptionSearch,
    DetectedObject, FeatureFlags, GeneralSearch, ImageInfo, ImageSearchResponse, ObjectAnalysis,
    Product, SearchCategory, ShoppingResult, SmartSearchResponse, SmartSearchResults,
    TextExtraction, Translation,
};
use std::time::{Duration, Instant};

use crate::adapters::{AnalyzerError, Analyzers, ExtractedText, ScannedCodes};
use crate::cache::FingerprintCache;
use crate::cache::fingerprint::{FingerprintParams, compute_key};
use crate::classify;
use heuristics::capitalize;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
pub const QUICK_SCAN_CONFIDENCE_THRESHOLD: f32 = 0.7;
pub const DEFAULT_TARGET_LANGUAGE: &str = "en";

const CAPTION_CONFIDENCE: f32 = 0.85;
const SHOPPING_RESULTS: usize = 6;
const GENERAL_SEARCH_RESULTS: usize = 8;
const BUY_LINKS: &[&str] = &["Amazon", "eBay", "Google Shopping"];
const DESCRIPTION_PREFIXES: &[&str] = &["a photo of", "an image of"];
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Analysis failed: {0}")]
    CaptionFailed(#[source] AnalyzerError),
    #[error("Search failed: {0}")]
    SearchFailed(#[source] AnalyzerError),
}

/// Values memoized in the shared fingerprint cache.
#[derive(Debug, Clone)]
pub enum CachedResult {
    Analysis(Box<AnalysisResponse>),
    Caption(String),
}

pub type ResultCache = FingerprintCache<CachedResult>;

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub image: Vec<u8>,
    pub features: FeatureFlags,
    pub confidence_threshold: f32,
    pub target_language: String,
    pub image_info: ImageInfo,
}

impl AnalysisRequest {
    pub fn new(image: Vec<u8>, image_info: ImageInfo) -> Self {
        Self {
            image,
            features: FeatureFlags::default(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            image_info,
        }
    }

    pub fn quick_scan(image: Vec<u8>, image_info: ImageInfo) -> Self {
        Self {
            features: FeatureFlags::quick_scan(),
            confidence_threshold: QUICK_SCAN_CONFIDENCE_THRESHOLD,
            ..Self::new(image, image_info)
        }
    }

    /// Every option that changes the response.
    fn fingerprint_params(&self) -> FingerprintParams {
        let flags = self.features;
        [
            ("objects", Value::Bool(flags.objects)),
            ("text", Value::Bool(flags.text)),
            ("shopping", Value::Bool(flags.shopping)),
            ("translation", Value::Bool(flags.translation)),
            ("landmarks", Value::Bool(flags.landmarks)),
            ("nature", Value::Bool(flags.nature)),
            ("food", Value::Bool(flags.food)),
            ("confidence_threshold", json!(self.confidence_threshold)),
            ("target_language", json!(self.target_language)),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Captioned {
    pub caption: String,
    pub cached: bool,
}

/// Result shape of a requested slot whose analyzer failed.
trait Degradable {
    fn degraded(error: &AnalyzerError) -> Self;
}

impl Degradable for TextExtraction {
    fn degraded(error: &AnalyzerError) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::default()
        }
    }
}

impl Degradable for Translation {
    fn degraded(error: &AnalyzerError) -> Self {
        Self {
            translated: false,
            error: Some(error.to_string()),
            ..Self::default()
        }
    }
}

impl Degradable for ShoppingResult {
    fn degraded(error: &AnalyzerError) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::default()
        }
    }
}

impl Degradable for CodeScanResult {
    fn degraded(error: &AnalyzerError) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::default()
        }
    }
}

fn settle<T: Degradable>(slot: &str, result: Result<T, AnalyzerError>) -> T {
    result.unwrap_or_else(|e| {
        warn!("{} analysis degraded: {}", slot, e);
        T::degraded(&e)
    })
}

impl From<ExtractedText> for TextExtraction {
    fn from(text: ExtractedText) -> Self {
        Self {
            text_found: text.found,
            extracted_text: text.text,
            languages_detected: text.languages,
            text_blocks: text.blocks,
            confidence: text.confidence,
            note: text.note,
            error: None,
        }
    }
}

impl From<ScannedCodes> for CodeScanResult {
    fn from(codes: ScannedCodes) -> Self {
        Self {
            codes_found: codes.qr_codes.len() + codes.barcodes.len(),
            qr_codes: codes.qr_codes,
            barcodes: codes.barcodes,
            note: codes.note,
            error: None,
        }
    }
}

/// Drops the leading "a photo of" style phrasing and stop words from a caption.
pub fn enhance_query(description: &str) -> String {
    let stripped = DESCRIPTION_PREFIXES
        .iter()
        .fold(description.to_string(), |text, prefix| text.replace(prefix, ""));
    stripped
        .split_whitespace()
        .filter(|word| !STOP_WORDS.contains(&word.to_lowercase().as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Clone)]
pub struct VisualPipeline {
    analyzers: Analyzers,
    cache: ResultCache,
    analysis_ttl: Duration,
}

impl VisualPipeline {
    pub fn new(analyzers: Analyzers, cache: ResultCache, analysis_ttl: Duration) -> Self {
        Self {
            analyzers,
            cache,
            analysis_ttl,
        }
    }

    pub fn analyzers(&self) -> &Analyzers {
        &self.analyzers
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Captions an image, reusing a previous caption for the same bytes.
    pub async fn caption(&self, image: &[u8]) -> Result<Captioned, PipelineError> {
        let params = FingerprintParams::from([("operation".to_string(), json!("caption"))]);
        let key = compute_key(image, Some(&params));
        if let Some(CachedResult::Caption(caption)) = self.cache.get(&key) {
            return Ok(Captioned {
                caption,
                cached: true,
            });
        }

        let caption = self.analyzers.captioner.caption(image).await.map_err(|e| {
            error!("Image captioning failed: {}", e);
            PipelineError::CaptionFailed(e)
        })?;
        self.cache
            .set(key, CachedResult::Caption(caption.clone()), None);
        Ok(Captioned {
            caption,
            cached: false,
        })
    }

    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, PipelineError> {
        let started = Instant::now();
        let key = compute_key(&request.image, Some(&request.fingerprint_params()));
        if let Some(CachedResult::Analysis(cached)) = self.cache.get(&key) {
            info!("Returning cached visual analysis result");
            return Ok(*cached);
        }

        info!("Generating image description...");
        let description = self.caption(&request.image).await?.caption;
        let basic_info = BasicInfo {
            description: description.clone(),
            confidence: CAPTION_CONFIDENCE,
            categories: classify::categorize(&description),
        };

        let features = request.features;
        let objects = async {
            if features.objects {
                Some(
                    self.detect_objects(&request.image, &description, request.confidence_threshold)
                        .await,
                )
            } else {
                None
            }
        };
        let text = async {
            if features.text {
                let (text, translation) = self
                    .read_text(&request.image, features.translation, &request.target_language)
                    .await;
                (Some(text), translation)
            } else {
                (None, None)
            }
        };
        let shopping = async {
            if features.shopping {
                Some(self.find_products(&description).await)
            } else {
                None
            }
        };
        let codes = self.scan_codes(&request.image);
        let (objects, (text, translation), shopping, codes) = join!(objects, text, shopping, codes);

        let analysis_results = AnalysisResults {
            basic_info,
            objects,
            text,
            translation,
            shopping,
            landmarks: features
                .landmarks
                .then(|| heuristics::identify_landmarks(&description)),
            nature: features
                .nature
                .then(|| heuristics::identify_nature(&description)),
            food: features.food.then(|| heuristics::analyze_food(&description)),
            codes,
        };

        let response = AnalysisResponse {
            analysis_results,
            meta: AnalysisMeta {
                processing_time: started.elapsed().as_secs_f64(),
                image_info: request.image_info.clone(),
                features_used: features,
            },
        };

        self.cache.set(
            key,
            CachedResult::Analysis(Box::new(response.clone())),
            Some(self.analysis_ttl),
        );
        Ok(response)
    }

    pub async fn quick_scan(
        &self,
        image: Vec<u8>,
        image_info: ImageInfo,
    ) -> Result<AnalysisResponse, PipelineError> {
        self.analyze(&AnalysisRequest::quick_scan(image, image_info))
            .await
    }

    /// Routes the image to the analyzer its description calls for. `requested`
    /// only applies when the description itself is not specific.
    pub async fn smart_search(
        &self,
        image: &[u8],
        requested: SearchCategory,
    ) -> Result<SmartSearchResponse, PipelineError> {
        let description = self.caption(image).await?.caption;
        let decision = classify::classify(&description);
        let category = match decision.category {
            SearchCategory::General => requested,
            detected => detected,
        };
        info!("Smart search routed '{}' to {}", description, category);

        let search_results = match category {
            SearchCategory::Shopping => {
                SmartSearchResults::Shopping(self.find_products(&description).await)
            }
            SearchCategory::Food => SmartSearchResults::Food(heuristics::analyze_food(&description)),
            SearchCategory::Nature => {
                SmartSearchResults::Nature(heuristics::identify_nature(&description))
            }
            SearchCategory::Landmarks => {
                SmartSearchResults::Landmarks(heuristics::identify_landmarks(&description))
            }
            SearchCategory::General => {
                let similar_images = self
                    .analyzers
                    .search
                    .search(&decision.refined_query, GENERAL_SEARCH_RESULTS)
                    .await
                    .map_err(PipelineError::SearchFailed)?;
                SmartSearchResults::General(GeneralSearch {
                    search_type: SearchCategory::General,
                    description: description.clone(),
                    contextual_query: decision.refined_query.clone(),
                    similar_images,
                })
            }
        };

        Ok(SmartSearchResponse {
            search_results,
            detected_type: category,
            original_description: description,
            contextual_understanding: decision.refined_query,
        })
    }

    pub async fn search_by_description(
        &self,
        description: &str,
        count: usize,
    ) -> Result<DescriptionSearch, PipelineError> {
        let query = enhance_query(description);
        let results = self
            .analyzers
            .search
            .search(&query, count)
            .await
            .map_err(|e| {
                error!("Error in image description search: {}", e);
                PipelineError::SearchFailed(e)
            })?;
        Ok(DescriptionSearch {
            query,
            original_description: description.to_string(),
            total_found: results.len(),
            results,
            api_used: self.analyzers.search.provider().to_string(),
        })
    }

    pub async fn search_by_image(
        &self,
        image: &[u8],
        count: usize,
    ) -> Result<ImageSearchResponse, PipelineError> {
        let started = Instant::now();
        let captioned = self.caption(image).await?;
        info!(
            "Searching for similar images using caption: '{}'",
            captioned.caption
        );
        let search = self.search_by_description(&captioned.caption, count).await?;
        Ok(ImageSearchResponse {
            caption: captioned.caption,
            similar_images: search.results,
            total_found: search.total_found,
            processing_time: started.elapsed().as_secs_f64(),
            cached: captioned.cached,
            api_used: search.api_used,
        })
    }

    async fn detect_objects(&self, image: &[u8], description: &str, threshold: f32) -> ObjectAnalysis {
        let detector = &self.analyzers.detector;
        match detector.detect(image, threshold).await {
            Ok(detections) => {
                let objects: Vec<DetectedObject> = detections
                    .into_iter()
                    .map(|detection| DetectedObject {
                        description: format!(
                            "{} detected with {:.1}% confidence",
                            capitalize(&detection.label),
                            detection.confidence * 100.0
                        ),
                        category: heuristics::categorize_object(&detection.label).to_string(),
                        name: detection.label,
                        confidence: detection.confidence,
                        bbox: detection.bbox,
                        detected_via: None,
                    })
                    .collect();
                ObjectAnalysis {
                    objects_found: objects.len(),
                    objects,
                    method: detector.method().to_string(),
                    confidence_threshold: Some(threshold),
                    source_description: None,
                }
            }
            Err(e) => {
                warn!(
                    "Object detector not usable, using description-based detection: {}",
                    e
                );
                heuristics::objects_from_description(description, threshold)
            }
        }
    }

    /// Translation only runs when text was actually found.
    async fn read_text(
        &self,
        image: &[u8],
        translate: bool,
        target_language: &str,
    ) -> (TextExtraction, Option<Translation>) {
        let extraction = settle(
            "text",
            self.analyzers
                .ocr
                .extract_text(image)
                .await
                .map(TextExtraction::from),
        );
        if !translate || !extraction.text_found || extraction.extracted_text.is_empty() {
            return (extraction, None);
        }

        info!("Translating to {}...", target_language);
        let translated = self
            .analyzers
            .translator
            .translate(&extraction.extracted_text, target_language)
            .await
            .map(|translated| Translation {
                translated: true,
                translated_text: translated.translated_text,
                source_language: translated.source_language,
                confidence: translated.confidence,
                note: translated.note,
                ..Translation::default()
            });
        let mut translation = settle("translation", translated);
        translation.original_text = extraction.extracted_text.clone();
        translation.target_language = target_language.to_string();
        (extraction, Some(translation))
    }

    /// Searches on the refined phrase, never on the raw caption.
    async fn find_products(&self, description: &str) -> ShoppingResult {
        let query = classify::refine_query(description);
        let search = &self.analyzers.search;
        let found = search
            .search(&query, SHOPPING_RESULTS)
            .await
            .map(|results| {
                let products: Vec<Product> = results
                    .into_iter()
                    .map(|result| Product {
                        title: result.title,
                        image: result.url,
                        source: search.provider().to_string(),
                        estimated_price: "Price varies".to_string(),
                        buy_links: BUY_LINKS.iter().map(|link| link.to_string()).collect(),
                    })
                    .collect();
                ShoppingResult {
                    products_found: products.len(),
                    products,
                    note: Some("Contextual search for product discovery".to_string()),
                    ..ShoppingResult::default()
                }
            });
        let mut shopping = settle("shopping", found);
        shopping.search_query = query;
        shopping.original_description = description.to_string();
        shopping
    }

    async fn scan_codes(&self, image: &[u8]) -> CodeScanResult {
        settle(
            "codes",
            self.analyzers
                .codes
                .scan_codes(image)
                .await
                .map(CodeScanResult::from),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::Detection;
    use crate::adapters::testing::{
        EchoCaptioner, FailingCaptioner, FailingCodeScanner, FailingOcr, FailingSearch,
        FailingTranslator, FixedCaptioner, FixedDetector, FixedOcr, RecordingSearch, analyzers_with,
    };
    use shared::BoundingBox;
    use std::sync::Arc;

    const SWEATER_SCENE: &str = "a man wearing a black sweater standing on a street";

    fn pipeline(analyzers: Analyzers) -> VisualPipeline {
        VisualPipeline::new(
            analyzers,
            FingerprintCache::new(Duration::from_secs(600)),
            Duration::from_secs(3600),
        )
    }

    fn request(image: &[u8]) -> AnalysisRequest {
        AnalysisRequest::new(image.to_vec(), ImageInfo::default())
    }

    #[actix_web::test]
    async fn unavailable_detector_falls_back_to_description() {
        let pipeline = pipeline(analyzers_with(Arc::new(FixedCaptioner::new(SWEATER_SCENE))));
        let response = pipeline.analyze(&request(b"img")).await.unwrap();

        let objects = response.analysis_results.objects.unwrap();
        assert_eq!(objects.method, "description_based");
        assert!(objects.objects_found > 0);
        assert!(objects.objects.iter().any(|o| o.name == "person"));
        assert!(objects.objects.iter().any(|o| o.name == "clothing"));
    }

    #[actix_web::test]
    async fn detector_results_are_used_when_available() {
        let mut analyzers = analyzers_with(Arc::new(FixedCaptioner::new("a cat")));
        analyzers.detector = Arc::new(FixedDetector(vec![
            Detection {
                label: "car".to_string(),
                confidence: 0.91,
                bbox: Some(BoundingBox {
                    x1: 1.0,
                    y1: 2.0,
                    x2: 3.0,
                    y2: 4.0,
                }),
            },
            Detection {
                label: "kite".to_string(),
                confidence: 0.2,
                bbox: None,
            },
        ]));
        let response = pipeline(analyzers).analyze(&request(b"img")).await.unwrap();

        let objects = response.analysis_results.objects.unwrap();
        assert_eq!(objects.method, "detection_model");
        assert_eq!(objects.objects_found, 1);
        assert_eq!(objects.objects[0].category, "transportation");
        assert_eq!(objects.objects[0].description, "Car detected with 91.0% confidence");
    }

    #[actix_web::test]
    async fn caption_failure_fails_the_request() {
        let pipeline = pipeline(analyzers_with(Arc::new(FailingCaptioner)));
        let err = pipeline.analyze(&request(b"img")).await.unwrap_err();

        assert!(matches!(err, PipelineError::CaptionFailed(_)));
        assert!(err.to_string().starts_with("Analysis failed:"));
        assert_eq!(pipeline.cache().stats().total_items, 0);
    }

    #[actix_web::test]
    async fn repeated_request_is_served_from_cache() {
        let captioner = Arc::new(FixedCaptioner::new(SWEATER_SCENE));
        let search = Arc::new(RecordingSearch::default());
        let mut analyzers = analyzers_with(captioner.clone());
        analyzers.search = search.clone();
        let pipeline = pipeline(analyzers);

        let first = pipeline.analyze(&request(b"img")).await.unwrap();
        let second = pipeline.analyze(&request(b"img")).await.unwrap();

        assert_eq!(captioner.calls(), 1);
        assert_eq!(search.queries().len(), 1);
        assert_eq!(first.meta.processing_time, second.meta.processing_time);
    }

    #[actix_web::test]
    async fn differing_options_are_cached_separately() {
        let captioner = Arc::new(FixedCaptioner::new(SWEATER_SCENE));
        let pipeline = pipeline(analyzers_with(captioner.clone()));

        let mut strict = request(b"img");
        strict.confidence_threshold = 0.9;
        let mut with_food = request(b"img");
        with_food.features.food = true;

        pipeline.analyze(&request(b"img")).await.unwrap();
        pipeline.analyze(&strict).await.unwrap();
        let food = pipeline.analyze(&with_food).await.unwrap();

        assert!(food.analysis_results.food.is_some());
        // One caption entry plus three analyses.
        assert_eq!(pipeline.cache().stats().total_items, 4);
        assert_eq!(captioner.calls(), 1);
    }

    #[actix_web::test]
    async fn shopping_searches_with_the_refined_query() {
        let search = Arc::new(RecordingSearch::default());
        let mut analyzers = analyzers_with(Arc::new(FixedCaptioner::new(SWEATER_SCENE)));
        analyzers.search = search.clone();
        let response = pipeline(analyzers).analyze(&request(b"img")).await.unwrap();

        let shopping = response.analysis_results.shopping.unwrap();
        let refined = classify::refine_query(SWEATER_SCENE);
        assert!(refined.contains("minimalist") && refined.contains("menswear"));
        assert_eq!(shopping.search_query, refined);
        assert_ne!(shopping.search_query, SWEATER_SCENE);
        assert_eq!(shopping.original_description, SWEATER_SCENE);
        assert_eq!(shopping.products_found, 6);
        assert_eq!(shopping.products[0].buy_links, vec!["Amazon", "eBay", "Google Shopping"]);
        assert_eq!(search.queries(), vec![refined]);
    }

    #[actix_web::test]
    async fn failing_search_degrades_only_the_shopping_slot() {
        let mut analyzers = analyzers_with(Arc::new(FixedCaptioner::new(SWEATER_SCENE)));
        analyzers.search = Arc::new(FailingSearch);
        let response = pipeline(analyzers).analyze(&request(b"img")).await.unwrap();
        let results = response.analysis_results;

        let shopping = results.shopping.unwrap();
        assert_eq!(shopping.products_found, 0);
        assert!(shopping.error.unwrap().contains("search backend down"));
        assert_eq!(shopping.search_query, classify::refine_query(SWEATER_SCENE));

        assert!(results.objects.unwrap().objects_found > 0);
        let text = results.text.unwrap();
        assert!(!text.text_found);
        assert!(text.error.is_none());
        assert!(results.codes.error.is_none());
    }

    #[actix_web::test]
    async fn failing_ocr_degrades_only_the_text_slot() {
        let mut analyzers = analyzers_with(Arc::new(FixedCaptioner::new(SWEATER_SCENE)));
        analyzers.ocr = Arc::new(FailingOcr);
        let mut translate = request(b"img");
        translate.features.translation = true;
        let response = pipeline(analyzers).analyze(&translate).await.unwrap();
        let results = response.analysis_results;

        let text = results.text.unwrap();
        assert!(!text.text_found);
        assert!(text.extracted_text.is_empty());
        assert!(text.error.unwrap().contains("ocr engine crashed"));
        assert!(results.translation.is_none(), "nothing to translate");

        assert_eq!(results.basic_info.description, SWEATER_SCENE);
        assert!(results.objects.unwrap().objects_found > 0);
        assert_eq!(results.shopping.unwrap().products_found, 6);
        assert!(results.codes.error.is_none());
    }

    #[actix_web::test]
    async fn failing_translator_keeps_the_source_text() {
        let mut analyzers = analyzers_with(Arc::new(FixedCaptioner::new("a street sign")));
        analyzers.ocr = Arc::new(FixedOcr("salida".to_string()));
        analyzers.translator = Arc::new(FailingTranslator);
        let mut translate = request(b"img");
        translate.features.translation = true;
        translate.target_language = "de".to_string();

        let response = pipeline(analyzers).analyze(&translate).await.unwrap();
        let results = response.analysis_results;

        let translation = results.translation.unwrap();
        assert!(!translation.translated);
        assert!(translation.error.unwrap().contains("translation quota exceeded"));
        assert_eq!(translation.original_text, "salida");
        assert_eq!(translation.target_language, "de");

        let text = results.text.unwrap();
        assert!(text.text_found);
        assert!(text.error.is_none());
    }

    #[actix_web::test]
    async fn failing_code_scanner_degrades_only_the_codes_slot() {
        let mut analyzers = analyzers_with(Arc::new(FixedCaptioner::new(SWEATER_SCENE)));
        analyzers.codes = Arc::new(FailingCodeScanner);
        let response = pipeline(analyzers).analyze(&request(b"img")).await.unwrap();
        let results = response.analysis_results;

        assert_eq!(results.codes.codes_found, 0);
        assert!(results.codes.qr_codes.is_empty());
        assert!(results.codes.error.unwrap().contains("Code scanner not available"));

        assert!(results.text.unwrap().error.is_none());
        assert!(results.shopping.unwrap().error.is_none());
    }

    #[actix_web::test]
    async fn translation_runs_only_when_text_is_found() {
        let mut with_text = analyzers_with(Arc::new(FixedCaptioner::new("a street sign")));
        with_text.ocr = Arc::new(FixedOcr("salida".to_string()));
        let mut translate = request(b"img");
        translate.features.translation = true;
        translate.target_language = "fr".to_string();

        let response = pipeline(with_text).analyze(&translate).await.unwrap();
        let translation = response.analysis_results.translation.unwrap();
        assert_eq!(translation.original_text, "salida");
        assert_eq!(translation.target_language, "fr");
        assert!(translation.translated);

        let without_text = analyzers_with(Arc::new(FixedCaptioner::new("a street sign")));
        let response = pipeline(without_text).analyze(&translate).await.unwrap();
        assert!(response.analysis_results.text.is_some());
        assert!(response.analysis_results.translation.is_none());
    }

    #[actix_web::test]
    async fn quick_scan_leaves_unrequested_slots_empty() {
        let pipeline = pipeline(analyzers_with(Arc::new(FixedCaptioner::new(SWEATER_SCENE))));
        let response = pipeline
            .quick_scan(b"img".to_vec(), ImageInfo::default())
            .await
            .unwrap();
        let results = response.analysis_results;

        assert!(results.objects.is_some());
        assert!(results.text.is_some());
        assert!(results.shopping.is_none());
        assert!(results.translation.is_none());
        assert!(results.landmarks.is_none());
        assert!(results.nature.is_none());
        assert!(results.food.is_none());
        assert_eq!(results.codes.codes_found, 0);
        assert_eq!(response.meta.features_used, FeatureFlags::quick_scan());
    }

    #[actix_web::test]
    async fn caption_is_memoized() {
        let captioner = Arc::new(EchoCaptioner::default());
        let pipeline = pipeline(analyzers_with(captioner.clone()));

        let first = pipeline.caption(b"a red kite").await.unwrap();
        let second = pipeline.caption(b"a red kite").await.unwrap();
        assert_eq!(first.caption, "a red kite");
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(captioner.calls(), 1);
    }

    #[actix_web::test]
    async fn smart_search_prefers_detected_category() {
        let pipeline = pipeline(analyzers_with(Arc::new(EchoCaptioner::default())));

        let food = pipeline
            .smart_search(b"a meal of pasta in the garden", SearchCategory::Landmarks)
            .await
            .unwrap();
        assert_eq!(food.detected_type, SearchCategory::Food);
        assert!(matches!(food.search_results, SmartSearchResults::Food(_)));

        let requested = pipeline
            .smart_search(b"blue sky with clouds", SearchCategory::Nature)
            .await
            .unwrap();
        assert_eq!(requested.detected_type, SearchCategory::Nature);

        let general = pipeline
            .smart_search(b"blue sky with clouds", SearchCategory::General)
            .await
            .unwrap();
        match general.search_results {
            SmartSearchResults::General(search) => {
                assert_eq!(search.similar_images.len(), 8);
                assert_eq!(search.contextual_query, general.contextual_understanding);
            }
            other => panic!("unexpected results: {:?}", other),
        }
    }

    #[test]
    fn enhanced_query_drops_prefixes_and_stop_words() {
        assert_eq!(enhance_query("a photo of the red car in a garage"), "red car garage");
        assert_eq!(enhance_query("The Dog AND the Cat"), "Dog Cat");
    }

    #[actix_web::test]
    async fn search_by_image_reports_provider_and_count() {
        let pipeline = pipeline(analyzers_with(Arc::new(EchoCaptioner::default())));
        let response = pipeline.search_by_image(b"an image of a red car", 3).await.unwrap();

        assert_eq!(response.caption, "an image of a red car");
        assert_eq!(response.total_found, 3);
        assert_eq!(response.api_used, "demo");
        assert!(!response.cached);
        assert_eq!(response.similar_images[0].title, "Demo image about red car #1");
    }
}
