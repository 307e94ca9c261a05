pub mod caption;
pub mod detect;
pub mod pixabay;
pub mod placeholder;

#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use shared::{Barcode, BoundingBox, ImageSearchResult, QrCode, TextBlock};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ConfigError, Settings, parse_url};
use caption::HttpCaptioner;
use detect::HttpDetector;
use pixabay::PixabaySearch;
use placeholder::{PlaceholderCodeScanner, PlaceholderOcr, PlaceholderTranslator};

#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("{0} not available")]
    Unavailable(String),
    #[error("Request to {service} failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AdapterSetupError {
    #[error("Invalid adapter configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: Option<BoundingBox>,
}

#[derive(Debug, Clone, Default)]
pub struct ExtractedText {
    pub found: bool,
    pub text: String,
    pub blocks: Vec<TextBlock>,
    pub languages: Vec<String>,
    pub confidence: f32,
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TranslatedText {
    pub translated_text: String,
    pub source_language: String,
    pub confidence: f32,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ScannedCodes {
    pub qr_codes: Vec<QrCode>,
    pub barcodes: Vec<Barcode>,
    pub note: Option<String>,
}

#[async_trait]
pub trait Captioner: Send + Sync {
    async fn caption(&self, image: &[u8]) -> Result<String, AnalyzerError>;

    fn is_available(&self) -> bool;
}

#[async_trait]
pub trait ObjectDetector: Send + Sync {
    /// Reported as `method` in object analysis results.
    fn method(&self) -> &'static str;

    fn is_available(&self) -> bool;

    async fn detect(&self, image: &[u8], threshold: f32) -> Result<Vec<Detection>, AnalyzerError>;
}

/// Must not fail just because no provider is configured.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    fn provider(&self) -> &'static str;

    async fn search(&self, query: &str, count: usize)
    -> Result<Vec<ImageSearchResult>, AnalyzerError>;
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, image: &[u8]) -> Result<ExtractedText, AnalyzerError>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_language: &str)
    -> Result<TranslatedText, AnalyzerError>;
}

#[async_trait]
pub trait CodeScanner: Send + Sync {
    async fn scan_codes(&self, image: &[u8]) -> Result<ScannedCodes, AnalyzerError>;
}

/// Every collaborator the analysis pipeline calls out to, built once at startup.
#[derive(Clone)]
pub struct Analyzers {
    pub captioner: Arc<dyn Captioner>,
    pub detector: Arc<dyn ObjectDetector>,
    pub search: Arc<dyn ImageSearch>,
    pub ocr: Arc<dyn TextExtractor>,
    pub translator: Arc<dyn Translator>,
    pub codes: Arc<dyn CodeScanner>,
}

impl Analyzers {
    pub fn from_settings(settings: &Settings) -> Result<Self, AdapterSetupError> {
        let client = build_client(settings.adapter_timeout())?;
        let caption_endpoint = settings
            .caption_endpoint
            .as_deref()
            .map(|endpoint| parse_url("CAPTION_ENDPOINT", endpoint))
            .transpose()?;
        let detection_endpoint = settings
            .detection_endpoint
            .as_deref()
            .map(|endpoint| parse_url("DETECTION_ENDPOINT", endpoint))
            .transpose()?;
        let pixabay_endpoint = parse_url("PIXABAY_ENDPOINT", &settings.pixabay_endpoint)?;

        Ok(Self {
            captioner: Arc::new(HttpCaptioner::new(
                client.clone(),
                caption_endpoint,
                settings.huggingface_token.clone(),
            )),
            detector: Arc::new(HttpDetector::new(
                client.clone(),
                detection_endpoint,
                settings.huggingface_token.clone(),
            )),
            search: Arc::new(PixabaySearch::new(
                client,
                pixabay_endpoint,
                settings.pixabay_api_key.clone(),
            )),
            ocr: Arc::new(PlaceholderOcr),
            translator: Arc::new(PlaceholderTranslator),
            codes: Arc::new(PlaceholderCodeScanner),
        })
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .build()
}
