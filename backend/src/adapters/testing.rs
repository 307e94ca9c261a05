//! Scripted analyzers for exercising the pipeline and batch code without network access.

use async_trait::async_trait;
use shared::{ImageSearchResult, TextBlock};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::pixabay::placeholder_results;
use super::placeholder::{PlaceholderCodeScanner, PlaceholderOcr, PlaceholderTranslator};
use super::{
    Analyzers, AnalyzerError, Captioner, CodeScanner, Detection, ExtractedText, ImageSearch,
    ObjectDetector, ScannedCodes, TextExtractor, TranslatedText, Translator,
};

/// Captions every image with the same text and counts calls.
#[derive(Default)]
pub struct FixedCaptioner {
    pub caption: String,
    pub calls: AtomicUsize,
}

impl FixedCaptioner {
    pub fn new(caption: &str) -> Self {
        Self {
            caption: caption.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Captioner for FixedCaptioner {
    async fn caption(&self, _image: &[u8]) -> Result<String, AnalyzerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.caption.clone())
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Reads the image bytes as UTF-8 and uses them as the caption. Bytes starting
/// with `fail` produce an error, and `sleep:<ms>:` prefixes delay the answer.
#[derive(Default)]
pub struct EchoCaptioner {
    pub calls: AtomicUsize,
}

impl EchoCaptioner {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Captioner for EchoCaptioner {
    async fn caption(&self, image: &[u8]) -> Result<String, AnalyzerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = String::from_utf8_lossy(image).to_string();
        let text = match text.strip_prefix("sleep:") {
            Some(rest) => {
                let (millis, caption) = rest.split_once(':').unwrap_or((rest, ""));
                let millis = millis.parse().unwrap_or(0);
                tokio::time::sleep(Duration::from_millis(millis)).await;
                caption.to_string()
            }
            None => text,
        };
        if text.starts_with("fail") {
            return Err(AnalyzerError::Failed(format!("cannot caption {}", text)));
        }
        Ok(text)
    }

    fn is_available(&self) -> bool {
        true
    }
}

pub struct FailingCaptioner;

#[async_trait]
impl Captioner for FailingCaptioner {
    async fn caption(&self, _image: &[u8]) -> Result<String, AnalyzerError> {
        Err(AnalyzerError::Unavailable("Image captioning model".to_string()))
    }

    fn is_available(&self) -> bool {
        false
    }
}

pub struct UnavailableDetector;

#[async_trait]
impl ObjectDetector for UnavailableDetector {
    fn method(&self) -> &'static str {
        "detection_model"
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn detect(&self, _image: &[u8], _threshold: f32) -> Result<Vec<Detection>, AnalyzerError> {
        Err(AnalyzerError::Unavailable("Object detection model".to_string()))
    }
}

pub struct FixedDetector(pub Vec<Detection>);

#[async_trait]
impl ObjectDetector for FixedDetector {
    fn method(&self) -> &'static str {
        "detection_model"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn detect(&self, _image: &[u8], threshold: f32) -> Result<Vec<Detection>, AnalyzerError> {
        Ok(self
            .0
            .iter()
            .filter(|detection| detection.confidence >= threshold)
            .cloned()
            .collect())
    }
}

/// Placeholder results, recording the last query it was asked for.
#[derive(Default)]
pub struct RecordingSearch {
    pub queries: std::sync::Mutex<Vec<String>>,
}

impl RecordingSearch {
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageSearch for RecordingSearch {
    fn provider(&self) -> &'static str {
        "demo"
    }

    async fn search(
        &self,
        query: &str,
        count: usize,
    ) -> Result<Vec<ImageSearchResult>, AnalyzerError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(placeholder_results(query, count))
    }
}

pub struct FailingSearch;

#[async_trait]
impl ImageSearch for FailingSearch {
    fn provider(&self) -> &'static str {
        "demo"
    }

    async fn search(
        &self,
        _query: &str,
        _count: usize,
    ) -> Result<Vec<ImageSearchResult>, AnalyzerError> {
        Err(AnalyzerError::Failed("search backend down".to_string()))
    }
}

pub struct FixedOcr(pub String);

#[async_trait]
impl TextExtractor for FixedOcr {
    async fn extract_text(&self, _image: &[u8]) -> Result<ExtractedText, AnalyzerError> {
        Ok(ExtractedText {
            found: true,
            text: self.0.clone(),
            blocks: vec![TextBlock {
                text: self.0.clone(),
                confidence: 0.9,
                bbox: None,
            }],
            languages: vec!["es".to_string()],
            confidence: 0.9,
            note: None,
        })
    }
}

pub struct FailingOcr;

#[async_trait]
impl TextExtractor for FailingOcr {
    async fn extract_text(&self, _image: &[u8]) -> Result<ExtractedText, AnalyzerError> {
        Err(AnalyzerError::Failed("ocr engine crashed".to_string()))
    }
}

pub struct FailingTranslator;

#[async_trait]
impl Translator for FailingTranslator {
    async fn translate(
        &self,
        _text: &str,
        _target_language: &str,
    ) -> Result<TranslatedText, AnalyzerError> {
        Err(AnalyzerError::Failed("translation quota exceeded".to_string()))
    }
}

pub struct FailingCodeScanner;

#[async_trait]
impl CodeScanner for FailingCodeScanner {
    async fn scan_codes(&self, _image: &[u8]) -> Result<ScannedCodes, AnalyzerError> {
        Err(AnalyzerError::Unavailable("Code scanner".to_string()))
    }
}

/// A fully offline analyzer set with the given captioner.
pub fn analyzers_with(captioner: Arc<dyn Captioner>) -> Analyzers {
    Analyzers {
        captioner,
        detector: Arc::new(UnavailableDetector),
        search: Arc::new(RecordingSearch::default()),
        ocr: Arc::new(PlaceholderOcr),
        translator: Arc::new(PlaceholderTranslator),
        codes: Arc::new(PlaceholderCodeScanner),
    }
}
