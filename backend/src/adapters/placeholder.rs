//! Stand-ins for analyzers that have no backing service yet. They never fail,
//! and each result carries a note saying what is missing.

use async_trait::async_trait;

use super::{
    AnalyzerError, CodeScanner, ExtractedText, ScannedCodes, TextExtractor, TranslatedText,
    Translator,
};

pub struct PlaceholderOcr;

#[async_trait]
impl TextExtractor for PlaceholderOcr {
    async fn extract_text(&self, _image: &[u8]) -> Result<ExtractedText, AnalyzerError> {
        Ok(ExtractedText {
            found: false,
            text: String::new(),
            blocks: Vec::new(),
            languages: vec!["en".to_string()],
            confidence: 0.0,
            note: Some("No OCR engine configured; text extraction is disabled".to_string()),
        })
    }
}

/// Echoes the input back untranslated.
pub struct PlaceholderTranslator;

#[async_trait]
impl Translator for PlaceholderTranslator {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<TranslatedText, AnalyzerError> {
        Ok(TranslatedText {
            translated_text: text.to_string(),
            source_language: "en".to_string(),
            confidence: 0.0,
            note: Some(format!(
                "No translation service configured; text returned as-is (requested {})",
                target_language
            )),
        })
    }
}

pub struct PlaceholderCodeScanner;

#[async_trait]
impl CodeScanner for PlaceholderCodeScanner {
    async fn scan_codes(&self, _image: &[u8]) -> Result<ScannedCodes, AnalyzerError> {
        Ok(ScannedCodes {
            qr_codes: Vec::new(),
            barcodes: Vec::new(),
            note: Some("QR and barcode scanning is not configured".to_string()),
        })
    }
}
