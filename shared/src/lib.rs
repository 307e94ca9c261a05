use serde::{Deserialize, Serialize};
use strum_macros::Display;
use uuid::Uuid;

/// Optional analyzers a caller can switch on for a single image.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    pub objects: bool,
    pub text: bool,
    pub shopping: bool,
    pub translation: bool,
    pub landmarks: bool,
    pub nature: bool,
    pub food: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            objects: true,
            text: true,
            shopping: true,
            translation: false,
            landmarks: false,
            nature: false,
            food: false,
        }
    }
}

impl FeatureFlags {
    pub fn quick_scan() -> Self {
        Self {
            objects: true,
            text: true,
            shopping: false,
            translation: false,
            landmarks: false,
            nature: false,
            food: false,
        }
    }
}

/// Coarse content tags attached to the image description. Several may apply at once.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContentCategory {
    Fashion,
    Menswear,
    Womenswear,
    Footwear,
    Accessories,
    Lifestyle,
    People,
    Animals,
    Food,
    Nature,
    Technology,
    Transportation,
    Architecture,
    Shopping,
    Documents,
    Sports,
    Art,
    General,
}

/// The single specialized analyzer a smart search is routed to.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SearchCategory {
    #[default]
    General,
    Shopping,
    Food,
    Nature,
    Landmarks,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ClassificationDecision {
    pub category: SearchCategory,
    pub refined_query: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BasicInfo {
    pub description: String,
    pub confidence: f32,
    pub categories: Vec<ContentCategory>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DetectedObject {
    pub name: String,
    pub confidence: f32,
    pub description: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_via: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ObjectAnalysis {
    pub objects_found: usize,
    pub objects: Vec<DetectedObject>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_threshold: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TextBlock {
    pub text: String,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TextExtraction {
    pub text_found: bool,
    pub extracted_text: String,
    pub languages_detected: Vec<String>,
    pub text_blocks: Vec<TextBlock>,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Translation {
    pub translated: bool,
    pub original_text: String,
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ImageSearchResult {
    pub url: String,
    pub thumbnail: String,
    pub title: String,
    pub source: String,
    pub width: u32,
    pub height: u32,
    pub size: String,
    pub downloads: Option<u64>,
    pub likes: Option<u64>,
    pub user: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Product {
    pub title: String,
    pub image: String,
    pub source: String,
    pub estimated_price: String,
    pub buy_links: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ShoppingResult {
    pub products_found: usize,
    pub products: Vec<Product>,
    pub search_query: String,
    pub original_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Landmark {
    pub name: String,
    pub description: String,
    pub confidence: f32,
    pub location: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LandmarkResult {
    pub landmark_detected: bool,
    pub possible_landmarks: Vec<Landmark>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NatureFinding {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub confidence: f32,
    pub scientific_name: String,
    pub description: String,
    pub care_tips: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NatureResult {
    pub nature_found: bool,
    pub identified: Vec<NatureFinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DietaryInfo {
    pub vegetarian: String,
    pub vegan: String,
    pub gluten_free: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DishInfo {
    pub name: String,
    pub estimated_calories: String,
    pub main_ingredients: Vec<String>,
    pub cuisine_type: String,
    pub dietary_info: DietaryInfo,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Nutrition {
    pub calories: String,
    pub protein: String,
    pub carbs: String,
    pub fat: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FoodResult {
    pub food_detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dish_info: Option<DishInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<Nutrition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QrCode {
    pub content: String,
    pub format: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Barcode {
    pub content: String,
    pub format: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CodeScanResult {
    pub codes_found: usize,
    pub qr_codes: Vec<QrCode>,
    pub barcodes: Vec<Barcode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One slot per analyzer. A `None` slot was not requested; a requested slot that
/// failed carries `error`; a requested slot with zero findings carries neither.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnalysisResults {
    pub basic_info: BasicInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objects: Option<ObjectAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextExtraction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<Translation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shopping: Option<ShoppingResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<LandmarkResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nature: Option<NatureResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food: Option<FoodResult>,
    pub codes: CodeScanResult,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ImageInfo {
    pub filename: Option<String>,
    pub size: usize,
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnalysisMeta {
    pub processing_time: f64,
    pub image_info: ImageInfo,
    pub features_used: FeatureFlags,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnalysisResponse {
    pub analysis_results: AnalysisResults,
    pub meta: AnalysisMeta,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeneralSearch {
    pub search_type: SearchCategory,
    pub description: String,
    pub contextual_query: String,
    pub similar_images: Vec<ImageSearchResult>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum SmartSearchResults {
    Shopping(ShoppingResult),
    Food(FoodResult),
    Nature(NatureResult),
    Landmarks(LandmarkResult),
    General(GeneralSearch),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SmartSearchResponse {
    pub search_results: SmartSearchResults,
    pub detected_type: SearchCategory,
    pub original_description: String,
    pub contextual_understanding: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DescriptionSearch {
    pub query: String,
    pub original_description: String,
    pub results: Vec<ImageSearchResult>,
    pub total_found: usize,
    pub api_used: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CaptionResponse {
    pub caption: String,
    pub processing_time: f64,
    pub cached: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImageSearchResponse {
    pub caption: String,
    pub similar_images: Vec<ImageSearchResult>,
    pub total_found: usize,
    pub processing_time: f64,
    pub cached: bool,
    pub api_used: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Rejected,
    Succeeded,
    Failed,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchItemResult<T> {
    pub index: usize,
    pub filename: Option<String>,
    pub status: ItemStatus,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub payload: Option<T>,
}

impl<T> BatchItemResult<T> {
    pub fn succeeded(index: usize, filename: Option<String>, payload: T) -> Self {
        Self {
            index,
            filename,
            status: ItemStatus::Succeeded,
            success: true,
            error: None,
            payload: Some(payload),
        }
    }

    pub fn failed(index: usize, filename: Option<String>, error: String) -> Self {
        Self {
            index,
            filename,
            status: ItemStatus::Failed,
            success: false,
            error: Some(error),
            payload: None,
        }
    }

    pub fn rejected(index: usize, filename: Option<String>, error: String) -> Self {
        Self {
            status: ItemStatus::Rejected,
            ..Self::failed(index, filename, error)
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchResponse<T> {
    pub batch_id: Uuid,
    pub total_files: usize,
    pub processed: usize,
    pub failed: usize,
    pub results: Vec<BatchItemResult<T>>,
    pub processing_time: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CaptionPayload {
    pub caption: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SimilarImage {
    pub url: String,
    pub thumbnail: String,
    pub title: String,
    pub source: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SearchPayload {
    pub caption: String,
    pub similar_images: Vec<SimilarImage>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub total_items: usize,
    pub active_items: usize,
    pub expired_items: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
