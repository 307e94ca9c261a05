//! Description-only analyzers: used when no model backs a feature, and as the
//! object-detection fallback.

use shared::{
    DetectedObject, DietaryInfo, DishInfo, FoodResult, Landmark, LandmarkResult, NatureFinding,
    NatureResult, Nutrition, ObjectAnalysis,
};

pub const DESCRIPTION_METHOD: &str = "description_based";

const MAX_FALLBACK_CONFIDENCE: f32 = 0.95;

/// (object, category, keywords). Keyword order matters: the first hit is reported.
const OBJECT_KEYWORDS: &[(&str, &str, &[&str])] = &[
    ("person", "people", &["person", "man", "woman", "child", "people", "individual"]),
    ("face", "people", &["face", "portrait", "head"]),
    ("clothing", "fashion", &["clothing", "shirt", "jacket", "dress", "pants", "sweater"]),
    ("shoes", "fashion", &["shoes", "sneakers", "boots", "footwear"]),
    ("accessories", "fashion", &["watch", "bag", "hat", "jewelry"]),
    ("phone", "technology", &["phone", "smartphone", "mobile"]),
    ("computer", "technology", &["computer", "laptop", "screen", "monitor"]),
    ("device", "technology", &["device", "electronic", "gadget"]),
    ("chair", "furniture", &["chair", "seat"]),
    ("table", "furniture", &["table", "desk"]),
    ("book", "items", &["book", "document", "paper"]),
    ("bottle", "items", &["bottle", "container"]),
    ("cup", "items", &["cup", "mug", "glass"]),
    ("food", "food", &["food", "meal", "dish", "plate"]),
    ("car", "transportation", &["car", "vehicle", "automobile"]),
    ("bike", "transportation", &["bike", "bicycle", "motorcycle"]),
    ("tree", "nature", &["tree", "plant", "vegetation"]),
    ("flower", "nature", &["flower", "bloom", "blossom"]),
    ("building", "architecture", &["building", "house", "structure", "architecture"]),
    ("sign", "text", &["sign", "text", "writing"]),
];

const LANDMARK_KEYWORDS: &[&str] = &[
    "building",
    "architecture",
    "monument",
    "landmark",
    "structure",
    "tower",
    "bridge",
];

const NATURE_KEYWORDS: &[(&str, &[&str])] = &[
    ("plants", &["flower", "tree", "plant", "leaf", "garden", "botanical"]),
    ("animals", &["dog", "cat", "bird", "animal", "wildlife", "pet"]),
];

const FOOD_KEYWORDS: &[&str] = &["food", "dish", "meal", "plate", "cooking", "restaurant", "cuisine"];

const UNKNOWN: &str = "Unknown";

/// Category reported for a detected object label, `object` when unmapped.
pub fn categorize_object(name: &str) -> &'static str {
    OBJECT_KEYWORDS
        .iter()
        .find(|(object, _, _)| *object == name)
        .map(|(_, category, _)| *category)
        .unwrap_or("object")
}

/// Scans the description for known objects. Confidence grows with how specific
/// the match is and never exceeds 0.95.
pub fn objects_from_description(description: &str, threshold: f32) -> ObjectAnalysis {
    let lowered = description.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();

    let objects: Vec<DetectedObject> = OBJECT_KEYWORDS
        .iter()
        .filter_map(|(name, category, keywords)| {
            let keyword = keywords.iter().find(|keyword| lowered.contains(**keyword))?;
            let mut confidence = threshold + 0.1;
            if words.contains(keyword) {
                confidence += 0.2;
            }
            if keyword == name {
                confidence += 0.1;
            }
            Some(DetectedObject {
                name: name.to_string(),
                confidence: confidence.min(MAX_FALLBACK_CONFIDENCE),
                description: format!("{} detected from image description", capitalize(name)),
                category: category.to_string(),
                bbox: None,
                detected_via: Some(keyword.to_string()),
            })
        })
        .collect();

    ObjectAnalysis {
        objects_found: objects.len(),
        objects,
        method: DESCRIPTION_METHOD.to_string(),
        confidence_threshold: Some(threshold),
        source_description: Some(description.to_string()),
    }
}

pub fn identify_landmarks(description: &str) -> LandmarkResult {
    let lowered = description.to_lowercase();
    if !LANDMARK_KEYWORDS.iter().any(|keyword| lowered.contains(*keyword)) {
        return LandmarkResult {
            landmark_detected: false,
            possible_landmarks: Vec::new(),
            note: None,
        };
    }

    LandmarkResult {
        landmark_detected: true,
        possible_landmarks: vec![Landmark {
            name: "Architectural Structure".to_string(),
            description: description.to_string(),
            confidence: 0.6,
            location: UNKNOWN.to_string(),
            kind: "building".to_string(),
        }],
        note: Some("Landmark recognition service not configured; matched on description".to_string()),
    }
}

/// At most one finding per kind (plants, animals).
pub fn identify_nature(description: &str) -> NatureResult {
    let lowered = description.to_lowercase();
    let identified: Vec<NatureFinding> = NATURE_KEYWORDS
        .iter()
        .filter_map(|(kind, keywords)| {
            let keyword = keywords.iter().find(|keyword| lowered.contains(**keyword))?;
            let name = capitalize(keyword);
            Some(NatureFinding {
                kind: kind.to_string(),
                description: format!("{} identified in image", name),
                name,
                confidence: 0.7,
                scientific_name: UNKNOWN.to_string(),
                care_tips: "Consult gardening/pet care resources".to_string(),
            })
        })
        .collect();

    NatureResult {
        nature_found: !identified.is_empty(),
        identified,
        note: Some("Species identification service not configured; matched on description".to_string()),
    }
}

pub fn analyze_food(description: &str) -> FoodResult {
    let lowered = description.to_lowercase();
    if !FOOD_KEYWORDS.iter().any(|keyword| lowered.contains(*keyword)) {
        return FoodResult {
            food_detected: false,
            dish_info: None,
            nutrition: None,
            note: None,
        };
    }

    let unknown = || UNKNOWN.to_string();
    let not_available = || "N/A".to_string();
    FoodResult {
        food_detected: true,
        dish_info: Some(DishInfo {
            name: description.to_string(),
            estimated_calories: unknown(),
            main_ingredients: vec![unknown()],
            cuisine_type: unknown(),
            dietary_info: DietaryInfo {
                vegetarian: unknown(),
                vegan: unknown(),
                gluten_free: unknown(),
            },
        }),
        nutrition: Some(Nutrition {
            calories: not_available(),
            protein: not_available(),
            carbs: not_available(),
            fat: not_available(),
        }),
        note: Some("Food recognition service not configured; matched on description".to_string()),
    }
}

pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
