use shared::{ContentCategory, SearchCategory};

/// Priority-ordered routing table. The first row whose keywords appear in the
/// lower-cased description decides the category.
pub const SEARCH_ROUTES: &[(SearchCategory, &[&str])] = &[
    (SearchCategory::Food, &["food", "dish", "meal", "restaurant", "cuisine"]),
    (SearchCategory::Nature, &["plant", "flower", "tree", "nature", "garden"]),
    (
        SearchCategory::Landmarks,
        &["building", "architecture", "landmark", "monument"],
    ),
    (
        SearchCategory::Shopping,
        &["clothing", "fashion", "wear", "outfit", "style", "man", "woman"],
    ),
    (
        SearchCategory::Shopping,
        &["product", "item", "device", "gadget", "tool"],
    ),
];

/// Multi-label tagging table. Every matching row contributes its category.
pub const CONTENT_TAGS: &[(ContentCategory, &[&str])] = &[
    (
        ContentCategory::Fashion,
        &[
            "fashion", "style", "outfit", "clothing", "wear", "sweater", "hoodie", "pants",
            "trousers", "jeans", "shirt", "dress", "skirt", "jacket", "coat",
        ],
    ),
    (
        ContentCategory::Menswear,
        &["man", "male", "guy", "men's", "masculine", "gentleman"],
    ),
    (
        ContentCategory::Womenswear,
        &["woman", "female", "lady", "women's", "feminine"],
    ),
    (
        ContentCategory::Footwear,
        &["shoes", "sneakers", "boots", "sandals", "heels", "footwear"],
    ),
    (
        ContentCategory::Accessories,
        &["watch", "bag", "jewelry", "hat", "sunglasses", "belt"],
    ),
    (
        ContentCategory::Lifestyle,
        &["casual", "professional", "formal", "street", "urban", "minimal", "elegant"],
    ),
    (
        ContentCategory::People,
        &["person", "people", "portrait", "face", "individual"],
    ),
    (
        ContentCategory::Animals,
        &["dog", "cat", "bird", "animal", "pet", "wildlife"],
    ),
    (
        ContentCategory::Food,
        &["food", "dish", "meal", "restaurant", "cooking", "kitchen", "cuisine", "dining"],
    ),
    (
        ContentCategory::Nature,
        &["tree", "flower", "plant", "garden", "landscape", "outdoor", "forest", "mountain"],
    ),
    (
        ContentCategory::Technology,
        &["phone", "computer", "device", "electronic", "screen", "laptop", "smartphone"],
    ),
    (
        ContentCategory::Transportation,
        &["car", "bike", "train", "bus", "vehicle", "motorcycle"],
    ),
    (
        ContentCategory::Architecture,
        &["building", "house", "architecture", "structure", "interior", "room"],
    ),
    (
        ContentCategory::Shopping,
        &["product", "item", "store", "brand", "commercial"],
    ),
    (
        ContentCategory::Documents,
        &["text", "document", "paper", "book", "sign", "writing"],
    ),
    (
        ContentCategory::Sports,
        &["sport", "fitness", "gym", "exercise", "athletic", "workout"],
    ),
    (
        ContentCategory::Art,
        &["art", "painting", "creative", "design", "gallery", "artistic"],
    ),
];

/// Any of these implies `Fashion`.
pub const APPAREL_TAGS: &[ContentCategory] = &[
    ContentCategory::Menswear,
    ContentCategory::Womenswear,
    ContentCategory::Footwear,
    ContentCategory::Accessories,
];

/// Combined with `People`, any of these implies `Lifestyle`.
pub const WORN_TAGS: &[ContentCategory] = &[
    ContentCategory::Fashion,
    ContentCategory::Menswear,
    ContentCategory::Womenswear,
];

pub struct QueryRule {
    pub name: &'static str,
    pub applies: fn(&str) -> bool,
    pub compose: fn(&str) -> String,
}

/// Context-aware search phrases, tried top to bottom against the lower-cased description.
pub const QUERY_RULES: &[QueryRule] = &[
    QueryRule {
        name: "sweaters",
        applies: |d| contains_any(d, &["sweater", "hoodie", "pullover", "jumper", "cardigan"]),
        compose: |d| {
            if contains_any(d, &["black", "dark", "minimal", "casual"]) {
                "minimalist casual menswear black sweater".to_string()
            } else {
                "casual sweater menswear fashion".to_string()
            }
        },
    },
    QueryRule {
        name: "pants",
        applies: |d| contains_any(d, &["pants", "trousers", "jeans", "chinos"]),
        compose: |d| {
            if contains_any(d, &["white", "cream", "beige"]) {
                "casual white pants menswear minimalist".to_string()
            } else {
                "casual pants menswear fashion".to_string()
            }
        },
    },
    QueryRule {
        name: "menswear_outfit",
        applies: |d| {
            contains_any(d, &["man", "male", "guy"])
                && contains_any(d, &["standing", "wearing", "outfit"])
        },
        compose: compose_menswear,
    },
    QueryRule {
        name: "phones",
        applies: |d| contains_any(d, &["phone", "smartphone", "mobile"]),
        compose: |d| {
            if contains_any(d, &["iphone", "apple", "samsung", "android"]) {
                "modern smartphone technology mobile device".to_string()
            } else {
                "smartphone mobile phone technology".to_string()
            }
        },
    },
    QueryRule {
        name: "laptops",
        applies: |d| contains_any(d, &["laptop", "computer", "macbook"]),
        compose: |_| "modern laptop computer technology workspace".to_string(),
    },
    QueryRule {
        name: "food",
        applies: |d| contains_any(d, &["pizza", "burger", "sandwich"]),
        compose: |_| "delicious food cuisine restaurant dining".to_string(),
    },
    QueryRule {
        name: "coffee",
        applies: |d| contains_any(d, &["coffee", "latte", "cappuccino"]),
        compose: |_| "coffee cafe barista lifestyle".to_string(),
    },
    QueryRule {
        name: "footwear",
        applies: |d| contains_any(d, &["shoes", "sneakers", "boots", "sandals"]),
        compose: |d| match first_present(d, FOOTWEAR_BRANDS) {
            Some(brand) => format!("{} footwear sneakers style fashion", brand),
            None => "footwear shoes fashion style".to_string(),
        },
    },
    QueryRule {
        name: "home",
        applies: |d| contains_any(d, &["room", "interior", "furniture", "decor"]),
        compose: |_| "home decor interior design lifestyle".to_string(),
    },
    QueryRule {
        name: "outdoor",
        applies: |d| contains_any(d, &["landscape", "mountain", "forest", "beach"]),
        compose: |_| "nature outdoor landscape photography travel".to_string(),
    },
    QueryRule {
        name: "fitness",
        applies: |d| contains_any(d, &["gym", "workout", "fitness", "exercise"]),
        compose: |_| "fitness workout health lifestyle sports".to_string(),
    },
    QueryRule {
        name: "art",
        applies: |d| contains_any(d, &["painting", "art", "gallery", "museum"]),
        compose: |_| "art culture creative design inspiration".to_string(),
    },
];

pub const FOOTWEAR_BRANDS: &[&str] = &["nike", "adidas", "converse", "vans"];

pub const GENERAL_BRANDS: &[&str] = &[
    "nike", "adidas", "apple", "samsung", "sony", "canon", "bmw", "mercedes",
];

/// Words containing any of these fragments are dropped from fallback queries.
pub const NOISE_FRAGMENTS: &[&str] = &["'s", "women", "men", "2", "air", "zoom", "size", "color"];

const STYLE_INDICATORS: &[(&str, &[&str])] = &[
    ("minimalist", &["minimal", "simple", "clean", "basic"]),
    ("casual", &["casual", "relaxed", "comfortable"]),
    ("streetwear", &["street", "urban", "modern"]),
    ("formal", &["professional", "business", "formal"]),
];

fn compose_menswear(description: &str) -> String {
    let styles: Vec<&str> = STYLE_INDICATORS
        .iter()
        .filter(|(_, cues)| contains_any(description, cues))
        .map(|(style, _)| *style)
        .collect();

    if styles.is_empty() {
        "casual menswear fashion style".to_string()
    } else {
        format!("{} menswear fashion style", styles.join(" "))
    }
}

pub fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

pub fn first_present<'a>(haystack: &str, needles: &[&'a str]) -> Option<&'a str> {
    needles
        .iter()
        .copied()
        .find(|needle| haystack.contains(needle))
}
