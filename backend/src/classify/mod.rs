//! Keyword-driven routing of image descriptions.
//!
//! All functions here are pure: they read only the description and the static
//! tables in [`rules`], and every table is evaluated top to bottom.

pub mod rules;

use log::debug;
use shared::{ClassificationDecision, ContentCategory, SearchCategory};

use rules::{
    APPAREL_TAGS, CONTENT_TAGS, GENERAL_BRANDS, NOISE_FRAGMENTS, QUERY_RULES, SEARCH_ROUTES,
    WORN_TAGS, contains_any, first_present,
};

/// Picks the specialized analyzer for a description. First matching row wins.
pub fn classify(description: &str) -> ClassificationDecision {
    ClassificationDecision {
        category: route(description),
        refined_query: refine_query(description),
    }
}

pub fn route(description: &str) -> SearchCategory {
    let lowered = description.to_lowercase();
    SEARCH_ROUTES
        .iter()
        .find(|(_, keywords)| contains_any(&lowered, keywords))
        .map(|(category, _)| *category)
        .unwrap_or(SearchCategory::General)
}

/// Builds a search phrase that describes the scene rather than repeating the caption.
pub fn refine_query(description: &str) -> String {
    let lowered = description.to_lowercase();

    if let Some(rule) = QUERY_RULES.iter().find(|rule| (rule.applies)(&lowered)) {
        debug!("Refined query using the {} rule", rule.name);
        return (rule.compose)(&lowered);
    }

    let filtered: Vec<&str> = lowered
        .split_whitespace()
        .filter(|word| !contains_any(word, NOISE_FRAGMENTS))
        .collect();

    if let Some(brand) = first_present(&lowered, GENERAL_BRANDS) {
        let kind = if contains_any(&lowered, &["shoe", "clothing", "wear"]) {
            "fashion"
        } else {
            "product"
        };
        return format!("{} {} style lifestyle", brand, kind);
    }

    let meaningful: Vec<&str> = filtered
        .into_iter()
        .filter(|word| word.chars().count() > 3)
        .take(3)
        .collect();

    if meaningful.is_empty() {
        description.to_string()
    } else {
        meaningful.join(" ")
    }
}

/// Multi-label content tags, with apparel implying fashion and people wearing
/// something implying lifestyle. Falls back to `General`.
pub fn categorize(description: &str) -> Vec<ContentCategory> {
    let lowered = description.to_lowercase();
    let mut categories: Vec<ContentCategory> = CONTENT_TAGS
        .iter()
        .filter(|(_, keywords)| contains_any(&lowered, keywords))
        .map(|(category, _)| *category)
        .collect();

    let has_any = |tags: &[ContentCategory], categories: &[ContentCategory]| {
        tags.iter().any(|tag| categories.contains(tag))
    };

    if has_any(APPAREL_TAGS, &categories) && !categories.contains(&ContentCategory::Fashion) {
        categories.push(ContentCategory::Fashion);
    }

    if categories.contains(&ContentCategory::People)
        && has_any(WORN_TAGS, &categories)
        && !categories.contains(&ContentCategory::Lifestyle)
    {
        categories.push(ContentCategory::Lifestyle);
    }

    if categories.is_empty() {
        categories.push(ContentCategory::General);
    }
    categories
}
