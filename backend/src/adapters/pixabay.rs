use async_trait::async_trait;
use log::{error, info, warn};
use serde::Deserialize;
use shared::ImageSearchResult;
use url::Url;

use super::{AnalyzerError, ImageSearch};

const PLACEHOLDER_SWATCHES: &[(&str, u64, u64)] = &[
    ("0066cc", 100, 50),
    ("cc6600", 80, 40),
    ("009966", 120, 60),
    ("cc0066", 90, 45),
    ("6600cc", 110, 55),
];

/// Image search through the Pixabay API. Without an API key, or whenever the
/// provider misbehaves, deterministic placeholder results are returned instead.
pub struct PixabaySearch {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PixabayResponse {
    #[serde(default)]
    hits: Vec<PixabayHit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PixabayHit {
    #[serde(default)]
    id: u64,
    #[serde(rename = "largeImageURL")]
    large_image_url: Option<String>,
    #[serde(rename = "fullHDURL")]
    full_hd_url: Option<String>,
    #[serde(rename = "webformatURL")]
    webformat_url: Option<String>,
    #[serde(rename = "previewURL", default)]
    preview_url: String,
    #[serde(default)]
    tags: String,
    #[serde(default)]
    image_width: u32,
    #[serde(default)]
    image_height: u32,
    #[serde(default)]
    image_size: u64,
    #[serde(default)]
    downloads: u64,
    #[serde(default)]
    likes: u64,
    user: Option<String>,
}

impl PixabayHit {
    fn into_result(self, query: &str) -> ImageSearchResult {
        let title = if self.tags.is_empty() {
            format!("Image about {}", query)
        } else {
            self.tags.clone()
        };
        ImageSearchResult {
            url: self
                .large_image_url
                .or(self.full_hd_url)
                .or(self.webformat_url)
                .unwrap_or_default(),
            thumbnail: self.preview_url,
            title,
            source: format!("pixabay.com/photos/{}", self.id),
            width: self.image_width,
            height: self.image_height,
            size: format!("{} bytes", self.image_size),
            downloads: Some(self.downloads),
            likes: Some(self.likes),
            user: Some(self.user.unwrap_or_else(|| "Unknown".to_string())),
            tags: self.tags.split(", ").map(str::to_string).collect(),
        }
    }
}

impl PixabaySearch {
    pub fn new(client: reqwest::Client, endpoint: Url, api_key: Option<String>) -> Self {
        if api_key.is_none() {
            warn!("No Pixabay API key found. Image search will use placeholder results.");
        }
        Self {
            client,
            endpoint,
            api_key,
        }
    }

    async fn query_provider(
        &self,
        api_key: &str,
        query: &str,
        count: usize,
    ) -> Result<Vec<ImageSearchResult>, reqwest::Error> {
        let per_page = count.min(200).to_string();
        let params = [
            ("key", api_key),
            ("q", query),
            ("image_type", "photo"),
            ("orientation", "all"),
            ("category", "all"),
            ("min_width", "640"),
            ("min_height", "480"),
            ("per_page", per_page.as_str()),
            ("safesearch", "true"),
            ("order", "popular"),
        ];

        info!("Searching Pixabay for images with query: '{}'", query);
        let response: PixabayResponse = self
            .client
            .get(self.endpoint.clone())
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let results: Vec<ImageSearchResult> = response
            .hits
            .into_iter()
            .map(|hit| hit.into_result(query))
            .collect();
        info!("Found {} images from Pixabay", results.len());
        Ok(results)
    }
}

#[async_trait]
impl ImageSearch for PixabaySearch {
    fn provider(&self) -> &'static str {
        if self.api_key.is_some() { "pixabay" } else { "demo" }
    }

    async fn search(
        &self,
        query: &str,
        count: usize,
    ) -> Result<Vec<ImageSearchResult>, AnalyzerError> {
        let Some(api_key) = &self.api_key else {
            return Ok(placeholder_results(query, count));
        };

        match self.query_provider(api_key, query, count).await {
            Ok(results) => Ok(results),
            Err(e) => {
                error!("Error calling Pixabay API: {}", e);
                info!("Falling back to placeholder results");
                Ok(placeholder_results(query, count))
            }
        }
    }
}

/// Five fixed swatches, cycled until `count` results exist.
pub fn placeholder_results(query: &str, count: usize) -> Vec<ImageSearchResult> {
    let encoded = query
        .split_whitespace()
        .map(|word| urlencoding::encode(word).into_owned())
        .collect::<Vec<_>>()
        .join("+");
    let mut tags: Vec<String> = query.split_whitespace().map(str::to_string).collect();
    tags.extend(["demo".to_string(), "placeholder".to_string()]);

    PLACEHOLDER_SWATCHES
        .iter()
        .enumerate()
        .cycle()
        .take(count)
        .map(|(i, (color, downloads, likes))| {
            let n = i + 1;
            ImageSearchResult {
                url: format!(
                    "https://via.placeholder.com/800x600/{}/ffffff?text={}+{}",
                    color, encoded, n
                ),
                thumbnail: format!(
                    "https://via.placeholder.com/150x150/{}/ffffff?text={}",
                    color, n
                ),
                title: format!("Demo image about {} #{}", query, n),
                source: "demo.placeholder.com".to_string(),
                width: 800,
                height: 600,
                size: "Demo image".to_string(),
                downloads: Some(*downloads),
                likes: Some(*likes),
                user: Some("Demo User".to_string()),
                tags: tags.clone(),
            }
        })
        .collect()
}
