use async_trait::async_trait;
use log::{error, info};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use url::Url;

use super::{AnalyzerError, Captioner};

/// Captioning backed by a hosted image-to-text inference endpoint.
pub struct HttpCaptioner {
    client: reqwest::Client,
    endpoint: Option<Url>,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

impl HttpCaptioner {
    pub fn new(client: reqwest::Client, endpoint: Option<Url>, token: Option<String>) -> Self {
        if endpoint.is_none() {
            log::warn!("No caption endpoint configured; captioning requests will fail");
        }
        Self {
            client,
            endpoint,
            token,
        }
    }
}

fn first_caption(outputs: Vec<GeneratedText>) -> Option<String> {
    outputs
        .into_iter()
        .map(|output| output.generated_text.trim().to_string())
        .find(|caption| !caption.is_empty())
}

#[async_trait]
impl Captioner for HttpCaptioner {
    async fn caption(&self, image: &[u8]) -> Result<String, AnalyzerError> {
        let endpoint = self
            .endpoint
            .as_ref()
            .ok_or_else(|| AnalyzerError::Unavailable("Image captioning model".to_string()))?;

        let mut request = self
            .client
            .post(endpoint.clone())
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let http_error = |source| AnalyzerError::Http {
            service: "captioning",
            source,
        };
        let outputs: Vec<GeneratedText> = request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(http_error)?
            .json()
            .await
            .map_err(http_error)?;

        match first_caption(outputs) {
            Some(caption) => {
                info!("Generated caption: {}", caption);
                Ok(caption)
            }
            None => {
                error!("Captioning endpoint returned no text");
                Err(AnalyzerError::Failed(
                    "Failed to generate caption: empty response".to_string(),
                ))
            }
        }
    }

    fn is_available(&self) -> bool {
        self.endpoint.is_some()
    }
}
