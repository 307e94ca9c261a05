use async_trait::async_trait;
use log::info;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use shared::BoundingBox;
use url::Url;

use super::{AnalyzerError, Detection, ObjectDetector};

/// Object detection backed by a hosted detection endpoint.
pub struct HttpDetector {
    client: reqwest::Client,
    endpoint: Option<Url>,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDetection {
    label: String,
    score: f32,
    #[serde(rename = "box")]
    bbox: Option<RawBox>,
}

#[derive(Debug, Deserialize)]
struct RawBox {
    xmin: f32,
    ymin: f32,
    xmax: f32,
    ymax: f32,
}

impl HttpDetector {
    pub fn new(client: reqwest::Client, endpoint: Option<Url>, token: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            token,
        }
    }
}

fn into_detections(raw: Vec<RawDetection>, threshold: f32) -> Vec<Detection> {
    raw.into_iter()
        .filter(|detection| detection.score >= threshold)
        .map(|detection| Detection {
            label: detection.label,
            confidence: detection.score,
            bbox: detection.bbox.map(|b| BoundingBox {
                x1: b.xmin,
                y1: b.ymin,
                x2: b.xmax,
                y2: b.ymax,
            }),
        })
        .collect()
}

#[async_trait]
impl ObjectDetector for HttpDetector {
    fn method(&self) -> &'static str {
        "detection_model"
    }

    fn is_available(&self) -> bool {
        self.endpoint.is_some()
    }

    async fn detect(&self, image: &[u8], threshold: f32) -> Result<Vec<Detection>, AnalyzerError> {
        let endpoint = self
            .endpoint
            .as_ref()
            .ok_or_else(|| AnalyzerError::Unavailable("Object detection model".to_string()))?;

        let mut request = self
            .client
            .post(endpoint.clone())
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let http_error = |source| AnalyzerError::Http {
            service: "object detection",
            source,
        };
        let raw: Vec<RawDetection> = request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(http_error)?
            .json()
            .await
            .map_err(http_error)?;

        let detections = into_detections(raw, threshold);
        info!("Detected {} objects", detections.len());
        Ok(detections)
    }
}
