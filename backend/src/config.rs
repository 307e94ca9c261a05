use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("Invalid URL for {key}: {source}")]
    InvalidUrl {
        key: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub huggingface_token: Option<String>,
    pub caption_endpoint: Option<String>,
    pub detection_endpoint: Option<String>,
    pub pixabay_api_key: Option<String>,
    pub pixabay_endpoint: String,
    pub max_image_size: usize,
    pub max_visual_image_size: usize,
    pub default_search_count: usize,
    pub max_search_count: usize,
    pub cache_default_ttl_secs: u64,
    pub analysis_cache_ttl_secs: u64,
    pub max_batch_files: usize,
    pub max_search_batch_files: usize,
    pub batch_concurrency: usize,
    pub adapter_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(2);
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            allowed_origins: vec!["*".to_string()],
            huggingface_token: None,
            caption_endpoint: None,
            detection_endpoint: None,
            pixabay_api_key: None,
            pixabay_endpoint: "https://pixabay.com/api/".to_string(),
            max_image_size: 10 * 1024 * 1024,
            max_visual_image_size: 15 * 1024 * 1024,
            default_search_count: 10,
            max_search_count: 50,
            cache_default_ttl_secs: 600,
            analysis_cache_ttl_secs: 3600,
            max_batch_files: 10,
            max_search_batch_files: 5,
            batch_concurrency: parallelism.max(2),
            adapter_timeout_secs: 10,
        }
    }
}

impl Settings {
    /// Defaults, then the YAML file named by `LENS_CONFIG` (if any), then environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match std::env::var("LENS_CONFIG") {
            Ok(path) => {
                log::info!("Loading configuration from {}", path);
                Some(std::fs::read_to_string(path)?)
            }
            Err(_) => None,
        };
        Self::resolve(file.as_deref(), |key| std::env::var(key).ok())
    }

    /// Layers `file` (YAML) over the defaults and `lookup` over both.
    pub fn resolve<F>(file: Option<&str>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = match file {
            Some(contents) => Self::from_yaml(contents)?,
            None => Self::default(),
        };
        settings.apply_env(lookup)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        parse_into(&lookup, "PORT", &mut self.port)?;
        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            self.allowed_origins = origins
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect();
        }
        if let Some(token) = lookup("HUGGINGFACE_TOKEN") {
            self.huggingface_token = Some(token);
        }
        if let Some(endpoint) = lookup("CAPTION_ENDPOINT") {
            self.caption_endpoint = Some(endpoint);
        }
        if let Some(endpoint) = lookup("DETECTION_ENDPOINT") {
            self.detection_endpoint = Some(endpoint);
        }
        if let Some(key) = lookup("PIXABAY_API_KEY") {
            self.pixabay_api_key = Some(key);
        }
        if let Some(endpoint) = lookup("PIXABAY_ENDPOINT") {
            self.pixabay_endpoint = endpoint;
        }
        parse_into(&lookup, "MAX_IMAGE_SIZE", &mut self.max_image_size)?;
        parse_into(&lookup, "MAX_VISUAL_IMAGE_SIZE", &mut self.max_visual_image_size)?;
        parse_into(&lookup, "DEFAULT_SEARCH_COUNT", &mut self.default_search_count)?;
        parse_into(&lookup, "MAX_SEARCH_COUNT", &mut self.max_search_count)?;
        parse_into(&lookup, "CACHE_DEFAULT_TTL_SECS", &mut self.cache_default_ttl_secs)?;
        parse_into(&lookup, "ANALYSIS_CACHE_TTL_SECS", &mut self.analysis_cache_ttl_secs)?;
        parse_into(&lookup, "MAX_BATCH_FILES", &mut self.max_batch_files)?;
        parse_into(&lookup, "MAX_SEARCH_BATCH_FILES", &mut self.max_search_batch_files)?;
        parse_into(&lookup, "BATCH_CONCURRENCY", &mut self.batch_concurrency)?;
        parse_into(&lookup, "ADAPTER_TIMEOUT_SECS", &mut self.adapter_timeout_secs)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_url("PIXABAY_ENDPOINT", &self.pixabay_endpoint)?;
        if let Some(endpoint) = &self.caption_endpoint {
            parse_url("CAPTION_ENDPOINT", endpoint)?;
        }
        if let Some(endpoint) = &self.detection_endpoint {
            parse_url("DETECTION_ENDPOINT", endpoint)?;
        }
        if self.batch_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                key: "BATCH_CONCURRENCY",
                value: "0".to_string(),
            });
        }
        if self.max_search_count == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MAX_SEARCH_COUNT",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cache_default_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_default_ttl_secs)
    }

    pub fn analysis_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.analysis_cache_ttl_secs)
    }

    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_secs(self.adapter_timeout_secs)
    }
}

pub fn parse_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl { key, source })
}

fn parse_into<T, F>(lookup: &F, key: &'static str, target: &mut T) -> Result<(), ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw })?;
    }
    Ok(())
}
