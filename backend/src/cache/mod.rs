pub mod cache_service;
pub mod clock;
pub mod fingerprint;
pub mod models;

pub use cache_service::FingerprintCache;
