use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Request options folded into a fingerprint. Kept sorted so the digest never
/// depends on the order in which options were inserted.
pub type FingerprintParams = BTreeMap<String, Value>;

pub fn calculate_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

pub fn canonical_params(params: &FingerprintParams) -> String {
    let object: Map<String, Value> = params
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Value::Object(object).to_string()
}

/// `sha256(image)` alone, or `sha256(image)_sha256(canonical params)` when options are given.
pub fn compute_key(image_data: &[u8], params: Option<&FingerprintParams>) -> String {
    let image_key = calculate_digest(image_data);
    match params {
        Some(params) if !params.is_empty() => {
            let params_key = calculate_digest(canonical_params(params).as_bytes());
            format!("{}_{}", image_key, params_key)
        }
        _ => image_key,
    }
}
