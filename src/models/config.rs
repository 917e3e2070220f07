//! Configuration model loaded from external sources.

use std::path::PathBuf;

use serde::Deserialize;
use validator::Validate;

use crate::imaging::{
    OptimizeOptions, PREVIEW_MAX_SIDE, PREVIEW_QUALITY, UPLOAD_MAX_SIDE, UPLOAD_QUALITY,
};
use crate::services::uploads::{DEBOUNCE_MS, MAX_FILE_SIZE, MAX_PHOTOS, UploadLimits};

#[derive(Clone, Debug, Deserialize, Validate)]
/// Client settings shared across flows.
pub struct ClientConfig {
    #[validate(url)]
    pub base_url: String,
    #[serde(default)]
    pub init_data: Option<String>,
    #[serde(default = "default_max_photos")]
    #[validate(range(min = 1, max = 20))]
    pub max_photos: usize,
    #[serde(default = "default_max_file_size")]
    #[validate(range(min = 1))]
    pub max_file_size: u64,
    #[serde(default = "default_upload_max_side")]
    #[validate(range(min = 16))]
    pub upload_max_side: u32,
    #[serde(default = "default_upload_quality")]
    #[validate(range(min = 1, max = 100))]
    pub upload_quality: u8,
    #[serde(default = "default_preview_max_side")]
    #[validate(range(min = 16))]
    pub preview_max_side: u32,
    #[serde(default = "default_preview_quality")]
    #[validate(range(min = 1, max = 100))]
    pub preview_quality: u8,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_navigation_store")]
    pub navigation_store: PathBuf,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ClientConfig {
    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            max_photos: self.max_photos,
            max_file_size: self.max_file_size,
            upload: OptimizeOptions {
                max_side: self.upload_max_side,
                quality: self.upload_quality,
            },
            preview: OptimizeOptions {
                max_side: self.preview_max_side,
                quality: self.preview_quality,
            },
            debounce_ms: self.debounce_ms,
        }
    }
}

fn default_max_photos() -> usize {
    MAX_PHOTOS
}

fn default_max_file_size() -> u64 {
    MAX_FILE_SIZE
}

fn default_upload_max_side() -> u32 {
    UPLOAD_MAX_SIDE
}

fn default_upload_quality() -> u8 {
    UPLOAD_QUALITY
}

fn default_preview_max_side() -> u32 {
    PREVIEW_MAX_SIDE
}

fn default_preview_quality() -> u8 {
    PREVIEW_QUALITY
}

fn default_debounce_ms() -> u64 {
    DEBOUNCE_MS
}

fn default_navigation_store() -> PathBuf {
    PathBuf::from("./session/path_stack.json")
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url": "http://localhost:8000"}"#).unwrap();
        let limits = config.upload_limits();

        assert_eq!(limits.max_photos, 5);
        assert_eq!(limits.max_file_size, 5 * 1024 * 1024);
        assert_eq!(limits.upload, OptimizeOptions::upload());
        assert_eq!(limits.preview, OptimizeOptions::preview());
        assert!(config.init_data.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn out_of_range_settings_are_rejected() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"base_url": "not a url", "max_photos": 0, "upload_quality": 150}"#,
        )
        .unwrap();
        let errors = config.validate().unwrap_err();
        let fields = errors.field_errors();

        assert!(fields.contains_key("base_url"));
        assert!(fields.contains_key("max_photos"));
        assert!(fields.contains_key("upload_quality"));
    }
}
