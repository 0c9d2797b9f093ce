use std::path::PathBuf;

use artpaint_filters::FilterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG decode error: {0}")]
    PngDecode(#[from] png::DecodingError),

    #[error("PNG encode error: {0}")]
    PngEncode(#[from] png::EncodingError),

    #[error("Unsupported PNG: {0}")]
    UnsupportedPng(String),

    #[error("Mask {path} is {mask_width}x{mask_height}, image is {width}x{height}")]
    MaskSize {
        path: PathBuf,
        mask_width: u32,
        mask_height: u32,
        width: u32,
        height: u32,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),
}

impl From<serde_yaml::Error> for AppError {
    fn from(e: serde_yaml::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<artpaint_filters::BufferError> for AppError {
    fn from(e: artpaint_filters::BufferError) -> Self {
        AppError::Filter(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_unsupported_png() {
        let error = AppError::UnsupportedPng("16-bit palette".to_string());
        assert_eq!(error.to_string(), "Unsupported PNG: 16-bit palette");
    }

    #[test]
    fn test_app_error_mask_size() {
        let error = AppError::MaskSize {
            path: PathBuf::from("mask.png"),
            mask_width: 4,
            mask_height: 4,
            width: 8,
            height: 6,
        };
        assert_eq!(error.to_string(), "Mask mask.png is 4x4, image is 8x6");
    }

    #[test]
    fn test_app_error_config() {
        let error = AppError::Config("unknown filter".to_string());
        assert_eq!(error.to_string(), "Config error: unknown filter");
    }

    #[test]
    fn test_app_error_from_filter_error() {
        let app_error: AppError = FilterError::Cancelled.into();
        assert_eq!(app_error.to_string(), "Filter error: operation cancelled");
    }

    #[test]
    fn test_app_error_from_buffer_error() {
        let buffer_error = artpaint_filters::BufferError::InvalidGeometry {
            width: 0,
            height: 1,
            stride: 0,
        };
        match AppError::from(buffer_error) {
            AppError::Filter(FilterError::Buffer(_)) => {}
            other => panic!("Expected Filter(Buffer) variant, got {other:?}"),
        }
    }

    #[test]
    fn test_app_error_from_yaml() {
        let yaml_error = serde_yaml::from_str::<u32>("not a number").unwrap_err();
        match AppError::from(yaml_error) {
            AppError::Config(_) => {}
            other => panic!("Expected Config variant, got {other:?}"),
        }
    }
}
