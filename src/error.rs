use thiserror::Error;
use tilequant_core::{ConfigError, QuantizeError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG decode error: {0}")]
    PngDecode(String),

    #[error("PNG encode error: {0}")]
    PngEncode(String),

    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    #[error("Too many palette entries: {entries} (PNG allows at most 256)")]
    TooManyPaletteEntries { entries: usize },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Quantization failed: {0}")]
    Quantize(#[from] QuantizeError),

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Quantize(QuantizeError::Config(e))
    }
}
