use std::fs;
use std::path::Path;

use serde::Serialize;
use tilequant_core::{Image, QuantizeOptions, Quantized, TileQuantizer};

use crate::codec;
use crate::error::AppError;

/// Which core entry point a conversion runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionMode {
    /// Full color budget search
    Search,
    /// Palette extraction from an image that already fits
    Simple,
}

/// Summary of a finished conversion, written by `--report`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    pub mode: ConversionMode,
    pub width: usize,
    pub height: usize,
    /// Total colors of the successful attempt
    pub color_budget: usize,
    pub attempts: usize,
    pub num_palettes: usize,
    pub colors_per_palette: usize,
    pub transparent: bool,
    /// Palette number per tile, row-major
    pub tile_palettes: Vec<usize>,
    /// Every palette as `#rrggbb` strings, padded to `colors_per_palette`
    pub palettes: Vec<Vec<String>>,
    /// Size of the written PNG
    pub png_bytes: usize,
}

/// Result of converting one image in memory
pub struct ConversionResult {
    pub png_bytes: Vec<u8>,
    pub report: ConversionReport,
}

/// Decodes, quantizes and re-encodes PNG images
pub struct ConversionService {
    quantizer: TileQuantizer,
    mode: ConversionMode,
    optimize: bool,
}

impl ConversionService {
    pub fn new(options: QuantizeOptions, mode: ConversionMode) -> Self {
        Self {
            quantizer: TileQuantizer::new(options),
            mode,
            optimize: false,
        }
    }

    /// Recompress the output with oxipng
    pub fn optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    /// Convert PNG bytes to indexed PNG bytes
    pub fn convert_bytes(&self, input: &[u8]) -> Result<ConversionResult, AppError> {
        let decoded = codec::decode(input)?;
        let image = Image::from_source(&decoded);

        let quantized = match self.mode {
            ConversionMode::Search => self.quantizer.quantize(&image)?,
            ConversionMode::Simple => self.quantizer.simple_convert(&image)?,
        };

        let mut png_bytes = codec::encode_indexed(&quantized.image)?;
        if self.optimize {
            png_bytes = codec::optimize(png_bytes);
        }

        let report = self.report(&quantized, png_bytes.len());
        tracing::info!(
            mode = ?self.mode,
            budget = report.color_budget,
            attempts = report.attempts,
            bytes = report.png_bytes,
            "Converted image"
        );
        Ok(ConversionResult { png_bytes, report })
    }

    /// Convert the PNG at `input` and write the result to `output`
    pub fn convert_file(&self, input: &Path, output: &Path) -> Result<ConversionReport, AppError> {
        let bytes = fs::read(input)?;
        let result = self.convert_bytes(&bytes)?;
        fs::write(output, &result.png_bytes)?;
        tracing::debug!(output = %output.display(), "Wrote PNG");
        Ok(result.report)
    }

    fn report(&self, quantized: &Quantized, png_bytes: usize) -> ConversionReport {
        let indexed = &quantized.image;
        let colors_per_palette = indexed.colors_per_palette();
        ConversionReport {
            mode: self.mode,
            width: indexed.width(),
            height: indexed.height(),
            color_budget: quantized.color_budget,
            attempts: quantized.attempts,
            num_palettes: indexed.palettes().len(),
            colors_per_palette,
            transparent: indexed.has_transparency(),
            tile_palettes: indexed.tile_palettes().to_vec(),
            palettes: indexed
                .palettes()
                .iter()
                .map(|p| {
                    p.padded(colors_per_palette)
                        .iter()
                        .map(ToString::to_string)
                        .collect()
                })
                .collect(),
            png_bytes,
        }
    }
}

impl ConversionReport {
    /// Write the report as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(format!("report serialization failed: {e}")))?;
        fs::write(path, json)?;
        Ok(())
    }
}
