use std::io::Cursor;

use tilequant_core::{IndexedImage, PixelSource, Rgb};

use crate::error::AppError;

/// Alpha values below this count as transparent.
const ALPHA_THRESHOLD: u8 = 128;

/// A decoded PNG normalized to 8-bit RGBA.
///
/// Gray, gray-alpha, palette and 16-bit inputs are all expanded, so every
/// pixel has exactly four bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: usize,
    height: usize,
    rgba: Vec<u8>,
}

impl DecodedImage {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw RGBA bytes in row-major order.
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// Whether any pixel is below the alpha threshold.
    pub fn has_alpha(&self) -> bool {
        self.rgba
            .chunks_exact(4)
            .any(|px| px[3] < ALPHA_THRESHOLD)
    }

    fn offset(&self, x: usize, y: usize) -> usize {
        (y * self.width + x) * 4
    }
}

impl PixelSource for DecodedImage {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn pixel(&self, x: usize, y: usize) -> Rgb {
        let i = self.offset(x, y);
        Rgb::new(self.rgba[i], self.rgba[i + 1], self.rgba[i + 2])
    }

    fn is_transparent(&self, x: usize, y: usize) -> bool {
        self.rgba[self.offset(x, y) + 3] < ALPHA_THRESHOLD
    }
}

/// Decode a PNG into 8-bit RGBA.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, AppError> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| AppError::PngDecode(e.to_string()))?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| AppError::PngDecode(e.to_string()))?;
    buf.truncate(info.buffer_size());

    if info.bit_depth != png::BitDepth::Eight {
        return Err(AppError::UnsupportedImage(format!(
            "bit depth {:?} after expansion",
            info.bit_depth
        )));
    }

    let rgba: Vec<u8> = match info.color_type {
        png::ColorType::Rgba => buf,
        png::ColorType::Rgb => buf
            .chunks_exact(3)
            .flat_map(|px| [px[0], px[1], px[2], 255])
            .collect(),
        png::ColorType::Grayscale => buf.iter().flat_map(|&v| [v, v, v, 255]).collect(),
        png::ColorType::GrayscaleAlpha => buf
            .chunks_exact(2)
            .flat_map(|px| [px[0], px[0], px[0], px[1]])
            .collect(),
        png::ColorType::Indexed => {
            return Err(AppError::UnsupportedImage(
                "palette image was not expanded".to_string(),
            ))
        }
    };

    let (width, height) = (info.width as usize, info.height as usize);
    if rgba.len() != width * height * 4 {
        return Err(AppError::PngDecode(format!(
            "expected {} bytes of pixel data, got {}",
            width * height * 4,
            rgba.len()
        )));
    }

    tracing::debug!(width, height, color_type = ?info.color_type, "Decoded PNG");
    Ok(DecodedImage {
        width,
        height,
        rgba,
    })
}

/// Encode an indexed image as a palette PNG.
///
/// The PLTE chunk is the flat palette, so global indices are written
/// unchanged. When the image has transparency, every transparent slot gets
/// alpha 0 in a tRNS chunk.
pub fn encode_indexed(image: &IndexedImage) -> Result<Vec<u8>, AppError> {
    let flat = image.flat_palette();
    if flat.len() > 256 {
        return Err(AppError::TooManyPaletteEntries {
            entries: flat.len(),
        });
    }

    let width = u32::try_from(image.width())
        .map_err(|_| AppError::UnsupportedImage(format!("width {}", image.width())))?;
    let height = u32::try_from(image.height())
        .map_err(|_| AppError::UnsupportedImage(format!("height {}", image.height())))?;

    let (depth, bits) = match flat.len() {
        0..=2 => (png::BitDepth::One, 1),
        3..=4 => (png::BitDepth::Two, 2),
        5..=16 => (png::BitDepth::Four, 4),
        _ => (png::BitDepth::Eight, 8),
    };
    let plte: Vec<u8> = flat.iter().flat_map(|c| c.to_bytes()).collect();
    let indices: Vec<u8> = image.indices().iter().map(|&i| i as u8).collect();
    let packed = if bits == 8 {
        indices
    } else {
        pack_nbits(&indices, width, bits)
    };

    let trns = if image.has_transparency() {
        let transparent = image.transparent_indices();
        let len = transparent.iter().max().map_or(0, |&i| i as usize + 1);
        let mut alpha = vec![255u8; len];
        for i in transparent {
            alpha[i as usize] = 0;
        }
        Some(alpha)
    } else {
        None
    };

    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = png::Encoder::new(&mut buf, width, height);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(depth);
        encoder.set_compression(png::Compression::Default);
        encoder.set_filter(png::FilterType::NoFilter);
        encoder.set_palette(plte);
        if let Some(trns) = trns {
            encoder.set_trns(trns);
        }
        let mut writer = encoder
            .write_header()
            .map_err(|e| AppError::PngEncode(e.to_string()))?;
        writer
            .write_image_data(&packed)
            .map_err(|e| AppError::PngEncode(e.to_string()))?;
    }
    Ok(buf.into_inner())
}

/// Recompress with oxipng without touching the palette layout.
///
/// Falls back to the input if oxipng fails.
pub fn optimize(bytes: Vec<u8>) -> Vec<u8> {
    let options = oxipng::Options {
        strip: oxipng::StripChunks::Safe,
        optimize_alpha: false,
        bit_depth_reduction: false,
        palette_reduction: false,
        color_type_reduction: false,
        grayscale_reduction: false,
        ..Default::default()
    };
    match oxipng::optimize_from_memory(&bytes, &options) {
        Ok(optimized) => {
            tracing::debug!(before = bytes.len(), after = optimized.len(), "Optimized PNG");
            optimized
        }
        Err(e) => {
            tracing::warn!(%e, "oxipng failed, keeping unoptimized PNG");
            bytes
        }
    }
}

/// Pack pixel values into N-bit PNG row data (1, 2, or 4 bits per pixel).
fn pack_nbits(indices: &[u8], width: u32, bits: u8) -> Vec<u8> {
    let pixels_per_byte = 8 / bits as usize;
    let bytes_per_row = (width as usize).div_ceil(pixels_per_byte);
    let height = indices.len() / width as usize;
    let mask = (1u8 << bits) - 1;
    let mut packed = Vec::with_capacity(bytes_per_row * height);

    for row in indices.chunks(width as usize) {
        let mut byte = 0u8;
        for (i, &idx) in row.iter().enumerate() {
            let shift = (8 - bits) - (i % pixels_per_byte) as u8 * bits;
            byte |= (idx & mask) << shift;

            if (i % pixels_per_byte) == pixels_per_byte - 1 || i == row.len() - 1 {
                packed.push(byte);
                byte = 0;
            }
        }
    }

    packed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilequant_core::{simple_convert, Image, QuantizeOptions};

    fn encode_rgba(width: u32, height: u32, rgba: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buf, width, height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(rgba).unwrap();
        }
        buf
    }

    fn read_indexed(bytes: &[u8]) -> (png::BitDepth, Vec<u8>, Option<Vec<u8>>) {
        let decoder = png::Decoder::new(Cursor::new(bytes));
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        (
            info.bit_depth,
            info.palette.as_ref().map(|p| p.to_vec()).unwrap_or_default(),
            info.trns.as_ref().map(|t| t.to_vec()),
        )
    }

    #[test]
    fn test_pack_nbits_2bit() {
        let packed = pack_nbits(&[0, 1, 2, 3, 3], 5, 2);
        assert_eq!(packed, vec![0b00_01_10_11, 0b11_00_00_00]);
    }

    #[test]
    fn test_pack_nbits_1bit_multiple_rows() {
        let packed = pack_nbits(&[1, 0, 1, 1, 0, 1], 3, 1);
        assert_eq!(packed, vec![0b1010_0000, 0b1010_0000]);
    }

    #[test]
    fn test_decode_rgba_alpha_threshold() {
        let rgba = [
            255, 0, 0, 255, //
            0, 255, 0, 127, //
            0, 0, 255, 128, //
            9, 9, 9, 0,
        ];
        let decoded = decode(&encode_rgba(2, 2, &rgba)).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (2, 2));
        assert_eq!(decoded.pixel(0, 0), Rgb::new(255, 0, 0));
        assert!(!decoded.is_transparent(0, 0));
        assert!(decoded.is_transparent(1, 0));
        assert!(!decoded.is_transparent(0, 1));
        assert!(decoded.is_transparent(1, 1));
        assert!(decoded.has_alpha());
    }

    #[test]
    fn test_decode_grayscale_expands() {
        let mut buf = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buf, 2, 1);
            encoder.set_color(png::ColorType::Grayscale);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[10, 200]).unwrap();
        }
        let decoded = decode(&buf).unwrap();
        assert_eq!(decoded.rgba(), &[10, 10, 10, 255, 200, 200, 200, 255]);
        assert!(!decoded.has_alpha());
    }

    #[test]
    fn test_decode_garbage_fails() {
        match decode(b"not a png") {
            Err(AppError::PngDecode(_)) => {}
            other => panic!("Expected PngDecode, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_indexed_layout() {
        let colors = [Rgb::new(10, 20, 30), Rgb::new(40, 50, 60)];
        let pixels = (0..64).map(|i| colors[i % 2]).collect();
        let image = Image::new(8, 8, pixels).unwrap();
        let result = simple_convert(&image, &QuantizeOptions::new(2, 4)).unwrap();

        let bytes = encode_indexed(&result.image).unwrap();
        let (depth, plte, trns) = read_indexed(&bytes);
        assert_eq!(depth, png::BitDepth::Four);
        assert_eq!(plte.len(), 8 * 3);
        assert_eq!(&plte[..6], &[10, 20, 30, 40, 50, 60]);
        assert!(trns.is_none());

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.pixel(0, 0), colors[0]);
        assert_eq!(decoded.pixel(1, 0), colors[1]);
    }

    #[test]
    fn test_encode_indexed_marks_transparent_slots() {
        let magenta = Rgb::new(255, 0, 255);
        let pixels = (0..64)
            .map(|i| if i % 3 == 0 { magenta } else { Rgb::new(1, 2, 3) })
            .collect();
        let image = Image::new(8, 8, pixels).unwrap();
        let options = QuantizeOptions::new(2, 4).transparent_color(magenta);
        let result = simple_convert(&image, &options).unwrap();

        let bytes = encode_indexed(&result.image).unwrap();
        let (_, _, trns) = read_indexed(&bytes);
        assert_eq!(trns, Some(vec![0, 255, 255, 255, 0]));

        let decoded = decode(&bytes).unwrap();
        assert!(decoded.is_transparent(0, 0));
        assert!(!decoded.is_transparent(1, 0));
    }

    #[test]
    fn test_encode_rejects_large_palettes() {
        let image = Image::new(8, 8, vec![Rgb::BLACK; 64]).unwrap();
        let result = simple_convert(&image, &QuantizeOptions::new(32, 16)).unwrap();
        match encode_indexed(&result.image) {
            Err(AppError::TooManyPaletteEntries { entries }) => assert_eq!(entries, 512),
            other => panic!("Expected TooManyPaletteEntries, got {other:?}"),
        }
    }

    #[test]
    fn test_optimize_keeps_palette() {
        let colors = [Rgb::new(10, 20, 30), Rgb::new(40, 50, 60)];
        let pixels = (0..256).map(|i| colors[i / 16 % 2]).collect();
        let image = Image::new(16, 16, pixels).unwrap();
        let result = simple_convert(&image, &QuantizeOptions::new(2, 4)).unwrap();

        let bytes = encode_indexed(&result.image).unwrap();
        let optimized = optimize(bytes.clone());
        let (_, before, _) = read_indexed(&bytes);
        let (_, after, _) = read_indexed(&optimized);
        assert_eq!(before, after);
        assert_eq!(decode(&optimized).unwrap(), decode(&bytes).unwrap());
    }
}
