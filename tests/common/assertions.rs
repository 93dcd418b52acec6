//! Assertion helpers for tests.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use pretty_assertions::assert_eq;

/// An indexed PNG read back without color expansion
#[derive(Debug)]
pub struct IndexedPng {
    pub width: usize,
    pub height: usize,
    pub bit_depth: u8,
    /// PLTE entries
    pub palette: Vec<[u8; 3]>,
    /// tRNS alpha values, if present
    pub trns: Option<Vec<u8>>,
    /// One index per pixel, row-major
    pub indices: Vec<u8>,
}

impl IndexedPng {
    pub fn index_at(&self, x: usize, y: usize) -> u8 {
        self.indices[y * self.width + x]
    }
}

/// Read an indexed PNG from disk and unpack its indices
pub fn read_indexed_png(path: &Path) -> IndexedPng {
    let bytes = fs::read(path).expect("Failed to read output PNG");
    assert_png(&bytes);

    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::IDENTITY);
    let mut reader = decoder.read_info().expect("Failed to read PNG info");
    let mut buf = vec![0; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut buf).expect("Failed to decode PNG");
    assert_eq!(frame.color_type, png::ColorType::Indexed, "Expected indexed PNG");

    let info = reader.info();
    let width = info.width as usize;
    let height = info.height as usize;
    let bit_depth = info.bit_depth as u8;
    let palette = info
        .palette
        .as_ref()
        .expect("Indexed PNG without PLTE")
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();
    let trns = info.trns.as_ref().map(|t| t.to_vec());

    let line_size = frame.line_size;
    let per_byte = 8 / bit_depth as usize;
    let mask = ((1u16 << bit_depth) - 1) as u8;
    let mut indices = Vec::with_capacity(width * height);
    for row in buf[..frame.buffer_size()].chunks(line_size) {
        for x in 0..width {
            let byte = row[x / per_byte];
            let shift = 8 - bit_depth as usize * (x % per_byte + 1);
            indices.push((byte >> shift) & mask);
        }
    }

    IndexedPng {
        width,
        height,
        bit_depth,
        palette,
        trns,
        indices,
    }
}

/// Assert bytes carry the PNG signature
pub fn assert_png(bytes: &[u8]) {
    assert!(
        bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
        "Expected PNG signature, got {:?}",
        &bytes[..8.min(bytes.len())]
    );
}

/// Assert every tile only uses indices of a single palette, returning the
/// palette number of each tile in row-major order
pub fn assert_single_palette_per_tile(
    png: &IndexedPng,
    tile_width: usize,
    tile_height: usize,
    colors_per_palette: usize,
) -> Vec<usize> {
    let mut tiles = Vec::new();
    for ty in (0..png.height).step_by(tile_height) {
        for tx in (0..png.width).step_by(tile_width) {
            let palette = png.index_at(tx, ty) as usize / colors_per_palette;
            for y in ty..ty + tile_height {
                for x in tx..tx + tile_width {
                    assert_eq!(
                        png.index_at(x, y) as usize / colors_per_palette,
                        palette,
                        "tile at ({tx}, {ty}) mixes palettes at pixel ({x}, {y})"
                    );
                }
            }
            tiles.push(palette);
        }
    }
    tiles
}

/// Assert the tRNS chunk makes exactly slot 0 of every palette transparent
pub fn assert_transparent_slots(png: &IndexedPng, colors_per_palette: usize) {
    let trns = png.trns.as_ref().expect("Expected tRNS chunk");
    for (i, &alpha) in trns.iter().enumerate() {
        let expected = if i % colors_per_palette == 0 { 0 } else { 255 };
        assert_eq!(alpha, expected, "tRNS entry {i}");
    }
    let palettes = png.palette.len() / colors_per_palette;
    assert_eq!(trns.len(), (palettes - 1) * colors_per_palette + 1);
}
