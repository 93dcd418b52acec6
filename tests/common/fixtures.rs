//! Test fixtures: synthetic PNGs in temporary directories.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// Colors used across tests
pub mod colors {
    pub const MAGENTA: [u8; 3] = [255, 0, 255];
    pub const BLACK: [u8; 3] = [0, 0, 0];
    pub const RED: [u8; 3] = [255, 0, 0];
    pub const GREEN: [u8; 3] = [0, 255, 0];
    pub const BLUE: [u8; 3] = [0, 0, 255];
}

/// A temporary directory holding test inputs and outputs
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Path of `name` inside the workspace
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write an 8-bit RGBA PNG built from `pixel(x, y)`
    pub fn write_rgba_png(
        &self,
        name: &str,
        width: u32,
        height: u32,
        pixel: impl Fn(u32, u32) -> [u8; 4],
    ) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, rgba_png(width, height, pixel)).expect("Failed to write PNG");
        path
    }

    /// Write an opaque 8-bit RGB PNG built from `pixel(x, y)`
    pub fn write_rgb_png(
        &self,
        name: &str,
        width: u32,
        height: u32,
        pixel: impl Fn(u32, u32) -> [u8; 3],
    ) -> PathBuf {
        self.write_rgba_png(name, width, height, |x, y| {
            let [r, g, b] = pixel(x, y);
            [r, g, b, 255]
        })
    }

    /// Write a text file
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).expect("Failed to write file");
        path
    }
}

/// Encode an 8-bit RGBA PNG in memory
pub fn rgba_png(width: u32, height: u32, pixel: impl Fn(u32, u32) -> [u8; 4]) -> Vec<u8> {
    let data: Vec<u8> = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .flat_map(|(x, y)| pixel(x, y))
        .collect();
    let mut buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buf, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().expect("Failed to write PNG header");
        writer
            .write_image_data(&data)
            .expect("Failed to write PNG data");
    }
    buf
}

/// Smooth two-channel gradient: every pixel of a 16x16 block differs
pub fn gradient(x: u32, y: u32) -> [u8; 3] {
    [(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) * 3 % 256) as u8]
}

/// Image where every pixel of every tile already uses one of four colors
pub fn four_colors(x: u32, y: u32) -> [u8; 3] {
    [colors::BLACK, colors::RED, colors::GREEN, colors::BLUE][((x + y) % 4) as usize]
}

/// Presets file with a single small preset, used as default
pub const SMALL_PRESETS_YAML: &str = r#"
default_preset: tiny
presets:
  tiny:
    description: Two palettes of four colors
    tile_width: 8
    tile_height: 8
    num_palettes: 2
    colors_per_palette: 4
"#;
