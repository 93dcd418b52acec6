//! End-to-end tests for the full color budget search.

mod common;

use common::fixtures::{self, colors};
use common::{assert_single_palette_per_tile, assert_transparent_slots, read_indexed_png, Workspace};
use pretty_assertions::assert_eq;
use tilequant::codec;
use tilequant::error::AppError;
use tilequant::services::{ConversionMode, ConversionService};
use tilequant_core::{QuantizeError, QuantizeOptions, Rgb, StopCondition};

#[test]
fn test_convert_gradient_fits_tile_constraint() {
    let ws = Workspace::new();
    let input = ws.write_rgb_png("in.png", 32, 32, fixtures::gradient);
    let output = ws.path("out.png");

    let options = QuantizeOptions::new(4, 16).tile_size(8, 8);
    let report = ConversionService::new(options, ConversionMode::Search)
        .convert_file(&input, &output)
        .unwrap();

    let png = read_indexed_png(&output);
    assert_eq!((png.width, png.height), (32, 32));
    assert_eq!(png.palette.len(), 64);
    assert!(png.trns.is_none());

    let tiles = assert_single_palette_per_tile(&png, 8, 8, 16);
    assert_eq!(tiles, report.tile_palettes);
    assert!(report.color_budget >= 4 && report.color_budget <= 64);
    assert!(report.attempts >= 1);
}

#[test]
fn test_convert_transparent_color_uses_slot_zero() {
    let ws = Workspace::new();
    let is_magenta = |x: u32, y: u32| (x / 3 + y) % 5 == 0;
    let input = ws.write_rgb_png("in.png", 32, 16, |x, y| {
        if is_magenta(x, y) {
            colors::MAGENTA
        } else {
            fixtures::gradient(x, y)
        }
    });
    let output = ws.path("out.png");

    let options = QuantizeOptions::new(4, 16).transparent_color(Rgb::new(255, 0, 255));
    ConversionService::new(options, ConversionMode::Search)
        .convert_file(&input, &output)
        .unwrap();

    let png = read_indexed_png(&output);
    assert_transparent_slots(&png, 16);
    for p in 0..4 {
        assert_eq!(png.palette[p * 16], colors::MAGENTA);
    }
    for y in 0..16 {
        for x in 0..32 {
            assert_eq!(
                png.index_at(x, y) % 16 == 0,
                is_magenta(x as u32, y as u32),
                "pixel ({x}, {y})"
            );
        }
    }
}

#[test]
fn test_convert_source_alpha_transparency() {
    let ws = Workspace::new();
    let clear = |x: u32, y: u32| x < 4 && y < 4;
    let input = ws.write_rgba_png("in.png", 16, 16, |x, y| {
        let [r, g, b] = fixtures::gradient(x, y);
        [r, g, b, if clear(x, y) { 0 } else { 255 }]
    });
    let output = ws.path("out.png");

    let options = QuantizeOptions::new(2, 8).transparency(tilequant_core::Transparency::FromSource);
    ConversionService::new(options, ConversionMode::Search)
        .convert_file(&input, &output)
        .unwrap();

    let png = read_indexed_png(&output);
    assert_transparent_slots(&png, 8);
    for y in 0..16 {
        for x in 0..16 {
            assert_eq!(
                png.index_at(x, y) % 8 == 0,
                clear(x as u32, y as u32),
                "pixel ({x}, {y})"
            );
        }
    }

    let decoded = codec::decode(&std::fs::read(&output).unwrap()).unwrap();
    assert_eq!(decoded.rgba()[3], 0);
    assert_eq!(decoded.rgba()[(15 * 16 + 15) * 4 + 3], 255);
}

#[test]
fn test_convert_infeasible_layout() {
    let ws = Workspace::new();
    let three = [colors::BLACK, colors::RED, colors::GREEN];
    let input = ws.write_rgb_png("in.png", 16, 16, |x, y| three[((x + y) % 3) as usize]);
    let output = ws.path("out.png");

    let options = QuantizeOptions::new(1, 2)
        .start_colors(3)
        .max_colors(6)
        .color_limit_per_tile(3);
    let err = ConversionService::new(options, ConversionMode::Search)
        .convert_file(&input, &output)
        .unwrap_err();

    match err {
        AppError::Quantize(QuantizeError::Infeasible { budgets, .. }) => {
            assert_eq!(budgets, vec![3, 6]);
        }
        other => panic!("Expected Infeasible, got {other:?}"),
    }
    assert!(!output.exists(), "No output should be written on failure");
}

#[test]
fn test_convert_cancelled_by_attempt_limit() {
    let ws = Workspace::new();
    let three = [colors::BLACK, colors::RED, colors::GREEN];
    let input = ws.write_rgb_png("in.png", 16, 16, |x, y| three[((x + y) % 3) as usize]);

    let options = QuantizeOptions::new(1, 2)
        .start_colors(3)
        .max_colors(6)
        .color_limit_per_tile(3)
        .stop(StopCondition::new().max_attempts(1));
    let err = ConversionService::new(options, ConversionMode::Search)
        .convert_file(&input, &ws.path("out.png"))
        .unwrap_err();

    assert!(
        matches!(err, AppError::Quantize(QuantizeError::Cancelled { attempts: 1, .. })),
        "Expected Cancelled, got {err:?}"
    );
}

#[test]
fn test_convert_report_json() {
    let ws = Workspace::new();
    let input = ws.write_rgb_png("in.png", 16, 16, fixtures::four_colors);
    let output = ws.path("out.png");
    let report_path = ws.path("report.json");

    let report = ConversionService::new(QuantizeOptions::new(1, 4), ConversionMode::Search)
        .convert_file(&input, &output)
        .unwrap();
    report.write_json(&report_path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(json["mode"], "search");
    assert_eq!(json["color_budget"], 4);
    assert_eq!(json["attempts"], 1);
    assert_eq!(json["tile_palettes"], serde_json::json!([0, 0, 0, 0]));

    let mut palette: Vec<String> = json["palettes"][0]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    palette.sort();
    assert_eq!(palette, vec!["#000000", "#0000ff", "#00ff00", "#ff0000"]);
}

#[test]
fn test_convert_optimize_preserves_pixels() {
    let ws = Workspace::new();
    let input = ws.write_rgb_png("in.png", 32, 32, fixtures::gradient);
    let plain = ws.path("plain.png");
    let optimized = ws.path("optimized.png");

    let options = QuantizeOptions::new(4, 16).transparent_color(Rgb::new(0, 0, 0));
    ConversionService::new(options.clone(), ConversionMode::Search)
        .convert_file(&input, &plain)
        .unwrap();
    ConversionService::new(options, ConversionMode::Search)
        .optimize(true)
        .convert_file(&input, &optimized)
        .unwrap();

    let a = read_indexed_png(&plain);
    let b = read_indexed_png(&optimized);
    assert_eq!(a.palette, b.palette);
    assert_eq!(a.indices, b.indices);
    assert_eq!(a.trns, b.trns);
}
