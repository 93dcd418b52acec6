//! tilequant - tiled multi-palette PNG conversion
//!
//! Command-line front end for `tilequant-core`: PNG decoding and indexed
//! encoding, YAML presets, and the conversion service behind the
//! `tilequant` binary. This library exposes modules for integration testing.

pub mod assets;
pub mod codec;
pub mod error;
pub mod models;
pub mod services;
