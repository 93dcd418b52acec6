pub mod config;

pub use config::{AppConfig, DitherSetting, Preset, SearchDirection};
