use crate::assets::AssetLoader;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tilequant_core::{Direction, DitherMode, QuantizeOptions, Rgb, StopCondition, Transparency};

/// Palettes used when neither preset nor CLI say otherwise.
const DEFAULT_NUM_PALETTES: usize = 16;
/// Colors per palette used when neither preset nor CLI say otherwise.
const DEFAULT_COLORS_PER_PALETTE: usize = 16;
const DEFAULT_TILE_SIZE: usize = 8;
const DEFAULT_COLOR_STEPS: usize = 4;

/// Application configuration loaded from tilequant.yaml
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// Named parameter sets
    #[serde(default)]
    pub presets: BTreeMap<String, Preset>,

    /// Preset applied when none is named on the command line
    #[serde(default)]
    pub default_preset: Option<String>,
}

/// Search direction as written in presets and on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SearchDirection {
    /// Fewest colors first
    Up,
    /// Most colors first
    Down,
}

impl From<SearchDirection> for Direction {
    fn from(d: SearchDirection) -> Self {
        match d {
            SearchDirection::Up => Direction::Ascending,
            SearchDirection::Down => Direction::Descending,
        }
    }
}

/// Dithering as written in presets and on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DitherSetting {
    None,
    FloydSteinberg,
}

impl From<DitherSetting> for DitherMode {
    fn from(d: DitherSetting) -> Self {
        match d {
            DitherSetting::None => DitherMode::None,
            DitherSetting::FloydSteinberg => DitherMode::FloydSteinberg,
        }
    }
}

/// A named set of quantization parameters
///
/// Every field is optional. Unset fields take the built-in defaults, and
/// command-line flags override fields one by one via [`Preset::merged`].
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Preset {
    /// Shown by `tilequant presets`
    pub description: Option<String>,
    pub tile_width: Option<usize>,
    pub tile_height: Option<usize>,
    pub num_palettes: Option<usize>,
    pub colors_per_palette: Option<usize>,
    /// Reserve palette slot 0 for transparent pixels
    pub transparency: Option<bool>,
    /// Hex color treated as transparent, e.g. "#ff00ff"
    pub transparent_color: Option<String>,
    pub color_limit_per_tile: Option<usize>,
    pub mosaic_limiting: Option<bool>,
    pub start_colors: Option<usize>,
    pub max_colors: Option<usize>,
    pub color_steps: Option<usize>,
    pub direction: Option<SearchDirection>,
    pub dither: Option<DitherSetting>,
    /// Budgets evaluated at once
    pub parallelism: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub max_attempts: Option<usize>,
}

impl AppConfig {
    /// Load configuration from AssetLoader (external or embedded)
    ///
    /// An external file that cannot be read or parsed is reported and the
    /// embedded presets are used instead.
    pub fn load_from_assets(loader: &AssetLoader) -> Self {
        let parsed = loader
            .read_config_string()
            .map_err(AppError::from)
            .and_then(|content| Self::parse(&content));
        match parsed {
            Ok(config) => {
                tracing::info!(
                    presets = config.presets.len(),
                    source = %loader.config_source(),
                    "Loaded configuration"
                );
                config
            }
            Err(e) => {
                tracing::warn!(%e, "Failed to load config, using embedded presets");
                Self::embedded()
            }
        }
    }

    /// The embedded presets, or an empty configuration if they are unusable
    pub fn embedded() -> Self {
        match AssetLoader::read_embedded_config_string()
            .map_err(AppError::from)
            .and_then(|content| Self::parse(&content))
        {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(%e, "Failed to load embedded presets, using defaults");
                Self::default()
            }
        }
    }

    /// Parse a presets file
    pub fn parse(yaml: &str) -> Result<Self, AppError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| AppError::Config(e.to_string()))?;
        if let Some(ref name) = config.default_preset {
            if !config.presets.contains_key(name) {
                return Err(AppError::Config(format!(
                    "default_preset {name:?} is not defined"
                )));
            }
        }
        Ok(config)
    }

    /// Resolve a preset by name, or the default preset when `name` is `None`
    ///
    /// Without a name and without a default preset, an empty preset is
    /// returned so that built-in defaults apply.
    pub fn preset(&self, name: Option<&str>) -> Result<Preset, AppError> {
        match name.or(self.default_preset.as_deref()) {
            Some(name) => self
                .presets
                .get(name)
                .cloned()
                .ok_or_else(|| AppError::UnknownPreset(name.to_string())),
            None => Ok(Preset::default()),
        }
    }
}

impl Preset {
    /// This preset with every field set in `overrides` replaced
    pub fn merged(&self, overrides: &Preset) -> Preset {
        Preset {
            description: overrides
                .description
                .clone()
                .or_else(|| self.description.clone()),
            tile_width: overrides.tile_width.or(self.tile_width),
            tile_height: overrides.tile_height.or(self.tile_height),
            num_palettes: overrides.num_palettes.or(self.num_palettes),
            colors_per_palette: overrides.colors_per_palette.or(self.colors_per_palette),
            transparency: overrides.transparency.or(self.transparency),
            transparent_color: overrides
                .transparent_color
                .clone()
                .or_else(|| self.transparent_color.clone()),
            color_limit_per_tile: overrides.color_limit_per_tile.or(self.color_limit_per_tile),
            mosaic_limiting: overrides.mosaic_limiting.or(self.mosaic_limiting),
            start_colors: overrides.start_colors.or(self.start_colors),
            max_colors: overrides.max_colors.or(self.max_colors),
            color_steps: overrides.color_steps.or(self.color_steps),
            direction: overrides.direction.or(self.direction),
            dither: overrides.dither.or(self.dither),
            parallelism: overrides.parallelism.or(self.parallelism),
            timeout_secs: overrides.timeout_secs.or(self.timeout_secs),
            max_attempts: overrides.max_attempts.or(self.max_attempts),
        }
    }

    /// Transparency policy described by the flag and the color
    ///
    /// An explicit `transparency: false` wins over a color. A color alone
    /// enables transparency; the flag alone uses the source alpha channel.
    pub fn transparency_policy(&self) -> Result<Transparency, AppError> {
        match (self.transparency, self.transparent_color.as_deref()) {
            (Some(false), _) => Ok(Transparency::Disabled),
            (_, Some(hex)) => hex
                .parse::<Rgb>()
                .map(Transparency::Color)
                .map_err(|e| AppError::Config(format!("invalid transparent color {hex:?}: {e}"))),
            (Some(true), None) => Ok(Transparency::FromSource),
            (None, None) => Ok(Transparency::Disabled),
        }
    }

    /// Build core options, filling unset fields with defaults
    pub fn to_options(&self) -> Result<QuantizeOptions, AppError> {
        let mut options = QuantizeOptions::new(
            self.num_palettes.unwrap_or(DEFAULT_NUM_PALETTES),
            self.colors_per_palette.unwrap_or(DEFAULT_COLORS_PER_PALETTE),
        )
        .tile_size(
            self.tile_width.unwrap_or(DEFAULT_TILE_SIZE),
            self.tile_height.unwrap_or(DEFAULT_TILE_SIZE),
        )
        .transparency(self.transparency_policy()?)
        .mosaic_limiting(self.mosaic_limiting.unwrap_or(true))
        .color_steps(self.color_steps.unwrap_or(DEFAULT_COLOR_STEPS))
        .direction(self.direction.unwrap_or(SearchDirection::Up).into())
        .dither(self.dither.unwrap_or(DitherSetting::None).into())
        .parallelism(self.parallelism.unwrap_or(1));

        if let Some(limit) = self.color_limit_per_tile {
            options = options.color_limit_per_tile(limit);
        }
        if let Some(start) = self.start_colors {
            options = options.start_colors(start);
        }
        if let Some(max) = self.max_colors {
            options = options.max_colors(max);
        }

        let mut stop = StopCondition::new();
        if let Some(secs) = self.timeout_secs {
            stop = stop.deadline(Duration::from_secs(secs));
        }
        if let Some(max) = self.max_attempts {
            stop = stop.max_attempts(max);
        }
        Ok(options.stop(stop))
    }
}
