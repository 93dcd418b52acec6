use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tilequant::assets::{AssetLoader, CONFIG_ENV};
use tilequant::models::{AppConfig, DitherSetting, Preset, SearchDirection};
use tilequant::services::{ConversionMode, ConversionService};

#[derive(Parser)]
#[command(name = "tilequant", version)]
#[command(about = "Convert images into tiled, multi-palette indexed PNGs")]
struct Cli {
    /// Log filter, e.g. "debug" or "tilequant_core=trace" (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Presets file (overrides TILEQUANT_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for a color budget at which the image fits the palettes
    Convert {
        /// Input PNG
        input: PathBuf,

        /// Output indexed PNG
        output: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,

        #[command(flatten)]
        search: SearchArgs,

        #[command(flatten)]
        output_opts: OutputArgs,
    },
    /// Extract palettes from an image that already fits, without reducing colors
    Simple {
        /// Input PNG
        input: PathBuf,

        /// Output indexed PNG
        output: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,

        #[command(flatten)]
        output_opts: OutputArgs,
    },
    /// List the presets of the active configuration
    Presets,
}

/// Tile geometry, palette layout and transparency
#[derive(Args)]
struct LayoutArgs {
    /// Named preset from the configuration
    #[arg(long)]
    preset: Option<String>,

    /// Tile width in pixels
    #[arg(short = 'w', long)]
    tile_width: Option<usize>,

    /// Tile height in pixels
    #[arg(short = 'H', long)]
    tile_height: Option<usize>,

    /// Number of palettes
    #[arg(short = 'n', long)]
    num_palettes: Option<usize>,

    /// Entries per palette, including the transparent slot
    #[arg(short = 'c', long)]
    colors_per_palette: Option<usize>,

    /// Treat this color as transparent (e.g. "#ff00ff")
    #[arg(short = 't', long, conflicts_with = "no_transparency")]
    transparent_color: Option<String>,

    /// Do not reserve a transparent slot
    #[arg(long)]
    no_transparency: bool,
}

/// Color budget search
#[derive(Args)]
struct SearchArgs {
    /// Highest total color budget to try
    #[arg(short = 'C', long)]
    max_colors: Option<usize>,

    /// Lowest total color budget to try
    #[arg(long)]
    start_colors: Option<usize>,

    /// Step between budgets
    #[arg(short = 's', long)]
    color_steps: Option<usize>,

    /// Search direction
    #[arg(short = 'd', long, value_enum)]
    direction: Option<SearchDirection>,

    /// Dithering used by color reduction
    #[arg(short = 'D', long, value_enum)]
    dither: Option<DitherSetting>,

    /// Maximum colors per tile before the search starts
    #[arg(short = 'l', long)]
    color_limit_per_tile: Option<usize>,

    /// Only limit colors per tile, not per group of tiles
    #[arg(long)]
    no_mosaic_limiting: bool,

    /// Budgets evaluated in parallel
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Give up after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Give up after this many attempts
    #[arg(long)]
    max_attempts: Option<usize>,
}

/// Output file handling
#[derive(Args)]
struct OutputArgs {
    /// Recompress the PNG with oxipng
    #[arg(long)]
    optimize: bool,

    /// Write a JSON summary (budget, attempts, palettes) to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

impl LayoutArgs {
    fn overrides(&self) -> Preset {
        Preset {
            tile_width: self.tile_width,
            tile_height: self.tile_height,
            num_palettes: self.num_palettes,
            colors_per_palette: self.colors_per_palette,
            transparency: if self.no_transparency {
                Some(false)
            } else if self.transparent_color.is_some() {
                Some(true)
            } else {
                None
            },
            transparent_color: self.transparent_color.clone(),
            ..Default::default()
        }
    }
}

impl SearchArgs {
    fn overrides(&self) -> Preset {
        Preset {
            max_colors: self.max_colors,
            start_colors: self.start_colors,
            color_steps: self.color_steps,
            direction: self.direction,
            dither: self.dither,
            color_limit_per_tile: self.color_limit_per_tile,
            mosaic_limiting: self.no_mosaic_limiting.then_some(false),
            parallelism: self.jobs,
            timeout_secs: self.timeout,
            max_attempts: self.max_attempts,
            ..Default::default()
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let loader = AssetLoader::from_env(cli.config.clone());

    match cli.command {
        Some(Commands::Convert {
            input,
            output,
            layout,
            search,
            output_opts,
        }) => {
            let overrides = layout.overrides().merged(&search.overrides());
            run_conversion(
                &loader,
                ConversionMode::Search,
                layout.preset.as_deref(),
                &overrides,
                &input,
                &output,
                &output_opts,
            )
        }
        Some(Commands::Simple {
            input,
            output,
            layout,
            output_opts,
        }) => run_conversion(
            &loader,
            ConversionMode::Simple,
            layout.preset.as_deref(),
            &layout.overrides(),
            &input,
            &output,
            &output_opts,
        ),
        Some(Commands::Presets) => {
            run_presets_command(&loader);
            Ok(())
        }
        None => {
            run_status_command(&loader);
            Ok(())
        }
    }
}

/// Install the tracing subscriber
///
/// `--log-level` wins over `RUST_LOG`; without either, the crates log at info.
fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "tilequant=info,tilequant_core=info".into()),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Convert one PNG with preset + flag parameters
fn run_conversion(
    loader: &AssetLoader,
    mode: ConversionMode,
    preset_name: Option<&str>,
    overrides: &Preset,
    input: &Path,
    output: &Path,
    output_opts: &OutputArgs,
) -> anyhow::Result<()> {
    let config = AppConfig::load_from_assets(loader);
    let preset = config.preset(preset_name)?.merged(overrides);
    let options = preset.to_options()?;

    let service = ConversionService::new(options, mode).optimize(output_opts.optimize);
    let report = service
        .convert_file(input, output)
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    if let Some(ref path) = output_opts.report {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
    }

    println!(
        "Wrote {} ({}x{}, {} colors, {} palettes, {} attempts, {} bytes)",
        output.display(),
        report.width,
        report.height,
        report.color_budget,
        report.num_palettes,
        report.attempts,
        report.png_bytes
    );
    Ok(())
}

/// List presets of the active configuration
fn run_presets_command(loader: &AssetLoader) {
    let config = AppConfig::load_from_assets(loader);

    println!("Presets ({}):\n", loader.config_source());
    if config.presets.is_empty() {
        println!("  (none)");
        return;
    }
    for (name, preset) in &config.presets {
        let marker = if config.default_preset.as_deref() == Some(name.as_str()) {
            " (default)"
        } else {
            ""
        };
        println!("  {name}{marker}");
        if let Some(ref description) = preset.description {
            println!("      {description}");
        }
    }
}

/// Display status and configuration information
fn run_status_command(loader: &AssetLoader) {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    println!("tilequant v{VERSION}");
    println!("Tiled multi-palette PNG converter\n");

    println!("Environment Variables:");
    println!(
        "  {CONFIG_ENV} = {}",
        std::env::var(CONFIG_ENV)
            .ok()
            .unwrap_or_else(|| "(not set)".to_string())
    );

    println!("\nConfig:  {}", loader.config_source());

    println!("\nCommands:");
    println!("  tilequant convert   Search for a color budget and write an indexed PNG");
    println!("  tilequant simple    Convert an image that already fits, without reducing colors");
    println!("  tilequant presets   List available presets");
    println!("\nRun 'tilequant --help' for more details.");
}
