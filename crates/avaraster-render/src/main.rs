//! avaraster CLI
//!
//! Renders avalanche danger overlays from bulletin and region documents.

use avaraster_bulletin::{
    BulletinCollection, CustomModeParams, GenerationRule, RegionCollection, RuleCompiler, VisualizationMode,
};
use avaraster_common::{Aspect, Bounds, GeoPoint};
use avaraster_dem::{HttpTileSource, SyntheticTerrain, TerrainRgbProvider};
use avaraster_render::{
    cap_render_bounds, measure_point, point_info, AppConfig, RasterGenerator, RenderError, RenderSession, Result,
    ACCESS_TOKEN_ENV,
};
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "avaraster")]
#[command(about = "Render avalanche danger overlays over terrain", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render an overlay PNG and its corner sidecar
    Render(RenderArgs),
    /// Print the compiled generation rules as JSON
    Rules(RulesArgs),
    /// Print elevation, slope and aspect at a point
    Point(PointArgs),
}

#[derive(Args, Debug)]
struct RuleInput {
    /// Bulletin JSON document
    #[arg(long, required_unless_present_any = ["rules", "mode"])]
    bulletins: Option<PathBuf>,

    /// Region FeatureCollection JSON document
    #[arg(long, requires = "bulletins")]
    regions: Option<PathBuf>,

    /// Previously compiled rules (output of `avaraster rules`)
    #[arg(long, conflicts_with_all = ["bulletins", "regions", "mode"])]
    rules: Option<PathBuf>,

    /// Visualization mode
    #[arg(long)]
    mode: Option<VisualizationMode>,

    #[command(flatten)]
    custom: CustomArgs,
}

/// Overrides for custom-mode parameters.
#[derive(Args, Debug, Clone, Default)]
struct CustomArgs {
    /// Custom mode: lower elevation in meters
    #[arg(long)]
    min_elevation: Option<f64>,

    /// Custom mode: upper elevation in meters
    #[arg(long)]
    max_elevation: Option<f64>,

    /// Custom mode: minimum slope in degrees
    #[arg(long)]
    min_slope: Option<f64>,

    /// Custom mode: aspects to show, e.g. N,NE,NW
    #[arg(long, value_delimiter = ',')]
    aspects: Vec<Aspect>,
}

impl CustomArgs {
    fn apply(&self, mut params: CustomModeParams) -> CustomModeParams {
        if let Some(min_elevation) = self.min_elevation {
            params.min_elevation = min_elevation;
        }
        if let Some(max_elevation) = self.max_elevation {
            params.max_elevation = max_elevation;
        }
        if let Some(min_slope) = self.min_slope {
            params.min_slope = min_slope;
        }
        if !self.aspects.is_empty() {
            params.aspects = Some(self.aspects.iter().copied().collect::<BTreeSet<_>>());
        }
        params
    }
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    input: RuleInput,

    /// Viewport as minLng,minLat,maxLng,maxLat
    #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
    bbox: Bounds,

    /// Map zoom level
    #[arg(long)]
    zoom: f64,

    /// Camera pitch in degrees
    #[arg(long, default_value_t = 0.0)]
    pitch: f64,

    /// Camera center as lng,lat (defaults to the viewport center)
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    center: Option<GeoPoint>,

    /// Output PNG path; the sidecar is written to <output>.json
    #[arg(short, long)]
    output: PathBuf,

    /// Use the built-in synthetic terrain instead of downloading tiles
    #[arg(long)]
    synthetic: bool,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 120)]
    timeout_secs: u64,
}

#[derive(Args, Debug)]
struct RulesArgs {
    #[command(flatten)]
    input: RuleInput,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PointArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    /// Map zoom level
    #[arg(long, default_value_t = 14.0)]
    zoom: f64,

    /// Use the built-in synthetic terrain instead of downloading tiles
    #[arg(long)]
    synthetic: bool,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

fn parse_numbers<const N: usize>(value: &str) -> std::result::Result<[f64; N], String> {
    let numbers = value
        .split(',')
        .map(|part| part.trim().parse::<f64>().map_err(|e| format!("'{part}': {e}")))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    numbers
        .try_into()
        .map_err(|numbers: Vec<f64>| format!("expected {N} comma-separated numbers, got {}", numbers.len()))
}

fn parse_bbox(value: &str) -> std::result::Result<Bounds, String> {
    let [min_lng, min_lat, max_lng, max_lat] = parse_numbers::<4>(value)?;
    let bounds = Bounds::new(min_lng, max_lng, min_lat, max_lat);
    if !bounds.is_valid() {
        return Err("bbox must have minLng < maxLng and minLat < maxLat".to_string());
    }
    Ok(bounds)
}

fn parse_point(value: &str) -> std::result::Result<GeoPoint, String> {
    let [lng, lat] = parse_numbers::<2>(value)?;
    Ok(GeoPoint::new(lng, lat))
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::default(),
    };
    Ok(config.with_env_token())
}

fn load_rules(input: &RuleInput, config: &AppConfig) -> Result<Vec<GenerationRule>> {
    if let Some(path) = &input.rules {
        let json = std::fs::read_to_string(path)?;
        return Ok(serde_json::from_str(&json)?);
    }

    let mode = input.mode.unwrap_or_default();
    let bulletins = match &input.bulletins {
        Some(path) => BulletinCollection::from_path(path)?,
        None => BulletinCollection::default(),
    };
    let regions = match &input.regions {
        Some(path) => RegionCollection::from_path(path)?,
        None => RegionCollection::default(),
    };
    if mode != VisualizationMode::Custom && input.regions.is_none() {
        return Err(RenderError::InvalidArgument(format!("--regions is required in {mode} mode")));
    }

    let custom = input.custom.apply(config.custom.clone());
    Ok(RuleCompiler::new(&config.avalanche).compile(mode, &bulletins.bulletins, &regions, &custom))
}

fn tile_provider(config: &AppConfig) -> Result<TerrainRgbProvider<HttpTileSource>> {
    if config.tiles.access_token.is_none() {
        warn!("No tile access token configured; set {ACCESS_TOKEN_ENV} or tiles.access_token");
    }
    let source = HttpTileSource::new(&config.tiles)?;
    Ok(TerrainRgbProvider::new(source, &config.tiles)?)
}

fn run_render(args: RenderArgs, config: AppConfig) -> Result<()> {
    let rules = load_rules(&args.input, &config)?;
    let center = args.center.unwrap_or_else(|| args.bbox.center());
    let viewport = cap_render_bounds(&args.bbox, center, args.pitch, &config.raster);
    info!(rules = rules.len(), ?viewport, zoom = args.zoom, "Rendering");

    let overlay = if args.synthetic {
        RasterGenerator::new(&config.raster, &config.avalanche).draw(&rules, &viewport, &SyntheticTerrain::default())
    } else {
        let provider = Arc::new(tile_provider(&config)?);
        let mut session = RenderSession::new(provider, config.raster, config.avalanche.clone());
        let generation = session.request(viewport, args.zoom, rules.into())?;
        let outcome = session.wait_latest(Duration::from_secs(args.timeout_secs));
        session.shutdown();

        match outcome {
            Some(outcome) => outcome.overlay,
            None => {
                return Err(RenderError::Timeout {
                    generation,
                    seconds: args.timeout_secs,
                })
            }
        }
    };

    match overlay {
        Some(overlay) => {
            let sidecar = overlay.write_with_sidecar(&args.output, config.raster.overlay_opacity)?;
            println!(
                "Wrote {}x{} overlay to {} ({} painted pixels)",
                overlay.width(),
                overlay.height(),
                args.output.display(),
                overlay.painted_pixels()
            );
            println!("Corners: {}", sidecar.display());
        }
        None => println!("nothing to draw"),
    }
    Ok(())
}

fn run_rules(args: RulesArgs, config: AppConfig) -> Result<()> {
    let rules = load_rules(&args.input, &config)?;
    let json = serde_json::to_string_pretty(&rules)?;
    match args.output {
        Some(path) => {
            std::fs::write(&path, json)?;
            println!("Wrote {} rules to {}", rules.len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_point(args: PointArgs, config: AppConfig) -> Result<()> {
    let point = GeoPoint::new(args.lon, args.lat);
    let info = if args.synthetic {
        measure_point(&SyntheticTerrain::default(), point)
    } else {
        point_info(&tile_provider(&config)?, point, args.zoom)
    };

    match (info, args.json) {
        (Some(info), true) => println!("{}", serde_json::to_string_pretty(&info)?),
        (Some(info), false) => {
            println!("Location: {}, {}", args.lat, args.lon);
            println!("Elevation: {:.1} m", info.elevation);
            println!("Slope: {:.1}°", info.slope_deg);
            println!("Aspect: {} ({:.0}°)", info.aspect, info.bearing_deg);
        }
        (None, _) => println!("No elevation data at {}, {}", args.lat, args.lon),
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    avaraster_metrics::describe_metrics();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Command::Render(args) => run_render(args, config),
        Command::Rules(args) => run_rules(args, config),
        Command::Point(args) => run_point(args, config),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
