//! Example: Query elevation, slope and aspect from terrain-RGB tiles.
//!
//! Usage: MAPBOX_ACCESS_TOKEN=pk... cargo run --example query_elevation -- <lat> <lon> [zoom]

use avaraster_common::{Bounds, GeoPoint};
use avaraster_dem::{calculate_terrain_metrics, HttpTileSource, TerrainRgbProvider, TileSourceConfig};
use std::env;
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <lat> <lon> [zoom]", args[0]);
        eprintln!("Example: {} 47.26 11.77 14", args[0]);
        std::process::exit(1);
    }

    let lat: f64 = args[1].parse()?;
    let lon: f64 = args[2].parse()?;
    let zoom: f64 = args.get(3).map(|s| s.parse()).transpose()?.unwrap_or(14.0);

    let config = TileSourceConfig {
        access_token: env::var("MAPBOX_ACCESS_TOKEN").ok(),
        ..TileSourceConfig::default()
    };
    let provider = TerrainRgbProvider::new(HttpTileSource::new(&config)?, &config)?;
    let point = GeoPoint::new(lon, lat);

    let start = Instant::now();
    let summary = provider.prepare(&Bounds::around(point, 0.001), zoom);
    println!(
        "Prepared {} tile(s) at zoom {} in {:.2}s ({} failed)",
        summary.requested,
        summary.zoom,
        start.elapsed().as_secs_f64(),
        summary.failed
    );

    match provider.get_elevation(point) {
        Some(elevation) => println!("Elevation: {:.1} meters", elevation),
        None => {
            eprintln!("No elevation data at ({}, {})", lat, lon);
            std::process::exit(1);
        }
    }

    if let Some(sample) = calculate_terrain_metrics(point, |p| provider.get_elevation(p)) {
        println!("Slope: {:.1}°  Aspect: {} ({:.0}°)", sample.slope_deg, sample.aspect, sample.bearing_deg);
    }

    Ok(())
}
