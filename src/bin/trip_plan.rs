use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trip_planner::config::PlannerConfig;
use trip_planner::geometry::stroke_widths;
use trip_planner::navigation::directions_url;
use trip_planner::routes::RoutesClient;
use trip_planner::traits::FixedLocation;
use trip_planner::{Coordinate, TravelMode, TripCoordinator, TripState, Waypoint};

#[derive(Parser, Debug)]
#[command(author, version, about = "Plan a trip through the routing service", long_about = None)]
struct Args {
    /// Starting point as "lat,lng"
    #[arg(long, value_parser = parse_coordinate)]
    origin: Coordinate,

    /// Final destination as "lat,lng"
    #[arg(long, value_parser = parse_coordinate)]
    destination: Coordinate,

    /// Intermediate stop as "lat,lng" (repeatable)
    #[arg(long = "stop", value_parser = parse_coordinate)]
    stops: Vec<Coordinate>,

    #[arg(long, value_enum, default_value_t = Mode::Driving)]
    mode: Mode,

    /// Height in pixels of UI covering the bottom of the map
    #[arg(long, default_value_t = 0.0)]
    bottom_inset: f64,

    /// Map height in pixels
    #[arg(long, default_value_t = 800.0)]
    screen_height: f64,

    /// How long to wait for the routing service
    #[arg(long, default_value_t = 15)]
    wait_secs: u64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Walking,
    Driving,
}

impl From<Mode> for TravelMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Walking => TravelMode::Walking,
            Mode::Driving => TravelMode::Driving,
        }
    }
}

fn parse_coordinate(raw: &str) -> Result<Coordinate, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lng\", got {:?}", raw))?;
    let lat: f64 = lat.trim().parse().map_err(|_| format!("bad latitude {:?}", lat))?;
    let lng: f64 = lng.trim().parse().map_err(|_| format!("bad longitude {:?}", lng))?;
    let coordinate = Coordinate::new(lat, lng);
    if !coordinate.is_valid() {
        return Err(format!("{} is out of range", raw));
    }
    Ok(coordinate)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trip_planner=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = PlannerConfig::from_env();
    if config.routes.api_key.is_empty() {
        tracing::warn!("ROUTES_API_KEY is not set, the routing service will likely refuse the request");
    }

    let client = RoutesClient::new(config.routes.clone()).context("building routing client")?;
    let coordinator = TripCoordinator::spawn(client, FixedLocation(args.origin), config.coordinator);

    coordinator.set_origin_from_device().await?;
    coordinator.set_mode(args.mode.into()).await?;
    for (index, stop) in args.stops.iter().enumerate() {
        coordinator
            .add_stop(Waypoint::new(format!("stop-{}", index + 1), *stop))
            .await?;
    }
    coordinator
        .set_destination(Waypoint::new("destination", args.destination).with_label("Destination"))
        .await?;

    let mut updates = coordinator.subscribe();
    let routed = tokio::time::timeout(
        Duration::from_secs(args.wait_secs),
        updates.wait_for(|trip| trip.path.is_some()),
    )
    .await;
    let trip = match routed {
        Ok(Ok(trip)) => trip.clone(),
        Ok(Err(_)) => anyhow::bail!("trip coordinator stopped before a route arrived"),
        Err(_) => anyhow::bail!(
            "no route after {}s (run with RUST_LOG=trip_planner=debug for details)",
            args.wait_secs
        ),
    };
    coordinator.shutdown().await;

    print_trip(&trip, args.bottom_inset, args.screen_height);
    Ok(())
}

fn print_trip(trip: &TripState, bottom_inset: f64, screen_height: f64) {
    println!(
        "Distance: {}",
        trip.distance_text.as_deref().unwrap_or("unknown")
    );
    println!(
        "Duration: {}",
        trip.duration_text.as_deref().unwrap_or("unknown")
    );
    println!(
        "Path: {} points",
        trip.path.as_ref().map_or(0, |path| path.len())
    );

    if !trip.stops.is_empty() {
        let optimized = if trip.optimized_order.is_some() { "optimized" } else { "as entered" };
        println!("Stops ({}):", optimized);
        for (position, stop) in trip.ordered_stops().iter().enumerate() {
            println!(
                "  {}. {} ({:.5}, {:.5})",
                position + 1,
                stop.id,
                stop.coordinate.latitude,
                stop.coordinate.longitude
            );
        }
    }

    let region = trip.viewport(bottom_inset, screen_height);
    match region {
        Some(region) => println!(
            "Viewport: center ({:.5}, {:.5}) span {:.4} x {:.4}",
            region.center.latitude,
            region.center.longitude,
            region.latitude_delta,
            region.longitude_delta
        ),
        None => println!("Viewport: nothing to frame"),
    }

    let widths = stroke_widths(region.map(|region| region.latitude_delta));
    println!(
        "Stroke widths: inner {} / mid {} / outer {}",
        widths.inner, widths.mid, widths.outer
    );

    if let Some(url) = directions_url(trip) {
        println!("Navigate: {}", url);
    }
}
