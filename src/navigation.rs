//! Handoff to an external turn-by-turn navigation app.

use reqwest::Url;

use crate::model::{Coordinate, TravelMode, TripState};

const DIRECTIONS_URL: &str = "https://www.google.com/maps/dir/";

/// Cross-platform directions link for the trip, with stops in display order.
///
/// `None` without a destination. Without an origin the navigation app
/// starts from the device's own position.
pub fn directions_url(trip: &TripState) -> Option<Url> {
    let destination = trip.destination.as_ref()?;

    let mut params: Vec<(&str, String)> = vec![("api", "1".to_string())];
    if let Some(origin) = trip.origin {
        params.push(("origin", format_point(origin)));
    }
    params.push(("destination", format_point(destination.coordinate)));

    let waypoints = trip
        .ordered_stops()
        .iter()
        .map(|stop| format_point(stop.coordinate))
        .collect::<Vec<_>>()
        .join("|");
    if !waypoints.is_empty() {
        params.push(("waypoints", waypoints));
    }
    params.push(("travelmode", travel_mode_param(trip.mode).to_string()));

    Url::parse_with_params(DIRECTIONS_URL, &params).ok()
}

fn format_point(point: Coordinate) -> String {
    format!("{:.6},{:.6}", point.latitude, point.longitude)
}

fn travel_mode_param(mode: TravelMode) -> &'static str {
    match mode {
        TravelMode::Walking => "walking",
        TravelMode::Driving => "driving",
    }
}
