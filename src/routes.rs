//! Routes HTTP adapter: one compute-routes round trip per query.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RoutingError;
use crate::model::{validate_order, Coordinate, RouteQuery, RouteResult, TravelMode};
use crate::polyline::Polyline;
use crate::traits::RouteProvider;

pub const DEFAULT_BASE_URL: &str = "https://routes.googleapis.com/directions/v2:computeRoutes";

const API_KEY_HEADER: &str = "X-Goog-Api-Key";
const FIELD_MASK_HEADER: &str = "X-Goog-FieldMask";
const FIELD_MASK: &str = "routes.distanceMeters,routes.duration,routes.polyline.encodedPolyline,routes.optimizedIntermediateWaypointIndex";

#[derive(Debug, Clone)]
pub struct RoutesConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoutesClient {
    config: RoutesConfig,
    client: reqwest::Client,
}

impl RoutesClient {
    pub fn new(config: RoutesConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

impl RouteProvider for RoutesClient {
    async fn compute_route(&self, query: &RouteQuery) -> Result<RouteResult, RoutingError> {
        tracing::trace!(stops = query.stops.len(), mode = ?query.mode, "requesting route");

        let response = self
            .client
            .post(&self.config.base_url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .header(FIELD_MASK_HEADER, FIELD_MASK)
            .json(&ComputeRoutesRequest::from_query(query))
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let body = response.text().await.map_err(classify)?;
        if !status.is_success() {
            return Err(RoutingError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: ComputeRoutesResponse =
            serde_json::from_str(&body).map_err(|err| RoutingError::Payload(err.to_string()))?;
        normalize(payload, query.stops.len())
    }
}

fn classify(err: reqwest::Error) -> RoutingError {
    if err.is_timeout() {
        RoutingError::Timeout
    } else {
        RoutingError::Http(err)
    }
}

/// Turns the first returned route into a [`RouteResult`] for a query with
/// `stop_count` intermediates.
fn normalize(payload: ComputeRoutesResponse, stop_count: usize) -> Result<RouteResult, RoutingError> {
    let route = payload.routes.into_iter().next().ok_or(RoutingError::NoRoute)?;

    let encoded = route
        .polyline
        .and_then(|polyline| polyline.encoded_polyline)
        .ok_or_else(|| RoutingError::Payload("route has no encoded polyline".to_string()))?;

    let duration_seconds = route.duration.as_deref().map(parse_duration).transpose()?;

    let optimized_order = match route.optimized_intermediate_waypoint_index {
        Some(raw) if stop_count > 0 => optimized_order(&raw, stop_count),
        _ => None,
    };

    Ok(RouteResult {
        path: Polyline::decode(&encoded),
        optimized_order,
        distance_meters: route.distance_meters,
        duration_seconds,
        distance_text: route.distance_meters.map(format_distance),
        duration_text: duration_seconds.map(format_duration),
    })
}

/// The service's visiting order, or `None` if it does not permute the stops.
fn optimized_order(raw: &[i64], stop_count: usize) -> Option<Vec<usize>> {
    let order: Option<Vec<usize>> = raw.iter().map(|&i| usize::try_from(i).ok()).collect();
    let order = order?;
    match validate_order(&order, stop_count) {
        Ok(()) => Some(order),
        Err(err) => {
            tracing::warn!("routing service returned unusable order {:?}: {}", raw, err);
            None
        }
    }
}

/// Parses a protobuf-style duration such as `"734s"` or `"12.5s"`.
fn parse_duration(raw: &str) -> Result<f64, RoutingError> {
    raw.strip_suffix('s')
        .and_then(|secs| secs.parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .ok_or_else(|| RoutingError::Payload(format!("bad duration {:?}", raw)))
}

/// Human-facing duration: `"1 h 5 min"` from an hour up, `"12 min"` below.
pub fn format_duration(seconds: f64) -> String {
    let minutes = (seconds / 60.0).round() as u64;
    if minutes < 60 {
        return format!("{} min", minutes);
    }
    match (minutes / 60, minutes % 60) {
        (hours, 0) => format!("{} h", hours),
        (hours, rest) => format!("{} h {} min", hours, rest),
    }
}

/// Human-facing distance: `"1.2 km"` from a kilometer up, `"734 m"` below.
pub fn format_distance(meters: f64) -> String {
    let rounded = meters.round();
    if rounded < 1000.0 {
        format!("{} m", rounded as u64)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ComputeRoutesRequest {
    origin: ApiWaypoint,
    destination: ApiWaypoint,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    intermediates: Vec<ApiWaypoint>,
    travel_mode: ApiTravelMode,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    optimize_waypoint_order: bool,
    polyline_encoding: &'static str,
}

impl ComputeRoutesRequest {
    fn from_query(query: &RouteQuery) -> Self {
        Self {
            origin: query.origin.into(),
            destination: query.destination.into(),
            intermediates: query.stops.iter().copied().map(ApiWaypoint::from).collect(),
            travel_mode: query.mode.into(),
            optimize_waypoint_order: !query.stops.is_empty(),
            polyline_encoding: "ENCODED_POLYLINE",
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiWaypoint {
    location: ApiLocation,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiLocation {
    lat_lng: Coordinate,
}

impl From<Coordinate> for ApiWaypoint {
    fn from(lat_lng: Coordinate) -> Self {
        Self {
            location: ApiLocation { lat_lng },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum ApiTravelMode {
    Walk,
    Drive,
}

impl From<TravelMode> for ApiTravelMode {
    fn from(mode: TravelMode) -> Self {
        match mode {
            TravelMode::Walking => ApiTravelMode::Walk,
            TravelMode::Driving => ApiTravelMode::Drive,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ComputeRoutesResponse {
    #[serde(default)]
    routes: Vec<ApiRoute>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiRoute {
    distance_meters: Option<f64>,
    duration: Option<String>,
    polyline: Option<ApiPolyline>,
    optimized_intermediate_waypoint_index: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPolyline {
    encoded_polyline: Option<String>,
}
