//! Trip data model.
//!
//! `TripState` is the single value the coordinator owns. Its mutation methods
//! report whether anything actually changed so the caller knows when a new
//! trip needs publishing.

use serde::{Deserialize, Serialize};

use crate::error::InvalidOrderError;
use crate::geometry::{self, Region, ViewportPolicy};
use crate::polyline::Polyline;

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both components are finite and within the valid ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }
}

/// A stop or destination. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: String,
    pub coordinate: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Waypoint {
    pub fn new(id: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            id: id.into(),
            coordinate,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Walking,
    #[default]
    Driving,
}

/// Request payload derived from a trip. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteQuery {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub stops: Vec<Coordinate>,
    pub mode: TravelMode,
}

/// Normalized output of one successful routing call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteResult {
    pub path: Polyline,
    /// Visiting order of the query's stops, already checked against its length.
    pub optimized_order: Option<Vec<usize>>,
    pub distance_meters: Option<f64>,
    pub duration_seconds: Option<f64>,
    pub distance_text: Option<String>,
    pub duration_text: Option<String>,
}

/// Everything known about the trip being planned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripState {
    pub origin: Option<Coordinate>,
    pub destination: Option<Waypoint>,
    /// Insertion order.
    pub stops: Vec<Waypoint>,
    pub mode: TravelMode,
    pub path: Option<Polyline>,
    pub optimized_order: Option<Vec<usize>>,
    pub distance_meters: Option<f64>,
    pub duration_seconds: Option<f64>,
    pub distance_text: Option<String>,
    pub duration_text: Option<String>,
}

impl TripState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_origin(&mut self, origin: Coordinate) -> bool {
        if self.origin == Some(origin) {
            return false;
        }
        self.origin = Some(origin);
        true
    }

    /// Sets the destination, evicting any stop that shares its id.
    pub fn set_destination(&mut self, destination: Waypoint) -> bool {
        if self.destination.as_ref() == Some(&destination) {
            return false;
        }
        let before = self.stops.len();
        self.stops.retain(|stop| stop.id != destination.id);
        if self.stops.len() != before {
            self.optimized_order = None;
        }
        self.destination = Some(destination);
        true
    }

    pub fn clear_destination(&mut self) -> bool {
        self.destination.take().is_some()
    }

    /// Appends a stop unless a stop or the destination already has its id.
    pub fn add_stop(&mut self, stop: Waypoint) -> bool {
        let is_destination = self
            .destination
            .as_ref()
            .is_some_and(|destination| destination.id == stop.id);
        if is_destination || self.stops.iter().any(|existing| existing.id == stop.id) {
            return false;
        }
        self.stops.push(stop);
        self.optimized_order = None;
        true
    }

    pub fn remove_stop(&mut self, id: &str) -> bool {
        let before = self.stops.len();
        self.stops.retain(|stop| stop.id != id);
        if self.stops.len() == before {
            return false;
        }
        self.optimized_order = None;
        true
    }

    pub fn set_mode(&mut self, mode: TravelMode) -> bool {
        if self.mode == mode {
            return false;
        }
        self.mode = mode;
        true
    }

    pub fn stop_ids(&self) -> Vec<String> {
        self.stops.iter().map(|stop| stop.id.clone()).collect()
    }

    /// Routing request for the current trip, if origin and destination are set.
    pub fn route_query(&self) -> Option<RouteQuery> {
        let origin = self.origin?;
        let destination = self.destination.as_ref()?;
        Some(RouteQuery {
            origin,
            destination: destination.coordinate,
            stops: self.stops.iter().map(|stop| stop.coordinate).collect(),
            mode: self.mode,
        })
    }

    /// Folds a routing result computed for the stops identified by `computed_for`.
    ///
    /// The optimized order is kept only if it was computed for exactly the
    /// current stop list and is a permutation of its indices.
    pub fn apply_route(&mut self, result: RouteResult, computed_for: &[String]) {
        let same_stops = self
            .stops
            .iter()
            .map(|stop| stop.id.as_str())
            .eq(computed_for.iter().map(String::as_str));

        self.optimized_order = match result.optimized_order {
            Some(order) if same_stops => match validate_order(&order, self.stops.len()) {
                Ok(()) => Some(order),
                Err(err) => {
                    tracing::warn!("dropping optimized order: {}", err);
                    None
                }
            },
            _ => None,
        };
        self.path = Some(result.path);
        self.distance_meters = result.distance_meters;
        self.duration_seconds = result.duration_seconds;
        self.distance_text = result.distance_text;
        self.duration_text = result.duration_text;
    }

    /// Stops in display order: the optimized order when it is valid for the
    /// current stop list, insertion order otherwise.
    pub fn ordered_stops(&self) -> Vec<&Waypoint> {
        match &self.optimized_order {
            Some(order) if validate_order(order, self.stops.len()).is_ok() => {
                order.iter().map(|&index| &self.stops[index]).collect()
            }
            _ => self.stops.iter().collect(),
        }
    }

    /// Every point a viewport should frame: origin, ordered stops,
    /// destination and the route path.
    pub fn fit_points(&self) -> Vec<Coordinate> {
        let mut points = Vec::new();
        points.extend(self.origin);
        points.extend(self.ordered_stops().iter().map(|stop| stop.coordinate));
        points.extend(self.destination.as_ref().map(|d| d.coordinate));
        if let Some(path) = &self.path {
            points.extend_from_slice(path.points());
        }
        points
    }

    /// Map region framing the trip, or `None` when there is nothing valid to show.
    pub fn viewport(&self, extra_bottom_px: f64, screen_height_px: f64) -> Option<Region> {
        geometry::fit_region_with(
            &self.fit_points(),
            extra_bottom_px,
            screen_height_px,
            &ViewportPolicy::default(),
        )
    }
}

/// Checks that `order` is a permutation of `0..len`.
pub fn validate_order(order: &[usize], len: usize) -> Result<(), InvalidOrderError> {
    if order.len() != len {
        return Err(InvalidOrderError::LengthMismatch {
            expected: len,
            actual: order.len(),
        });
    }
    let mut seen = vec![false; len];
    for &index in order {
        match seen.get_mut(index) {
            Some(slot) if !*slot => *slot = true,
            _ => return Err(InvalidOrderError::NotAPermutation),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(id: &str, lat: f64, lng: f64) -> Waypoint {
        Waypoint::new(id, Coordinate::new(lat, lng))
    }

    fn routed(order: Option<Vec<usize>>) -> RouteResult {
        RouteResult {
            path: Polyline::new(vec![Coordinate::new(41.80, -6.75), Coordinate::new(41.81, -6.76)]),
            optimized_order: order,
            distance_meters: Some(1500.0),
            duration_seconds: Some(600.0),
            distance_text: Some("1.5 km".to_string()),
            duration_text: Some("10 min".to_string()),
        }
    }

    #[test]
    fn test_coordinate_range_check() {
        assert!(Coordinate::new(41.8, -6.75).is_valid());
        assert!(Coordinate::new(-90.0, 180.0).is_valid());
        assert!(!Coordinate::new(90.5, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.1).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_add_stop_is_idempotent() {
        let mut trip = TripState::new();
        assert!(trip.add_stop(stop("a", 41.80, -6.75)));
        assert!(!trip.add_stop(stop("a", 41.90, -6.70)));
        assert_eq!(trip.stops.len(), 1);
        assert_eq!(trip.stops[0].coordinate, Coordinate::new(41.80, -6.75));
    }

    #[test]
    fn test_add_stop_rejects_destination_id() {
        let mut trip = TripState::new();
        trip.set_destination(stop("dest", 41.79, -6.77));
        assert!(!trip.add_stop(stop("dest", 41.80, -6.75)));
        assert!(trip.stops.is_empty());
    }

    #[test]
    fn test_set_destination_evicts_matching_stop() {
        let mut trip = TripState::new();
        trip.add_stop(stop("a", 41.80, -6.75));
        trip.add_stop(stop("b", 41.81, -6.76));
        trip.set_destination(stop("a", 41.80, -6.75));
        assert_eq!(trip.stop_ids(), vec!["b".to_string()]);
    }

    #[test]
    fn test_remove_unknown_stop_is_no_change() {
        let mut trip = TripState::new();
        trip.add_stop(stop("a", 41.80, -6.75));
        assert!(!trip.remove_stop("zzz"));
        assert!(trip.remove_stop("a"));
        assert!(trip.stops.is_empty());
    }

    #[test]
    fn test_same_mode_is_no_change() {
        let mut trip = TripState::new();
        assert!(!trip.set_mode(TravelMode::Driving));
        assert!(trip.set_mode(TravelMode::Walking));
    }

    #[test]
    fn test_route_query_requires_both_ends() {
        let mut trip = TripState::new();
        trip.add_stop(stop("a", 41.80, -6.75));
        assert!(trip.route_query().is_none());
        trip.set_origin(Coordinate::new(41.79, -6.74));
        assert!(trip.route_query().is_none());
        trip.set_destination(stop("dest", 41.82, -6.77));
        let query = trip.route_query().unwrap();
        assert_eq!(query.stops, vec![Coordinate::new(41.80, -6.75)]);
        assert_eq!(query.destination, Coordinate::new(41.82, -6.77));
    }

    #[test]
    fn test_validate_order() {
        assert!(validate_order(&[2, 0, 1], 3).is_ok());
        assert!(validate_order(&[], 0).is_ok());
        assert_eq!(
            validate_order(&[0, 1], 3),
            Err(InvalidOrderError::LengthMismatch { expected: 3, actual: 2 })
        );
        assert_eq!(validate_order(&[0, 0, 1], 3), Err(InvalidOrderError::NotAPermutation));
        assert_eq!(validate_order(&[0, 1, 3], 3), Err(InvalidOrderError::NotAPermutation));
    }

    #[test]
    fn test_ordered_stops_applies_valid_order() {
        let mut trip = TripState::new();
        trip.add_stop(stop("a", 41.80, -6.75));
        trip.add_stop(stop("b", 41.81, -6.76));
        trip.add_stop(stop("c", 41.82, -6.77));
        let ids = trip.stop_ids();
        trip.apply_route(routed(Some(vec![2, 0, 1])), &ids);

        let order: Vec<&str> = trip.ordered_stops().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
        // insertion order is untouched
        assert_eq!(trip.stop_ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_mismatched_order_falls_back_to_insertion() {
        let mut trip = TripState::new();
        trip.add_stop(stop("a", 41.80, -6.75));
        trip.add_stop(stop("b", 41.81, -6.76));
        let ids = trip.stop_ids();
        trip.apply_route(routed(Some(vec![0])), &ids);

        assert!(trip.optimized_order.is_none());
        assert!(trip.path.is_some());
        let order: Vec<&str> = trip.ordered_stops().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[test]
    fn test_order_for_other_stop_list_is_dropped() {
        let mut trip = TripState::new();
        trip.add_stop(stop("a", 41.80, -6.75));
        trip.add_stop(stop("b", 41.81, -6.76));
        trip.apply_route(routed(Some(vec![1, 0])), &["a".to_string(), "x".to_string()]);
        assert!(trip.optimized_order.is_none());
        assert_eq!(trip.distance_text.as_deref(), Some("1.5 km"));
    }

    #[test]
    fn test_stop_change_drops_stored_order() {
        let mut trip = TripState::new();
        trip.add_stop(stop("a", 41.80, -6.75));
        trip.add_stop(stop("b", 41.81, -6.76));
        let ids = trip.stop_ids();
        trip.apply_route(routed(Some(vec![1, 0])), &ids);
        assert!(trip.optimized_order.is_some());

        trip.add_stop(stop("c", 41.82, -6.77));
        assert!(trip.optimized_order.is_none());
        assert!(trip.path.is_some(), "path survives until the next result");
    }

    #[test]
    fn test_fit_points_include_everything() {
        let mut trip = TripState::new();
        trip.set_origin(Coordinate::new(41.79, -6.74));
        trip.add_stop(stop("a", 41.80, -6.75));
        trip.set_destination(stop("dest", 41.82, -6.77));
        assert_eq!(trip.fit_points().len(), 3);

        let ids = trip.stop_ids();
        trip.apply_route(routed(None), &ids);
        assert_eq!(trip.fit_points().len(), 5);
        assert!(trip.viewport(0.0, 800.0).is_some());
    }

    #[test]
    fn test_empty_trip_has_no_viewport() {
        assert!(TripState::new().viewport(0.0, 800.0).is_none());
    }
}
