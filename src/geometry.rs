//! Map fitting: outlier filtering, viewport regions and route stroke widths.
//!
//! The numeric policy is tuned for city-scale trips. It lives in
//! [`ViewportPolicy`] so callers targeting another scale can supply their own.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::haversine::{centroid, haversine_km};
use crate::model::Coordinate;

/// Outlier filtering needs at least this many points to define a cluster.
const MIN_POINTS_FOR_OUTLIERS: usize = 3;

/// Tunable constants for viewport fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportPolicy {
    /// Multiplier applied to both spans of the bounding box.
    pub margin: f64,
    /// Upper bound on the extra latitude padding for bottom UI chrome.
    pub max_bottom_padding: f64,
    /// Tightest span in degrees.
    pub min_span: f64,
    /// Widest span in degrees.
    pub max_span: f64,
    /// Span used when only one point is left.
    pub single_point_span: f64,
    /// Points farther than this from the cluster centroid are outliers.
    pub outlier_radius_km: f64,
}

impl Default for ViewportPolicy {
    fn default() -> Self {
        Self {
            margin: 1.08,
            max_bottom_padding: 0.35,
            min_span: 0.035,
            max_span: 0.18,
            single_point_span: 0.06,
            outlier_radius_km: 120.0,
        }
    }
}

/// A map viewport: center plus latitude/longitude spans in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub center: Coordinate,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

/// Route line widths for the three stacked strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrokeWidths {
    pub inner: u32,
    pub mid: u32,
    pub outer: u32,
}

impl Default for StrokeWidths {
    fn default() -> Self {
        Self {
            inner: 6,
            mid: 8,
            outer: 10,
        }
    }
}

/// Filters points unfit for framing, using the default outlier radius.
pub fn sanitize(points: &[Coordinate]) -> Vec<Coordinate> {
    sanitize_within(points, ViewportPolicy::default().outlier_radius_km)
}

/// Drops out-of-range points and the `(0, 0)` "unset" sentinel, then, while
/// three or more points remain, drops the point farthest from the centroid
/// as long as it lies beyond `radius_km`.
///
/// The centroid is recomputed after every removal so a single far-away point
/// cannot drag it away from the cluster. Input order is preserved.
pub fn sanitize_within(points: &[Coordinate], radius_km: f64) -> Vec<Coordinate> {
    let mut kept: Vec<Coordinate> = points
        .par_iter()
        .filter(|p| p.is_valid() && !is_unset(p))
        .copied()
        .collect();

    while kept.len() >= MIN_POINTS_FOR_OUTLIERS {
        let Some(center) = centroid(&kept) else {
            break;
        };
        let farthest = kept
            .par_iter()
            .enumerate()
            .map(|(index, p)| (index, haversine_km(*p, center)))
            .max_by(|a, b| a.1.total_cmp(&b.1));

        match farthest {
            Some((index, distance)) if distance > radius_km => {
                tracing::trace!(?center, distance, "dropping outlier {:?}", kept[index]);
                kept.remove(index);
            }
            _ => break,
        }
    }

    kept
}

fn is_unset(point: &Coordinate) -> bool {
    point.latitude == 0.0 && point.longitude == 0.0
}

/// Fits a region around `points` with the default policy. See [`fit_region_with`].
pub fn fit_region(
    points: &[Coordinate],
    extra_bottom_px: f64,
    screen_height_px: f64,
) -> Option<Region> {
    fit_region_with(points, extra_bottom_px, screen_height_px, &ViewportPolicy::default())
}

/// Computes the viewport framing the sanitized `points`.
///
/// `extra_bottom_px` is the height of UI chrome covering the bottom of a
/// `screen_height_px` tall map; the latitude span grows to compensate.
/// Returns `None` when no point survives sanitizing.
pub fn fit_region_with(
    points: &[Coordinate],
    extra_bottom_px: f64,
    screen_height_px: f64,
    policy: &ViewportPolicy,
) -> Option<Region> {
    let points = sanitize_within(points, policy.outlier_radius_km);

    if let [only] = points.as_slice() {
        return Some(Region {
            center: *only,
            latitude_delta: policy.single_point_span,
            longitude_delta: policy.single_point_span,
        });
    }

    let first = points.first()?;
    let (mut min_lat, mut max_lat) = (first.latitude, first.latitude);
    let (mut min_lng, mut max_lng) = (first.longitude, first.longitude);
    for p in &points[1..] {
        min_lat = min_lat.min(p.latitude);
        max_lat = max_lat.max(p.latitude);
        min_lng = min_lng.min(p.longitude);
        max_lng = max_lng.max(p.longitude);
    }

    let bottom_fraction = if screen_height_px > 0.0 && screen_height_px.is_finite() {
        (extra_bottom_px / screen_height_px).max(0.0)
    } else {
        0.0
    };
    let bottom_padding = 1.0 + bottom_fraction.min(policy.max_bottom_padding);

    let lat_span = (max_lat - min_lat) * policy.margin * bottom_padding;
    let lng_span = (max_lng - min_lng) * policy.margin;

    Some(Region {
        center: Coordinate::new((min_lat + max_lat) / 2.0, (min_lng + max_lng) / 2.0),
        latitude_delta: lat_span.clamp(policy.min_span, policy.max_span),
        longitude_delta: lng_span.clamp(policy.min_span, policy.max_span),
    })
}

/// Stroke widths for a route drawn on a map showing `lat_span` degrees.
///
/// Wider views get thinner lines, closer views thicker ones.
pub fn stroke_widths(lat_span: Option<f64>) -> StrokeWidths {
    let Some(span) = lat_span.filter(|span| span.is_finite()) else {
        return StrokeWidths::default();
    };

    let scale = (0.5 / span).clamp(0.7, 1.4);
    let inner = (4.0 * scale).round().clamp(3.0, 9.0);
    let mid = (inner + 2.0).clamp(5.0, 12.0);
    let outer = (mid + 2.0).clamp(7.0, 15.0);

    StrokeWidths {
        inner: inner as u32,
        mid: mid as u32,
        outer: outer as u32,
    }
}
