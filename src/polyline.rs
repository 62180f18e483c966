//! Encoded polyline codec for route geometries.
//!
//! The routing service returns paths in the compact encoded-polyline form:
//! each coordinate is stored as a delta from the previous one, scaled by 1e5,
//! zig-zag signed and split into 5-bit chunks offset by 63, with 0x20 marking
//! a continuation. Decoding happens at the boundary; everything inside the
//! crate works on [`Polyline`].

use serde::{Deserialize, Serialize};

use crate::model::Coordinate;

const PRECISION: f64 = 1e5;
const CHUNK_OFFSET: u8 = 63;
const CONTINUATION: i64 = 0x20;
const CHUNK_MASK: i64 = 0x1f;
// A 64-bit accumulator holds at most 12 five-bit chunks.
const MAX_SHIFT: u32 = 60;
// No step between two real coordinates spans more than 360 degrees.
const MAX_DELTA: u64 = 360 * 100_000;

/// A route geometry as decoded coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Coordinate>,
}

impl Polyline {
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    /// Decodes an encoded polyline. See [`decode`].
    pub fn decode(encoded: &str) -> Self {
        Self::new(decode(encoded))
    }

    pub fn encode(&self) -> String {
        encode(&self.points)
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Decodes an encoded polyline left to right.
///
/// Never fails: a truncated or malformed input yields the coordinates
/// completed before the problem was found. A delta larger than 360 degrees
/// counts as malformed.
pub fn decode(encoded: &str) -> Vec<Coordinate> {
    let bytes = encoded.as_bytes();
    let mut cursor = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut points = Vec::new();

    while cursor < bytes.len() {
        let Some(dlat) = next_value(bytes, &mut cursor) else {
            break;
        };
        let Some(dlng) = next_value(bytes, &mut cursor) else {
            break;
        };
        let (Some(next_lat), Some(next_lng)) = (lat.checked_add(dlat), lng.checked_add(dlng))
        else {
            break;
        };
        lat = next_lat;
        lng = next_lng;
        points.push(Coordinate::new(lat as f64 / PRECISION, lng as f64 / PRECISION));
    }

    points
}

/// Reads one zig-zag encoded value, or `None` if the input ends mid-value
/// or holds a byte outside the encoding alphabet.
fn next_value(bytes: &[u8], cursor: &mut usize) -> Option<i64> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;

    loop {
        let byte = *bytes.get(*cursor)?;
        *cursor += 1;
        let chunk = i64::from(byte.checked_sub(CHUNK_OFFSET)?);
        if chunk > 0x3f || shift > MAX_SHIFT {
            return None;
        }
        result |= (chunk & CHUNK_MASK) << shift;
        shift += 5;
        if chunk & CONTINUATION == 0 {
            break;
        }
    }

    let value = if result & 1 != 0 { !(result >> 1) } else { result >> 1 };
    (value.unsigned_abs() <= MAX_DELTA).then_some(value)
}

/// Encodes coordinates with the same scheme [`decode`] reads.
pub fn encode(points: &[Coordinate]) -> String {
    let mut out = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for point in points {
        let lat = (point.latitude * PRECISION).round() as i64;
        let lng = (point.longitude * PRECISION).round() as i64;
        push_value(&mut out, lat - prev_lat);
        push_value(&mut out, lng - prev_lng);
        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

fn push_value(out: &mut String, value: i64) {
    let mut zigzag = if value < 0 { !(value << 1) } else { value << 1 };
    while zigzag >= CONTINUATION {
        out.push(char::from((CONTINUATION | (zigzag & CHUNK_MASK)) as u8 + CHUNK_OFFSET));
        zigzag >>= 5;
    }
    out.push(char::from(zigzag as u8 + CHUNK_OFFSET));
}
