//! Error taxonomy for trip planning.
//!
//! None of these are fatal: every failure is recoverable by repeating the
//! mutation that triggered it.

use thiserror::Error;

/// The device location could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location fix unavailable: {0}")]
    Unavailable(String),
}

/// A routing service call failed.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("routing request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("routing request timed out")]
    Timeout,
    #[error("routing service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unparseable routing payload: {0}")]
    Payload(String),
    #[error("routing service found no route")]
    NoRoute,
}

/// An optimized visiting order that cannot be applied to the stop list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidOrderError {
    #[error("optimized order has {actual} entries, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("optimized order is not a permutation of the stop indices")]
    NotAPermutation,
}

/// Errors returned by [`crate::coordinator::TripCoordinator`] handle calls.
#[derive(Debug, Error)]
pub enum TripError {
    #[error(transparent)]
    Location(#[from] LocationError),
    #[error("trip coordinator has stopped")]
    Closed,
}
