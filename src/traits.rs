//! Seams to the external collaborators the planner depends on.
//!
//! The coordinator is generic over these so it can run against the live
//! routing service and device location, or against scripted stand-ins.

use std::future::Future;

use crate::error::{LocationError, RoutingError};
use crate::model::{Coordinate, RouteQuery, RouteResult};

/// Computes a route for a query. One call is one round trip: no retries,
/// no caching.
pub trait RouteProvider: Send + Sync + 'static {
    fn compute_route(
        &self,
        query: &RouteQuery,
    ) -> impl Future<Output = Result<RouteResult, RoutingError>> + Send;
}

/// Yields the device's current position on request.
pub trait LocationProvider: Send + Sync + 'static {
    fn current_position(&self) -> impl Future<Output = Result<Coordinate, LocationError>> + Send;
}

/// A location provider that always reports the same position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedLocation(pub Coordinate);

impl LocationProvider for FixedLocation {
    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        if self.0.is_valid() {
            Ok(self.0)
        } else {
            Err(LocationError::Unavailable(format!("invalid position {:?}", self.0)))
        }
    }
}
