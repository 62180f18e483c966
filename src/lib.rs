//! trip-planner core
//!
//! Turns a set of chosen stops into a navigable, map-framed route: a
//! debounced trip coordinator drives an external routing service, decodes
//! the returned path and fits it to a map viewport.

pub mod error;
pub mod model;
pub mod traits;
pub mod polyline;
pub mod haversine;
pub mod geometry;
pub mod routes;
pub mod coordinator;
pub mod navigation;
pub mod config;

pub use coordinator::{CoordinatorConfig, TripCoordinator};
pub use error::{InvalidOrderError, LocationError, RoutingError, TripError};
pub use model::{Coordinate, RouteQuery, RouteResult, TravelMode, TripState, Waypoint};
