//! Test fixtures for trip-planner.
//!
//! Provides real Bragança locations and a scripted routing service.

pub mod braganca_locations;
pub mod scripted_router;

pub use braganca_locations::*;
