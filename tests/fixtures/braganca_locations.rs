//! Real Bragança (Portugal) locations for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap.

use trip_planner::{Coordinate, Waypoint};

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }

    pub fn waypoint(&self) -> Waypoint {
        Waypoint::new(self.name, self.coordinate()).with_label(self.name)
    }
}

// ============================================================================
// City centre
// ============================================================================

pub const CASTLE: Location = Location::new("Castelo de Bragança", 41.8069, -6.7547);
pub const CATHEDRAL: Location = Location::new("Sé Catedral", 41.8037, -6.7611);
pub const MUNICIPAL_MARKET: Location = Location::new("Mercado Municipal", 41.8063, -6.7594);
pub const POLYTECHNIC: Location = Location::new("Instituto Politécnico", 41.7978, -6.7673);

// ============================================================================
// Recycling drop-off points
// ============================================================================

pub const COLLECTION_POINTS: &[Location] = &[
    Location::new("Ecoponto Avenida Sá Carneiro", 41.8046, -6.7565),
    Location::new("Ecoponto Rua Almirante Reis", 41.8082, -6.7581),
    Location::new("Ecoponto Estação Rodoviária", 41.8011, -6.7522),
    Location::new("Ecoponto Bairro da Mãe d'Água", 41.7949, -6.7708),
];
