//! Real Miami-Dade locations for realistic test fixtures.
//!
//! Boundary vertices approximate the traced north/south breakout lines;
//! each location group sits clearly inside one band.

#![allow(dead_code)]

use territory_planner::boundary::BoundaryLine;
use territory_planner::model::Coordinate;
use territory_planner::territory::TerritoryBoundaries;

/// A named location with coordinates and ZIP code.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub zip: &'static str,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64, zip: &'static str) -> Self {
        Self { name, lat, lng, zip }
    }

    pub fn coords(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

// ============================================================================
// Boundaries (KML coordinate order: lng,lat)
// ============================================================================

pub const NORTH_BOUNDARY_KML: &str = "
    -80.45,25.860,0 -80.30,25.875,0 -80.20,25.870,0 -80.12,25.880,0
";

pub const SOUTH_BOUNDARY_KML: &str = "
    -80.45,25.700,0 -80.30,25.715,0 -80.22,25.730,0 -80.13,25.740,0
";

pub fn miami_boundaries() -> TerritoryBoundaries {
    TerritoryBoundaries {
        north: BoundaryLine::from_kml_coordinates("NORTH BOUNDARY", NORTH_BOUNDARY_KML).unwrap(),
        south: BoundaryLine::from_kml_coordinates("SOUTH BOUNDARY", SOUTH_BOUNDARY_KML).unwrap(),
    }
}

// ============================================================================
// North of the north line
// ============================================================================

pub const NORTH: &[Location] = &[
    Location::new("Aventura Mall", 25.9565, -80.1429, "33180"),
    Location::new("Hard Rock Stadium", 25.9580, -80.2389, "33056"),
    Location::new("North Miami Beach", 25.9331, -80.1625, "33162"),
    Location::new("Miami Lakes", 25.9087, -80.3087, "33014"),
    Location::new("Opa-locka", 25.9023, -80.2503, "33054"),
];

// ============================================================================
// Between the lines
// ============================================================================

pub const CENTRAL: &[Location] = &[
    Location::new("Wynwood Walls", 25.8010, -80.1994, "33127"),
    Location::new("Little Havana", 25.7656, -80.2195, "33135"),
    Location::new("Miami International Airport", 25.7959, -80.2870, "33126"),
    Location::new("Doral", 25.8195, -80.3553, "33178"),
    Location::new("Brickell City Centre", 25.7670, -80.1930, "33131"),
];

// ============================================================================
// South of the south line
// ============================================================================

pub const SOUTH: &[Location] = &[
    Location::new("Kendall", 25.6793, -80.3173, "33156"),
    Location::new("Pinecrest", 25.6651, -80.3081, "33156"),
    Location::new("Palmetto Bay", 25.6217, -80.3245, "33157"),
    Location::new("Cutler Bay", 25.5808, -80.3468, "33189"),
    // West of the traced line; classified against its western end.
    Location::new("Homestead", 25.4687, -80.4776, "33030"),
];
