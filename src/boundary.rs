//! Boundary lines and north/south point classification.
//!
//! A boundary is an ordered polyline of vertices, usually traced in Google
//! Earth and exported as a KML `LineString`. Classification interpolates the
//! line's latitude at the query longitude.

use serde::{Deserialize, Serialize};

use crate::model::{Coordinate, GeometryError};

/// A named dividing line with at least two vertices.
///
/// Vertices are expected to run west-to-east or east-to-west. That ordering is
/// not enforced; see [`BoundaryLine::is_monotonic`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBoundaryLine")]
pub struct BoundaryLine {
    name: String,
    vertices: Vec<Coordinate>,
}

#[derive(Deserialize)]
struct RawBoundaryLine {
    name: String,
    vertices: Vec<Coordinate>,
}

impl TryFrom<RawBoundaryLine> for BoundaryLine {
    type Error = GeometryError;

    fn try_from(raw: RawBoundaryLine) -> Result<Self, Self::Error> {
        BoundaryLine::new(raw.name, raw.vertices)
    }
}

impl BoundaryLine {
    /// Creates a boundary from ordered vertices.
    ///
    /// Fails when fewer than two vertices are given. A line whose longitudes
    /// are not monotonic is accepted but logged.
    pub fn new(name: impl Into<String>, vertices: Vec<Coordinate>) -> Result<Self, GeometryError> {
        let name = name.into();
        if vertices.len() < 2 {
            return Err(GeometryError::TooFewVertices {
                name,
                vertices: vertices.len(),
            });
        }

        let line = Self { name, vertices };
        if !line.is_monotonic() {
            tracing::warn!(
                boundary = %line.name,
                vertices = line.vertices.len(),
                "boundary longitudes are not monotonic; bracketing uses the first matching segment"
            );
        }
        Ok(line)
    }

    /// Parses the body of a KML `<coordinates>` element.
    ///
    /// Tuples are `lng,lat` or `lng,lat,alt`, separated by whitespace.
    pub fn from_kml_coordinates(
        name: impl Into<String>,
        text: &str,
    ) -> Result<Self, GeometryError> {
        let vertices = text
            .split_whitespace()
            .map(parse_kml_tuple)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(name, vertices)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[Coordinate] {
        &self.vertices
    }

    /// True when longitudes never change direction along the line.
    pub fn is_monotonic(&self) -> bool {
        let ascending = self.vertices.windows(2).all(|pair| pair[0].lng <= pair[1].lng);
        let descending = self.vertices.windows(2).all(|pair| pair[0].lng >= pair[1].lng);
        ascending || descending
    }

    /// Westernmost vertex; the first one wins on equal longitude.
    fn westernmost(&self) -> &Coordinate {
        let mut west = &self.vertices[0];
        for vertex in &self.vertices[1..] {
            if vertex.lng < west.lng {
                west = vertex;
            }
        }
        west
    }

    /// Easternmost vertex; the last one wins on equal longitude.
    fn easternmost(&self) -> &Coordinate {
        let mut east = &self.vertices[0];
        for vertex in &self.vertices[1..] {
            if vertex.lng >= east.lng {
                east = vertex;
            }
        }
        east
    }
}

fn parse_kml_tuple(tuple: &str) -> Result<Coordinate, GeometryError> {
    let mut parts = tuple.split(',');
    let lng = parts.next().and_then(|part| part.trim().parse::<f64>().ok());
    let lat = parts.next().and_then(|part| part.trim().parse::<f64>().ok());
    match (lng, lat) {
        (Some(lng), Some(lat)) => Ok(Coordinate::new(lat, lng)),
        _ => Err(GeometryError::MalformedCoordinate(tuple.to_string())),
    }
}

/// Whether `point` lies strictly north of `boundary`.
///
/// Finds the first segment whose longitudes bracket the point (inclusive, in
/// either direction) and compares against the interpolated latitude. Outside
/// the line's longitude span the point is compared against the latitude of
/// the westernmost or easternmost vertex, with no extrapolation.
///
/// A point exactly on the line is not north.
pub fn is_north_of(point: Coordinate, boundary: &BoundaryLine) -> bool {
    let bracket = boundary.vertices.windows(2).find_map(|pair| {
        let (p1, p2) = (&pair[0], &pair[1]);
        if p1.lng <= point.lng && point.lng <= p2.lng {
            Some((p1, p2))
        } else if p2.lng <= point.lng && point.lng <= p1.lng {
            Some((p2, p1))
        } else {
            None
        }
    });

    let Some((left, right)) = bracket else {
        let west = boundary.westernmost();
        if point.lng < west.lng {
            return point.lat > west.lat;
        }
        return point.lat > boundary.easternmost().lat;
    };

    // A vertical segment yields 0/0 here; the NaN comparison is false.
    let fraction = (point.lng - left.lng) / (right.lng - left.lng);
    let interpolated = left.lat + fraction * (right.lat - left.lat);
    point.lat > interpolated
}
