//! Seams for the collaborators a planning run talks to.
//!
//! The core never performs network I/O itself; callers hand in an
//! implementation of these traits.

use crate::geocode::GeocodeError;
use crate::model::Coordinate;

/// Resolves a free-form postal address to a position.
pub trait Geocoder {
    /// Look up a single address.
    ///
    /// `Ok(None)` means the service answered but found no match; callers cache
    /// that as a miss. `Err` is a transport or service failure.
    fn geocode(&self, address: &str) -> Result<Option<Coordinate>, GeocodeError>;
}
