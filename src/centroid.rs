//! Geographic centroid of a worker's accounts.

use crate::model::{Account, Coordinate};

/// Arithmetic mean of latitude and longitude over accounts with a position.
///
/// Returns `None` when no account has coordinates. Holds no state; callers
/// recompute after every change to the account list.
pub fn centroid(accounts: &[Account]) -> Option<Coordinate> {
    let mut count = 0usize;
    let mut lat_sum = 0.0;
    let mut lng_sum = 0.0;

    for position in accounts.iter().filter_map(|account| account.position().ok()) {
        lat_sum += position.lat;
        lng_sum += position.lng;
        count += 1;
    }

    if count == 0 {
        return None;
    }

    Some(Coordinate::new(lat_sum / count as f64, lng_sum / count as f64))
}
