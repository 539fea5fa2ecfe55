//! Core records shared by every stage of a planning run.
//!
//! Field names serialize in camelCase so snapshots stay compatible with the
//! JSON files the dashboard reads.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// A geographic position in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Day of the week a pool is serviced on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ServiceDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
    /// Placeholder days from the source sheets ("Unknown", blanks, typos).
    #[serde(other)]
    Unknown,
}

impl ServiceDay {
    pub fn is_known(self) -> bool {
        self != ServiceDay::Unknown
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    Residential,
    Commercial,
}

/// A customer account (a pool).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(alias = "customerNumber")]
    pub id: String,
    #[serde(default, alias = "accountName", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, alias = "zipCode")]
    pub zip: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default, alias = "route")]
    pub worker: Option<String>,
    #[serde(default)]
    pub days: Vec<ServiceDay>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub monthly_price: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub yearly_price: f64,
    #[serde(default)]
    pub account_type: Option<AccountType>,
    #[serde(default)]
    pub territory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_territory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_worker: Option<String>,
    #[serde(default)]
    pub reassigned: bool,
}

impl Account {
    /// Creates an account with only an id; every other field is empty.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            address: None,
            city: None,
            state: None,
            zip: None,
            latitude: None,
            longitude: None,
            worker: None,
            days: Vec::new(),
            monthly_price: 0.0,
            yearly_price: 0.0,
            account_type: None,
            territory: None,
            original_territory: None,
            original_worker: None,
            reassigned: false,
        }
    }

    /// Position of the account, or an error when geocoding has not filled it yet.
    pub fn position(&self) -> Result<Coordinate, GeometryError> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Ok(Coordinate::new(lat, lng)),
            _ => Err(GeometryError::MissingCoordinates),
        }
    }

    pub fn has_position(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    /// Distinct known service days, in first-seen order.
    pub fn scheduled_days(&self) -> Vec<ServiceDay> {
        let mut days = Vec::with_capacity(self.days.len());
        for day in &self.days {
            if day.is_known() && !days.contains(day) {
                days.push(*day);
            }
        }
        days
    }

    /// Weekly visits this account occupies on a route.
    ///
    /// An account with no known days still counts as one visit.
    pub fn weekly_visits(&self) -> u32 {
        (self.scheduled_days().len() as u32).max(1)
    }

    /// Non-blank ZIP code, if any.
    pub fn zip_code(&self) -> Option<&str> {
        self.zip
            .as_deref()
            .map(str::trim)
            .filter(|zip| !zip.is_empty())
    }
}

/// Geometry problems that reject a single record or boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("boundary `{name}` has {vertices} vertices, at least 2 are required")]
    TooFewVertices { name: String, vertices: usize },
    #[error("malformed coordinate `{0}`")]
    MalformedCoordinate(String),
    #[error("account has no coordinates")]
    MissingCoordinates,
}

/// A per-record failure collected during a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", bound(serialize = "E: std::fmt::Display"))]
pub struct AccountError<E> {
    pub account_id: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: E,
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

fn serialize_display<E, S>(error: &E, serializer: S) -> Result<S::Ok, S::Error>
where
    E: std::fmt::Display,
    S: serde::Serializer,
{
    serializer.collect_str(error)
}
