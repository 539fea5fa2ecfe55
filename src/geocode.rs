//! Address geocoding for accounts imported without coordinates.
//!
//! Lookups go through [`Geocoder`]; [`GoogleGeocoder`] is the HTTP adapter.
//! Results are memoized in a [`GeocodeCache`] the caller owns for one run.

use std::cell::Cell;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Account, AccountError, Coordinate};
use crate::traits::Geocoder;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("geocoder returned {status}: {message}")]
    Status { status: String, message: String },
    #[error("no geocoding API key configured")]
    MissingApiKey,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeocoderConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
    /// Attempts per address, including the first.
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Minimum spacing between consecutive requests, retries included.
    pub min_request_interval_ms: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
            max_retries: 3,
            retry_delay_ms: 1000,
            // Ten requests per 1.1 s.
            min_request_interval_ms: 110,
        }
    }
}

impl GeocoderConfig {
    /// Defaults overridden by `GOOGLE_GEOCODING_API_KEY` and `GEOCODER_BASE_URL`.
    pub fn from_env() -> Result<Self, GeocodeError> {
        let api_key = std::env::var("GOOGLE_GEOCODING_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(GeocodeError::MissingApiKey)?;

        let mut config = Self {
            api_key,
            ..Self::default()
        };
        if let Ok(base_url) = std::env::var("GEOCODER_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }
}

/// Spaces out calls so consecutive ones start at least `interval` apart.
#[derive(Debug, Clone)]
pub struct RequestThrottle {
    interval: Duration,
    last: Cell<Option<Instant>>,
}

impl RequestThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Cell::new(None),
        }
    }

    /// Block until the next call may start, then mark it as started.
    /// Returns the recorded start.
    pub fn wait(&self) -> Instant {
        if let Some(last) = self.last.get() {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                std::thread::sleep(self.interval - elapsed);
            }
        }
        let now = Instant::now();
        self.last.set(Some(now));
        now
    }
}

/// Google Geocoding API client.
#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    config: GeocoderConfig,
    client: reqwest::blocking::Client,
    throttle: RequestThrottle,
}

impl GoogleGeocoder {
    pub fn new(config: GeocoderConfig) -> Result<Self, GeocodeError> {
        if config.api_key.is_empty() {
            return Err(GeocodeError::MissingApiKey);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let throttle = RequestThrottle::new(Duration::from_millis(config.min_request_interval_ms));

        Ok(Self {
            config,
            client,
            throttle,
        })
    }

    fn request(&self, address: &str) -> Result<GoogleResponse, GeocodeError> {
        let base_url = self.config.base_url.trim_end_matches('/');
        let url = format!("{base_url}/maps/api/geocode/json");
        self.throttle.wait();
        let response = self
            .client
            .get(url)
            .query(&[("address", address), ("key", self.config.api_key.as_str())])
            .send()?
            .error_for_status()?
            .json::<GoogleResponse>()?;
        Ok(response)
    }
}

impl Geocoder for GoogleGeocoder {
    fn geocode(&self, address: &str) -> Result<Option<Coordinate>, GeocodeError> {
        let attempts = self.config.max_retries.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            let mut delay = Duration::from_millis(self.config.retry_delay_ms);
            match self.request(address) {
                Ok(body) => match body.status.as_str() {
                    "OK" => {
                        return Ok(body.results.first().map(|result| {
                            let location = &result.geometry.location;
                            Coordinate::new(location.lat, location.lng)
                        }));
                    }
                    "ZERO_RESULTS" => return Ok(None),
                    status => {
                        if status == "OVER_QUERY_LIMIT" {
                            delay *= 2;
                        }
                        last_error = Some(GeocodeError::Status {
                            status: status.to_string(),
                            message: body.error_message.unwrap_or_default(),
                        });
                    }
                },
                Err(err) => last_error = Some(err),
            }

            if attempt < attempts {
                tracing::debug!(address, attempt, "retrying geocode");
                std::thread::sleep(delay);
            }
        }

        Err(last_error.unwrap_or(GeocodeError::Status {
            status: "UNKNOWN_ERROR".to_string(),
            message: String::new(),
        }))
    }
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    status: String,
    #[serde(default)]
    results: Vec<GoogleResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleResult {
    geometry: GoogleGeometry,
}

#[derive(Debug, Deserialize)]
struct GoogleGeometry {
    location: GoogleLocation,
}

#[derive(Debug, Deserialize)]
struct GoogleLocation {
    lat: f64,
    lng: f64,
}

/// Lookup results for one run, keyed by address. Misses are cached too.
#[derive(Debug, Clone, Default)]
pub struct GeocodeCache {
    entries: HashMap<String, Option<Coordinate>>,
}

impl GeocodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` if never looked up, `Some(None)` for a cached miss.
    pub fn get(&self, address: &str) -> Option<Option<Coordinate>> {
        self.entries.get(address).copied()
    }

    pub fn insert(&mut self, address: impl Into<String>, result: Option<Coordinate>) {
        self.entries.insert(address.into(), result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeocodeFailure {
    #[error("no match for address")]
    NoMatch,
    #[error("{0}")]
    Service(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeReport {
    pub processed: usize,
    pub geocoded: usize,
    /// Accounts that already had coordinates or have no usable address.
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<AccountError<GeocodeFailure>>,
}

/// Single-line address for an account.
///
/// The street line is required. City, state and ZIP are appended when
/// present; a street line alone is taken to be a full address already.
pub fn account_address(account: &Account) -> Option<String> {
    let non_empty = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
    };

    let street = non_empty(&account.address)?;
    let mut parts = vec![street];
    if let Some(city) = non_empty(&account.city) {
        parts.push(city);
    }
    let region = [non_empty(&account.state), non_empty(&account.zip)]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    if !region.is_empty() {
        parts.push(region);
    }

    Some(parts.join(", "))
}

/// Fill in coordinates for accounts that lack them.
///
/// Each distinct address is sent to `geocoder` at most once per cache.
/// Service errors are cached as misses so a failing address is not retried
/// for every account sharing it.
pub fn geocode_accounts<G: Geocoder>(
    accounts: &mut [Account],
    geocoder: &G,
    cache: &mut GeocodeCache,
) -> GeocodeReport {
    let mut report = GeocodeReport {
        processed: accounts.len(),
        ..GeocodeReport::default()
    };
    let mut service_errors: HashMap<String, String> = HashMap::new();

    for account in accounts.iter_mut() {
        if account.has_position() {
            report.skipped += 1;
            continue;
        }
        let Some(address) = account_address(account) else {
            report.skipped += 1;
            continue;
        };

        let result = match cache.get(&address) {
            Some(cached) => cached,
            None => {
                let looked_up = match geocoder.geocode(&address) {
                    Ok(found) => found,
                    Err(err) => {
                        tracing::warn!(%address, error = %err, "geocoding failed");
                        service_errors.insert(address.clone(), err.to_string());
                        None
                    }
                };
                cache.insert(address.clone(), looked_up);
                looked_up
            }
        };

        match result {
            Some(position) => {
                account.latitude = Some(position.lat);
                account.longitude = Some(position.lng);
                report.geocoded += 1;
            }
            None => {
                let error = match service_errors.get(&address) {
                    Some(message) => GeocodeFailure::Service(message.clone()),
                    None => GeocodeFailure::NoMatch,
                };
                report.failed += 1;
                report.failures.push(AccountError {
                    account_id: account.id.clone(),
                    error,
                });
            }
        }
    }

    tracing::info!(
        processed = report.processed,
        geocoded = report.geocoded,
        skipped = report.skipped,
        failed = report.failed,
        cached = cache.len(),
        "geocoding complete"
    );

    report
}
