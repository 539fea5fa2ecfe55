//! Technician route state: assigned accounts and running load totals.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::centroid::centroid;
use crate::model::{Account, Coordinate, ServiceDay};

/// Roster entry describing a technician before any accounts are loaded.
///
/// `min`/`max` and the floater/new-hire flags only matter to
/// [`crate::reroute`]; the capacity balancer uses global limits instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerSpec {
    /// Route identifier accounts refer to, e.g. "15 AFP Route Kymani P".
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub territory: Option<String>,
    /// Target route size, in pools.
    #[serde(default)]
    pub min: Option<u32>,
    #[serde(default)]
    pub max: Option<u32>,
    #[serde(default)]
    pub is_floater: bool,
    /// Not yet placed in a territory; one is picked during a reroute.
    #[serde(default)]
    pub is_new_hire: bool,
}

/// A technician route and its current load.
///
/// `pool_count` always equals `accounts.len()` and `total_visits` always
/// equals the sum of `day_visits`; both are only changed through
/// [`Worker::seed`] and [`Worker::commit`]. Deserialized routes rebuild
/// their totals from `accounts` and ignore any stored counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredWorker")]
pub struct Worker {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub territory: Option<String>,
    accounts: Vec<Account>,
    pool_count: u32,
    total_visits: u32,
    day_visits: BTreeMap<ServiceDay, u32>,
    centroid: Option<Coordinate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredWorker {
    id: String,
    name: String,
    #[serde(default)]
    territory: Option<String>,
    #[serde(default)]
    accounts: Vec<Account>,
}

impl From<StoredWorker> for Worker {
    fn from(stored: StoredWorker) -> Self {
        let mut worker = Worker::new(stored.id, stored.name);
        worker.territory = stored.territory;
        for account in stored.accounts {
            worker.push(account);
        }
        worker.refresh_centroid();
        worker
    }
}

impl Worker {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            territory: None,
            accounts: Vec::new(),
            pool_count: 0,
            total_visits: 0,
            day_visits: BTreeMap::new(),
            centroid: None,
        }
    }

    pub fn from_spec(spec: &WorkerSpec) -> Self {
        let mut worker = Self::new(spec.id.clone(), spec.name.clone());
        worker.territory = spec.territory.clone();
        worker
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn pool_count(&self) -> u32 {
        self.pool_count
    }

    pub fn total_visits(&self) -> u32 {
        self.total_visits
    }

    pub fn visits_on(&self, day: ServiceDay) -> u32 {
        self.day_visits.get(&day).copied().unwrap_or(0)
    }

    pub fn day_visits(&self) -> &BTreeMap<ServiceDay, u32> {
        &self.day_visits
    }

    pub fn centroid(&self) -> Option<Coordinate> {
        self.centroid
    }

    /// Load an account the route already serves.
    ///
    /// Capacity is not checked; existing routes may start over the limits.
    /// The centroid is left stale until [`Worker::refresh_centroid`].
    pub fn seed(&mut self, mut account: Account) {
        account.original_worker = account.worker.clone();
        account.worker = Some(self.id.clone());
        account.reassigned = false;
        self.push(account);
    }

    /// Place a pool on this route as a reassignment.
    ///
    /// The previous worker and territory are kept for audit, and the centroid
    /// is recomputed.
    pub fn commit(&mut self, mut account: Account) {
        account.original_worker = account.worker.take();
        account.original_territory = account.territory.clone();
        if let Some(territory) = &self.territory {
            account.territory = Some(territory.clone());
        }
        account.worker = Some(self.id.clone());
        account.reassigned = true;
        self.push(account);
        self.refresh_centroid();
    }

    pub fn refresh_centroid(&mut self) {
        self.centroid = centroid(&self.accounts);
    }

    fn push(&mut self, account: Account) {
        for day in account.scheduled_days() {
            *self.day_visits.entry(day).or_default() += 1;
            self.total_visits += 1;
        }
        self.pool_count += 1;
        self.accounts.push(account);
    }

    pub fn load_summary(&self) -> WorkerLoad {
        let added = self.accounts.iter().filter(|account| account.reassigned).count() as u32;
        WorkerLoad {
            worker_id: self.id.clone(),
            name: self.name.clone(),
            pool_count: self.pool_count,
            kept: self.accounts.len() as u32 - added,
            added,
            total_visits: self.total_visits,
            day_visits: self.day_visits.clone(),
            centroid: self.centroid,
        }
    }
}

/// Per-route load for run output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerLoad {
    pub worker_id: String,
    pub name: String,
    pub pool_count: u32,
    /// Accounts the route already served.
    pub kept: u32,
    /// Accounts placed by the balancer.
    pub added: u32,
    pub total_visits: u32,
    pub day_visits: BTreeMap<ServiceDay, u32>,
    pub centroid: Option<Coordinate>,
}
