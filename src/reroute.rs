//! Min/max rerouting: rebuild every route around per-technician pool targets.
//!
//! Unlike [`crate::balancer`], which tops up existing routes under global
//! limits, a reroute redistributes the whole snapshot in three passes:
//!
//! 1. Keep each account on its current route when the route's territory
//!    matches the account's, up to the route's `max`.
//! 2. Within each territory, hand the rest to the route furthest below its
//!    `min` that still has room, re-ranking after every account.
//! 3. Point new hires at the territories with the most accounts left over,
//!    fill them up to their `max`, and leave the remainder to the floaters.

use std::cmp::Reverse;

use serde::Serialize;

use crate::model::{Account, AccountError, GeometryError};
use crate::worker::{Worker, WorkerSpec};

/// How an account ended up where it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RerouteStatus {
    Kept,
    Reassigned,
    NewHire,
    Floater,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RerouteAssignment {
    pub account_id: String,
    /// `None` for accounts left to the floater pool.
    pub worker_id: Option<String>,
    pub territory: Option<String>,
    pub status: RerouteStatus,
}

/// Route size against its target.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    pub worker_id: String,
    pub name: String,
    pub territory: Option<String>,
    pub is_new_hire: bool,
    pub pool_count: u32,
    pub min: Option<u32>,
    pub max: Option<u32>,
    pub kept: u32,
    pub added: u32,
    /// Always true for a route without both bounds.
    pub meets_target: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RerouteResult {
    /// Routes with targets in roster order, then new hires in roster order.
    pub workers: Vec<Worker>,
    pub routes: Vec<RouteSummary>,
    /// One entry per placed account, in pass order, floaters last.
    pub assignments: Vec<RerouteAssignment>,
    pub floater_pool: Vec<Account>,
    /// Roster entries flagged as floaters; they cover `floater_pool`.
    pub floaters: Vec<WorkerSpec>,
    /// Accounts without coordinates, left out of the run.
    pub skipped: Vec<AccountError<GeometryError>>,
}

struct Route<'a> {
    spec: &'a WorkerSpec,
    worker: Worker,
}

impl Route<'_> {
    fn has_room(&self) -> bool {
        self.spec.max.is_none_or(|max| self.worker.pool_count() < max)
    }

    /// Pools still needed to reach `min`; negative once past it.
    fn shortfall(&self) -> i64 {
        i64::from(self.spec.min.unwrap_or(0)) - i64::from(self.worker.pool_count())
    }

    fn territory(&self) -> Option<&str> {
        self.worker.territory.as_deref()
    }
}

/// A regular route has both bounds and is neither a floater nor a new hire.
fn is_regular(spec: &WorkerSpec) -> bool {
    !spec.is_floater && !spec.is_new_hire && spec.min.is_some() && spec.max.is_some()
}

fn territory_of(account: &Account) -> Option<&str> {
    account.territory.as_deref().map(str::trim).filter(|label| !label.is_empty())
}

/// Redistribute `accounts` across the roster in `specs`.
///
/// Accounts need a position and a territory label; those without a position
/// are skipped, those without a label go straight to the floater pool.
/// Within a pass accounts are taken in input order.
pub fn reroute(specs: &[WorkerSpec], accounts: Vec<Account>) -> RerouteResult {
    let mut skipped = Vec::new();
    let mut pending: Vec<Option<Account>> = Vec::with_capacity(accounts.len());
    for account in accounts {
        match account.position() {
            Ok(_) => pending.push(Some(account)),
            Err(error) => {
                tracing::warn!(account = %account.id, %error, "account left out of reroute");
                skipped.push(AccountError {
                    account_id: account.id,
                    error,
                });
            }
        }
    }

    let mut routes: Vec<Route> = specs
        .iter()
        .filter(|spec| is_regular(spec))
        .map(|spec| Route {
            spec,
            worker: Worker::from_spec(spec),
        })
        .collect();
    let mut assignments = Vec::new();

    keep_current_routes(&mut routes, &mut pending, &mut assignments);
    let territories = route_territories(&routes);
    for territory in &territories {
        fill_territory(territory, &mut routes, &mut pending, &mut assignments);
    }

    let first_new_hire = routes.len();
    let leftover = leftover_by_territory(territories, &pending);
    for (i, spec) in specs.iter().filter(|spec| spec.is_new_hire).enumerate() {
        let mut worker = Worker::from_spec(spec);
        worker.territory = (!leftover.is_empty()).then(|| leftover[i % leftover.len()].0.clone());
        tracing::info!(worker = %worker.id, territory = ?worker.territory, "new hire placed");
        routes.push(Route { spec, worker });
    }
    for route in &mut routes[first_new_hire..] {
        fill_new_hire(route, &mut pending, &mut assignments);
    }

    let mut floater_pool = Vec::new();
    for mut account in pending.into_iter().flatten() {
        account.original_worker = account.worker.take();
        assignments.push(RerouteAssignment {
            account_id: account.id.clone(),
            worker_id: None,
            territory: account.territory.clone(),
            status: RerouteStatus::Floater,
        });
        floater_pool.push(account);
    }

    let mut workers = Vec::with_capacity(routes.len());
    let mut summaries = Vec::with_capacity(routes.len());
    for mut route in routes {
        route.worker.refresh_centroid();
        let summary = summarize(&route);
        tracing::info!(
            worker = %summary.worker_id,
            pools = summary.pool_count,
            kept = summary.kept,
            added = summary.added,
            meets_target = summary.meets_target,
            "route rebuilt"
        );
        summaries.push(summary);
        workers.push(route.worker);
    }

    tracing::info!(
        routed = assignments.len() - floater_pool.len(),
        floaters = floater_pool.len(),
        skipped = skipped.len(),
        "reroute complete"
    );

    RerouteResult {
        workers,
        routes: summaries,
        assignments,
        floater_pool,
        floaters: specs.iter().filter(|spec| spec.is_floater).cloned().collect(),
        skipped,
    }
}

fn keep_current_routes(
    routes: &mut [Route],
    pending: &mut [Option<Account>],
    assignments: &mut Vec<RerouteAssignment>,
) {
    for slot in pending.iter_mut() {
        let Some(index) = slot.as_ref().and_then(|account| current_route(routes, account)) else {
            continue;
        };
        if let Some(account) = slot.take() {
            let route = &mut routes[index];
            assignments.push(record(&account, &route.worker, RerouteStatus::Kept));
            route.worker.seed(account);
        }
    }
}

/// The account's current route, if it serves the account's territory and has room.
fn current_route(routes: &[Route], account: &Account) -> Option<usize> {
    let territory = territory_of(account)?;
    let worker = account.worker.as_deref()?;
    let index = routes.iter().position(|route| route.spec.id == worker)?;
    let route = &routes[index];
    (route.territory() == Some(territory) && route.has_room()).then_some(index)
}

/// Distinct route territories in roster order.
fn route_territories(routes: &[Route]) -> Vec<String> {
    let mut territories: Vec<String> = Vec::new();
    for territory in routes.iter().filter_map(Route::territory) {
        if !territories.iter().any(|seen| seen == territory) {
            territories.push(territory.to_string());
        }
    }
    territories
}

fn fill_territory(
    territory: &str,
    routes: &mut [Route],
    pending: &mut [Option<Account>],
    assignments: &mut Vec<RerouteAssignment>,
) {
    let mut order: Vec<usize> = (0..routes.len())
        .filter(|&i| routes[i].territory() == Some(territory))
        .collect();
    rank(&mut order, routes);

    for slot in pending.iter_mut() {
        if slot.as_ref().and_then(|account| territory_of(account)) != Some(territory) {
            continue;
        }
        if let Some(index) = order.iter().copied().find(|&i| routes[i].has_room()) {
            if let Some(account) = slot.take() {
                let worker = &mut routes[index].worker;
                assignments.push(record(&account, worker, RerouteStatus::Reassigned));
                worker.commit(account);
            }
        }
        rank(&mut order, routes);
    }
}

/// Furthest below `min` first. Stable, so equal shortfalls keep their order.
fn rank(order: &mut [usize], routes: &[Route]) {
    order.sort_by_key(|&i| Reverse(routes[i].shortfall()));
}

/// Leftover account counts per territory, largest first.
///
/// Route territories come first, so they win ties against labels only
/// accounts carry.
fn leftover_by_territory(
    territories: Vec<String>,
    pending: &[Option<Account>],
) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = territories.into_iter().map(|t| (t, 0)).collect();
    for territory in pending.iter().flatten().filter_map(territory_of) {
        match counts.iter_mut().find(|(label, _)| label == territory) {
            Some((_, count)) => *count += 1,
            None => counts.push((territory.to_string(), 1)),
        }
    }
    counts.sort_by_key(|(_, count)| Reverse(*count));
    counts
}

fn fill_new_hire(
    route: &mut Route,
    pending: &mut [Option<Account>],
    assignments: &mut Vec<RerouteAssignment>,
) {
    let Some(territory) = route.worker.territory.clone() else {
        return;
    };
    for slot in pending.iter_mut() {
        if !route.has_room() {
            break;
        }
        if slot.as_ref().and_then(|account| territory_of(account)) != Some(territory.as_str()) {
            continue;
        }
        if let Some(account) = slot.take() {
            assignments.push(record(&account, &route.worker, RerouteStatus::NewHire));
            route.worker.commit(account);
        }
    }
}

fn record(account: &Account, worker: &Worker, status: RerouteStatus) -> RerouteAssignment {
    RerouteAssignment {
        account_id: account.id.clone(),
        worker_id: Some(worker.id.clone()),
        territory: territory_of(account).map(str::to_string),
        status,
    }
}

fn summarize(route: &Route) -> RouteSummary {
    let load = route.worker.load_summary();
    let meets_target = match (route.spec.min, route.spec.max) {
        (Some(min), Some(max)) => (min..=max).contains(&load.pool_count),
        _ => true,
    };
    RouteSummary {
        worker_id: load.worker_id,
        name: load.name,
        territory: route.worker.territory.clone(),
        is_new_hire: route.spec.is_new_hire,
        pool_count: load.pool_count,
        min: route.spec.min,
        max: route.spec.max,
        kept: load.kept,
        added: load.added,
        meets_target,
    }
}
