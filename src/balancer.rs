//! Capacity-constrained greedy placement of pools onto technician routes.

use serde::{Deserialize, Serialize};

use crate::haversine::haversine_miles;
use crate::model::{Account, Coordinate};
use crate::worker::Worker;

/// Hard per-route limits. A route at either limit is not considered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BalanceConstraints {
    pub max_pools_per_worker: u32,
    pub max_weekly_visits_per_worker: u32,
}

impl Default for BalanceConstraints {
    fn default() -> Self {
        Self {
            max_pools_per_worker: 30,
            max_weekly_visits_per_worker: 55,
        }
    }
}

/// Weights of the placement score. Lower scores win.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringWeights {
    /// Added per weekly visit already on the route.
    pub visit_weight: f64,
    /// Added per pool already on the route.
    pub pool_weight: f64,
    /// Per-day visit count at which a day counts as overloaded.
    pub day_overload_threshold: u32,
    /// Added for each of the pool's days that is overloaded on the route.
    pub day_overload_penalty: f64,
    /// Distance (miles) used for a route with no centroid yet.
    pub empty_worker_distance: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            visit_weight: 0.3,
            pool_weight: 0.2,
            day_overload_threshold: 15,
            day_overload_penalty: 5.0,
            empty_worker_distance: 10.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BalanceOptions {
    pub constraints: BalanceConstraints,
    pub weights: ScoringWeights,
}

/// Why a pool was left off every route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnassignedReason {
    /// Every route is at its pool or weekly-visit limit for this pool.
    AtCapacity,
    /// The pool has no coordinates to score against.
    MissingCoordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub account_id: String,
    pub worker_id: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnassignedPool {
    pub account: Account,
    pub reason: UnassignedReason,
}

/// Routes after placement, plus one outcome per input pool.
///
/// `assignments` and `unassigned` are each in processing order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResult {
    pub workers: Vec<Worker>,
    pub assignments: Vec<Assignment>,
    pub unassigned: Vec<UnassignedPool>,
}

/// Place pools onto workers greedily.
///
/// Pools are processed in ascending order of [`Account::weekly_visits`], the
/// same figure the capacity check charges (stable, so input order breaks
/// ties). A pool with only unknown days therefore sorts with the single-visit
/// pools. Single-visit pools go first, leaving room for the harder
/// multi-visit ones. Each pool goes to the eligible worker with the lowest
/// score, the earliest worker in roster order winning ties. Pools no worker
/// can take are reported, never dropped.
pub fn assign_pools(
    pools: Vec<Account>,
    workers: Vec<Worker>,
    options: &BalanceOptions,
) -> BalanceResult {
    let mut workers = workers;
    let mut assignments = Vec::new();
    let mut unassigned = Vec::new();

    let mut pools = pools;
    pools.sort_by_key(Account::weekly_visits);

    let total = pools.len();
    for pool in pools {
        let position = match pool.position() {
            Ok(position) => position,
            Err(error) => {
                tracing::warn!(account = %pool.id, %error, "pool cannot be placed");
                unassigned.push(UnassignedPool {
                    account: pool,
                    reason: UnassignedReason::MissingCoordinates,
                });
                continue;
            }
        };

        let Some((index, score)) = best_worker(&pool, position, &workers, options) else {
            tracing::warn!(
                account = %pool.id,
                visits = pool.weekly_visits(),
                "all workers at capacity"
            );
            unassigned.push(UnassignedPool {
                account: pool,
                reason: UnassignedReason::AtCapacity,
            });
            continue;
        };

        let worker = &mut workers[index];
        tracing::debug!(account = %pool.id, worker = %worker.id, score, "pool placed");
        assignments.push(Assignment {
            account_id: pool.id.clone(),
            worker_id: worker.id.clone(),
            score,
        });
        worker.commit(pool);
    }

    tracing::info!(
        pools = total,
        assigned = assignments.len(),
        unassigned = unassigned.len(),
        "pool balancing complete"
    );

    BalanceResult {
        workers,
        assignments,
        unassigned,
    }
}

/// Index and score of the lowest-scoring eligible worker.
fn best_worker(
    pool: &Account,
    position: Coordinate,
    workers: &[Worker],
    options: &BalanceOptions,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;

    for (index, worker) in workers.iter().enumerate() {
        if !is_eligible(pool, worker, &options.constraints) {
            continue;
        }

        let score = score(pool, position, worker, &options.weights);
        if best.is_none_or(|(_, best_score)| score < best_score) {
            best = Some((index, score));
        }
    }

    best
}

fn is_eligible(pool: &Account, worker: &Worker, constraints: &BalanceConstraints) -> bool {
    worker.pool_count() < constraints.max_pools_per_worker
        && worker.total_visits() + pool.weekly_visits() <= constraints.max_weekly_visits_per_worker
}

/// Placement score of `pool` on `worker`; lower is better.
pub fn score(
    pool: &Account,
    position: Coordinate,
    worker: &Worker,
    weights: &ScoringWeights,
) -> f64 {
    let distance = match worker.centroid() {
        Some(centroid) => haversine_miles(position, centroid),
        None => weights.empty_worker_distance,
    };

    let overloaded_days = pool
        .scheduled_days()
        .into_iter()
        .filter(|day| worker.visits_on(*day) >= weights.day_overload_threshold)
        .count();

    distance
        + weights.visit_weight * f64::from(worker.total_visits())
        + weights.pool_weight * f64::from(worker.pool_count())
        + weights.day_overload_penalty * overloaded_days as f64
}
