//! Turning a raw account snapshot into seeded routes and pools to place.

use std::collections::HashMap;

use crate::model::Account;
use crate::worker::{Worker, WorkerSpec};

/// Merge accounts that share an id.
///
/// The first occurrence is kept; later duplicates only contribute service
/// days it does not already have. Output keeps first-occurrence order.
pub fn dedupe_accounts(accounts: Vec<Account>) -> Vec<Account> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<Account> = Vec::new();
    let mut merged = 0usize;

    for account in accounts {
        if let Some(&slot) = seen.get(&account.id) {
            let existing = &mut unique[slot];
            for day in account.days {
                if !existing.days.contains(&day) {
                    existing.days.push(day);
                }
            }
            merged += 1;
            continue;
        }
        seen.insert(account.id.clone(), unique.len());
        unique.push(account);
    }

    if merged > 0 {
        tracing::debug!(merged, unique = unique.len(), "merged duplicate accounts");
    }

    unique
}

/// Routes seeded with their current accounts, and everything else as pools.
#[derive(Debug, Clone)]
pub struct PreparedRoster {
    pub workers: Vec<Worker>,
    pub pools: Vec<Account>,
}

/// Split a snapshot between the roster's routes and the pool queue.
///
/// Accounts already on a roster route are seeded onto it, ignoring capacity
/// limits. All other accounts, including ones on routes outside the roster,
/// become pools. Duplicate ids are merged first.
pub fn prepare_roster(specs: &[WorkerSpec], accounts: Vec<Account>) -> PreparedRoster {
    let mut workers: Vec<Worker> = specs.iter().map(Worker::from_spec).collect();
    let index: HashMap<String, usize> = specs
        .iter()
        .enumerate()
        .map(|(i, spec)| (spec.id.clone(), i))
        .collect();

    let mut pools = Vec::new();
    for account in dedupe_accounts(accounts) {
        let slot = account.worker.as_ref().and_then(|worker| index.get(worker)).copied();
        match slot {
            Some(slot) => workers[slot].seed(account),
            None => pools.push(account),
        }
    }

    for worker in &mut workers {
        worker.refresh_centroid();
        tracing::info!(
            worker = %worker.id,
            pools = worker.pool_count(),
            visits = worker.total_visits(),
            "seeded route"
        );
    }

    PreparedRoster { workers, pools }
}
