//! Realistic pipeline tests using real Miami-Dade locations.
//!
//! These tests run the full offline flow: classify accounts against the
//! traced boundaries, roll them up by ZIP, and rebalance a departing route.

mod fixtures;

use territory_planner::balancer::{BalanceOptions, assign_pools};
use territory_planner::boundary::is_north_of;
use territory_planner::model::{Account, AccountType, ServiceDay};
use territory_planner::roster::prepare_roster;
use territory_planner::territory::{Territory, assign_territories, assign_territory};
use territory_planner::worker::WorkerSpec;
use territory_planner::zip::{aggregate_by_zip, territory_totals};

use fixtures::miami_locations::{self, Location};

// ============================================================================
// Test Infrastructure
// ============================================================================

fn account_at(id: &str, location: &Location) -> Account {
    let mut account = Account::new(id);
    account.name = Some(location.name.to_string());
    account.latitude = Some(location.lat);
    account.longitude = Some(location.lng);
    account.zip = Some(location.zip.to_string());
    account.city = Some("Miami".to_string());
    account.monthly_price = 150.0;
    account.yearly_price = 1800.0;
    account.account_type = Some(AccountType::Residential);
    account.days = vec![ServiceDay::Wednesday];
    account
}

fn all_accounts() -> Vec<Account> {
    let mut accounts = Vec::new();
    for (band, locations) in [
        ("n", miami_locations::NORTH),
        ("c", miami_locations::CENTRAL),
        ("s", miami_locations::SOUTH),
    ] {
        for (i, location) in locations.iter().enumerate() {
            accounts.push(account_at(&format!("{band}{i}"), location));
        }
    }
    accounts
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn test_locations_fall_in_expected_bands() {
    let boundaries = miami_locations::miami_boundaries();

    for (expected, locations) in [
        (Territory::North, miami_locations::NORTH),
        (Territory::Central, miami_locations::CENTRAL),
        (Territory::South, miami_locations::SOUTH),
    ] {
        for location in locations {
            let territory = assign_territory(location.coords(), &boundaries);
            assert_eq!(territory, expected, "{}", location.name);
        }
    }
}

#[test]
fn test_boundary_vertices_are_not_north_of_their_own_line() {
    let boundaries = miami_locations::miami_boundaries();
    for line in [&boundaries.north, &boundaries.south] {
        assert!(line.is_monotonic());
        for vertex in line.vertices() {
            assert!(!is_north_of(*vertex, line), "{} vertex {:?}", line.name(), vertex);
        }
    }
}

#[test]
fn test_relabel_snapshot_and_report_changes() {
    let boundaries = miami_locations::miami_boundaries();
    let mut accounts = all_accounts();
    // Pretend the old hand-drawn map put everything in Central.
    for account in &mut accounts {
        account.territory = Some("Central".to_string());
    }
    accounts.push(Account::new("not-geocoded"));

    let report = assign_territories(&mut accounts, &boundaries);

    assert_eq!(report.classified(), 15);
    assert_eq!(report.unchanged, 5);
    assert_eq!(report.transitions.get("Central->North"), Some(&5));
    assert_eq!(report.transitions.get("Central->South"), Some(&5));
    assert_eq!(report.errors.len(), 1);
    assert!(accounts[..15].iter().all(|a| a.original_territory.as_deref() == Some("Central")));
}

// ============================================================================
// ZIP Rollup
// ============================================================================

#[test]
fn test_zip_rollup_after_classification() {
    let boundaries = miami_locations::miami_boundaries();
    let mut accounts = all_accounts();
    let mut no_zip = account_at("no-zip", &miami_locations::CENTRAL[0]);
    no_zip.zip = None;
    accounts.push(no_zip);

    assign_territories(&mut accounts, &boundaries);
    let summaries = aggregate_by_zip(&accounts);

    let total: usize = summaries.iter().map(|s| s.total_accounts).sum();
    let with_zip = accounts.iter().filter(|a| a.zip_code().is_some()).count();
    assert_eq!(total, with_zip);

    // Kendall and Pinecrest share 33156.
    let kendall = summaries.iter().find(|s| s.zip == "33156").unwrap();
    assert_eq!(kendall.total_accounts, 2);
    assert_eq!(kendall.territory, "South");
    assert_eq!(kendall.total_monthly_revenue, 300.0);
    assert_eq!(kendall.residential_count, 2);

    let zips: Vec<&str> = summaries.iter().map(|s| s.zip.as_str()).collect();
    let mut sorted = zips.clone();
    sorted.sort();
    assert_eq!(zips, sorted);

    let totals = territory_totals(&summaries);
    assert_eq!(totals.iter().map(|(_, n)| n).sum::<usize>(), 15);
}

// ============================================================================
// Rebalancing
// ============================================================================

#[test]
fn test_departing_route_split_between_north_and_south_routes() {
    let boundaries = miami_locations::miami_boundaries();

    let mut accounts = Vec::new();
    for (i, location) in miami_locations::NORTH.iter().take(3).enumerate() {
        let mut account = account_at(&format!("north-{i}"), location);
        account.worker = Some("north-route".to_string());
        accounts.push(account);
    }
    for (i, location) in miami_locations::SOUTH.iter().take(3).enumerate() {
        let mut account = account_at(&format!("south-{i}"), location);
        account.worker = Some("south-route".to_string());
        accounts.push(account);
    }
    // The departing route covered the far ends of both bands.
    for (id, location) in [
        ("leaving-1", &miami_locations::NORTH[3]),
        ("leaving-2", &miami_locations::SOUTH[4]),
        ("leaving-3", &miami_locations::NORTH[4]),
        ("leaving-4", &miami_locations::SOUTH[3]),
    ] {
        let mut account = account_at(id, location);
        account.worker = Some("leaving-route".to_string());
        accounts.push(account);
    }
    assign_territories(&mut accounts, &boundaries);

    let specs = vec![
        WorkerSpec {
            id: "north-route".to_string(),
            name: "North Tech".to_string(),
            territory: Some("North".to_string()),
            ..WorkerSpec::default()
        },
        WorkerSpec {
            id: "south-route".to_string(),
            name: "South Tech".to_string(),
            territory: Some("South".to_string()),
            ..WorkerSpec::default()
        },
    ];
    let roster = prepare_roster(&specs, accounts);
    let result = assign_pools(roster.pools, roster.workers, &BalanceOptions::default());

    assert!(result.unassigned.is_empty());
    for assignment in &result.assignments {
        let expected = match assignment.account_id.as_str() {
            "leaving-1" | "leaving-3" => "north-route",
            _ => "south-route",
        };
        assert_eq!(assignment.worker_id, expected, "{}", assignment.account_id);
    }

    for worker in &result.workers {
        let label = worker.territory.as_deref().unwrap();
        assert!(worker.accounts().iter().all(|a| a.territory.as_deref() == Some(label)));
        let load = worker.load_summary();
        assert_eq!((load.kept, load.added), (3, 2));
        assert_eq!(load.day_visits.get(&ServiceDay::Wednesday), Some(&5));
    }
}
