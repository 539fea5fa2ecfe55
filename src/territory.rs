//! North / Central / South territory labelling from two boundary lines.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::boundary::{BoundaryLine, is_north_of};
use crate::model::{Account, AccountError, Coordinate, GeometryError};

/// Territory produced by boundary classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Territory {
    North,
    Central,
    South,
}

impl Territory {
    pub fn as_str(self) -> &'static str {
        match self {
            Territory::North => "North",
            Territory::Central => "Central",
            Territory::South => "South",
        }
    }
}

impl fmt::Display for Territory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The pair of lines splitting a metro into three bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerritoryBoundaries {
    pub north: BoundaryLine,
    pub south: BoundaryLine,
}

/// Label a point.
///
/// North of the north line wins over south of the south line, so a point
/// satisfying both (crossed or overlapping lines) is `North`.
pub fn assign_territory(point: Coordinate, boundaries: &TerritoryBoundaries) -> Territory {
    let north = is_north_of(point, &boundaries.north);
    let south = !is_north_of(point, &boundaries.south);

    if north {
        Territory::North
    } else if south {
        Territory::South
    } else {
        Territory::Central
    }
}

/// Outcome of relabelling a batch of accounts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerritoryReport {
    /// Accounts per new label.
    pub distribution: BTreeMap<Territory, usize>,
    /// Accounts whose label did not change.
    pub unchanged: usize,
    /// `"From->To"` label transitions, keyed by the previous label.
    pub transitions: BTreeMap<String, usize>,
    pub errors: Vec<AccountError<GeometryError>>,
}

impl TerritoryReport {
    pub fn classified(&self) -> usize {
        self.distribution.values().sum()
    }
}

/// Relabel every account with a position.
///
/// The previous label moves to `original_territory`. Accounts without
/// coordinates keep their fields untouched and are reported as errors.
pub fn assign_territories(
    accounts: &mut [Account],
    boundaries: &TerritoryBoundaries,
) -> TerritoryReport {
    let mut report = TerritoryReport::default();

    for account in accounts.iter_mut() {
        let point = match account.position() {
            Ok(point) => point,
            Err(error) => {
                tracing::warn!(account = %account.id, %error, "skipping territory assignment");
                report.errors.push(AccountError {
                    account_id: account.id.clone(),
                    error,
                });
                continue;
            }
        };

        let territory = assign_territory(point, boundaries);
        *report.distribution.entry(territory).or_default() += 1;

        let previous = account.territory.take();
        match previous.as_deref() {
            Some(label) if label == territory.as_str() => report.unchanged += 1,
            Some(label) => {
                *report
                    .transitions
                    .entry(format!("{}->{}", label, territory))
                    .or_default() += 1;
            }
            None => {
                *report
                    .transitions
                    .entry(format!("Unassigned->{}", territory))
                    .or_default() += 1;
            }
        }

        account.original_territory = previous;
        account.territory = Some(territory.as_str().to_string());
    }

    tracing::info!(
        classified = report.classified(),
        unchanged = report.unchanged,
        rejected = report.errors.len(),
        "territory assignment complete"
    );

    report
}
