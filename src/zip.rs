//! Per-ZIP revenue and territory rollups.

use std::collections::HashMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::model::{Account, AccountType};

/// Label counted for accounts that carry no territory.
pub const UNKNOWN_TERRITORY: &str = "Unknown";

/// Territory label counts in the order labels were first seen.
///
/// Insertion order is the tie-break for the dominant territory, so it is
/// kept explicitly rather than left to a hash map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerritoryCounts(Vec<(String, usize)>);

impl TerritoryCounts {
    pub fn increment(&mut self, label: &str) {
        match self.0.iter_mut().find(|(existing, _)| existing == label) {
            Some((_, count)) => *count += 1,
            None => self.0.push((label.to_string(), 1)),
        }
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.0
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(label, count)| (label.as_str(), *count))
    }

    /// Most frequent label; ties go to the label seen first.
    pub fn dominant(&self) -> Option<&str> {
        let mut ranked: Vec<&(String, usize)> = self.0.iter().collect();
        // Stable sort keeps first-seen order among equal counts.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.first().map(|(label, _)| label.as_str())
    }
}

impl Serialize for TerritoryCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, count) in &self.0 {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipSummary {
    pub zip: String,
    pub city: String,
    /// Dominant territory.
    pub territory: String,
    pub territories: TerritoryCounts,
    pub total_monthly_revenue: f64,
    pub total_yearly_revenue: f64,
    pub residential_count: usize,
    pub commercial_count: usize,
    pub total_accounts: usize,
}

impl ZipSummary {
    fn new(zip: &str, city: &str) -> Self {
        Self {
            zip: zip.to_string(),
            city: city.to_string(),
            territory: UNKNOWN_TERRITORY.to_string(),
            territories: TerritoryCounts::default(),
            total_monthly_revenue: 0.0,
            total_yearly_revenue: 0.0,
            residential_count: 0,
            commercial_count: 0,
            total_accounts: 0,
        }
    }

    fn add(&mut self, account: &Account) {
        let territory = account
            .territory
            .as_deref()
            .filter(|label| !label.is_empty())
            .unwrap_or(UNKNOWN_TERRITORY);
        self.territories.increment(territory);

        self.total_monthly_revenue += account.monthly_price;
        self.total_yearly_revenue += account.yearly_price;
        self.total_accounts += 1;

        match account.account_type {
            Some(AccountType::Residential) => self.residential_count += 1,
            Some(AccountType::Commercial) => self.commercial_count += 1,
            None => {}
        }
    }
}

/// Group accounts by ZIP code.
///
/// Accounts without a ZIP are skipped. The city is taken from the first
/// account seen for each ZIP. Output is ordered by ZIP as a string.
pub fn aggregate_by_zip(accounts: &[Account]) -> Vec<ZipSummary> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut summaries: Vec<ZipSummary> = Vec::new();
    let mut skipped = 0usize;

    for account in accounts {
        let Some(zip) = account.zip_code() else {
            skipped += 1;
            continue;
        };

        let slot = *index.entry(zip).or_insert_with(|| {
            summaries.push(ZipSummary::new(zip, account.city.as_deref().unwrap_or("")));
            summaries.len() - 1
        });
        summaries[slot].add(account);
    }

    for summary in &mut summaries {
        if let Some(dominant) = summary.territories.dominant() {
            summary.territory = dominant.to_string();
        }
    }

    summaries.sort_by(|a, b| a.zip.cmp(&b.zip));

    tracing::info!(
        zips = summaries.len(),
        accounts = accounts.len() - skipped,
        skipped,
        "zip aggregation complete"
    );

    summaries
}

/// Accounts per dominant territory, largest first.
///
/// Ties keep the order in which territories first appear in `summaries`.
pub fn territory_totals(summaries: &[ZipSummary]) -> Vec<(String, usize)> {
    let mut totals: Vec<(String, usize)> = Vec::new();
    for summary in summaries {
        match totals.iter_mut().find(|(label, _)| *label == summary.territory) {
            Some((_, count)) => *count += summary.total_accounts,
            None => totals.push((summary.territory.clone(), summary.total_accounts)),
        }
    }
    totals.sort_by(|a, b| b.1.cmp(&a.1));
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: &str, zip: Option<&str>, territory: Option<&str>) -> Account {
        let mut account = Account::new(id);
        account.zip = zip.map(str::to_string);
        account.territory = territory.map(str::to_string);
        account
    }

    #[test]
    fn test_dominant_by_majority() {
        let accounts = vec![
            account("1", Some("33101"), Some("North")),
            account("2", Some("33101"), Some("North")),
            account("3", Some("33101"), Some("South")),
        ];

        let summaries = aggregate_by_zip(&accounts);

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].territory, "North");
        assert_eq!(summaries[0].territories.get("North"), Some(2));
        assert_eq!(summaries[0].territories.get("South"), Some(1));
        assert_eq!(summaries[0].total_accounts, 3);
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let accounts = vec![
            account("1", Some("33101"), Some("South")),
            account("2", Some("33101"), Some("North")),
            account("3", Some("33101"), Some("North")),
            account("4", Some("33101"), Some("South")),
        ];
        assert_eq!(aggregate_by_zip(&accounts)[0].territory, "South");

        let reordered = vec![
            accounts[1].clone(),
            accounts[0].clone(),
            accounts[2].clone(),
            accounts[3].clone(),
        ];
        assert_eq!(aggregate_by_zip(&reordered)[0].territory, "North");
    }

    #[test]
    fn test_strict_majority_wins_in_any_order() {
        // Every placement of 2 South among 5 records, interleaved with another ZIP.
        for first in 0..5 {
            for second in first + 1..5 {
                let mut accounts = Vec::new();
                for i in 0..5 {
                    let label = if i == first || i == second { "South" } else { "North" };
                    accounts.push(account(&format!("a{i}"), Some("33139"), Some(label)));
                    accounts.push(account(&format!("b{i}"), Some("33140"), Some("Central")));
                }

                let summaries = aggregate_by_zip(&accounts);
                assert_eq!(summaries, aggregate_by_zip(&accounts));

                let beach = &summaries[0];
                assert_eq!(beach.zip, "33139");
                assert_eq!(beach.territory, "North", "South at {first} and {second}");
                assert_eq!(beach.territories.get("North"), Some(3));
                assert_eq!(beach.territories.get("South"), Some(2));
            }
        }
    }

    #[test]
    fn test_missing_territory_counts_as_unknown() {
        let accounts = vec![
            account("1", Some("33101"), None),
            account("2", Some("33101"), Some("")),
        ];
        let summary = &aggregate_by_zip(&accounts)[0];
        assert_eq!(summary.territories.get(UNKNOWN_TERRITORY), Some(2));
        assert_eq!(summary.territory, UNKNOWN_TERRITORY);
    }

    #[test]
    fn test_skips_missing_zip_and_sorts_lexicographically() {
        let accounts = vec![
            account("1", Some("9999"), Some("North")),
            account("2", None, Some("North")),
            account("3", Some("33101"), Some("North")),
            account("4", Some(""), Some("North")),
            account("5", Some("100"), Some("North")),
        ];

        let summaries = aggregate_by_zip(&accounts);
        let zips: Vec<&str> = summaries.iter().map(|s| s.zip.as_str()).collect();
        assert_eq!(zips, vec!["100", "33101", "9999"]);
        assert_eq!(summaries.iter().map(|s| s.total_accounts).sum::<usize>(), 3);
    }

    #[test]
    fn test_revenue_and_type_counts() {
        let mut a = account("1", Some("33133"), Some("Central"));
        a.city = Some("Coconut Grove".to_string());
        a.monthly_price = 180.0;
        a.yearly_price = 2160.0;
        a.account_type = Some(AccountType::Residential);
        let mut b = account("2", Some("33133"), Some("Central"));
        b.city = Some("Miami".to_string());
        b.monthly_price = 450.5;
        b.account_type = Some(AccountType::Commercial);
        let c = account("3", Some("33133"), Some("Central"));

        let summary = &aggregate_by_zip(&[a, b, c])[0];
        assert_eq!(summary.city, "Coconut Grove");
        assert_eq!(summary.total_monthly_revenue, 630.5);
        assert_eq!(summary.total_yearly_revenue, 2160.0);
        assert_eq!(summary.residential_count, 1);
        assert_eq!(summary.commercial_count, 1);
        assert_eq!(summary.total_accounts, 3);
    }

    #[test]
    fn test_territory_counts_serialize_in_insertion_order() {
        let accounts = vec![
            account("1", Some("33101"), Some("South")),
            account("2", Some("33101"), Some("North")),
            account("3", Some("33101"), Some("Central")),
        ];
        let json = serde_json::to_string(&aggregate_by_zip(&accounts)[0].territories).unwrap();
        assert_eq!(json, r#"{"South":1,"North":1,"Central":1}"#);
    }

    #[test]
    fn test_territory_totals() {
        let accounts = vec![
            account("1", Some("33101"), Some("North")),
            account("2", Some("33102"), Some("South")),
            account("3", Some("33102"), Some("South")),
            account("4", Some("33103"), Some("North")),
            account("5", Some("33104"), Some("South")),
        ];
        let totals = territory_totals(&aggregate_by_zip(&accounts));
        assert_eq!(totals, vec![("South".to_string(), 3), ("North".to_string(), 2)]);
    }
}
