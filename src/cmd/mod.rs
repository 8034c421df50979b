pub mod bill;
pub mod display;
pub mod schedule;
pub mod schema;
pub mod validate;

use crate::core::{
    compute_billing, compute_billing_with, read_snapshot_json, BillingError, BillingOptions,
    BillingPeriod, BillingRequest, BillingResult, Card, DataFetchError, Snapshot,
};
use anyhow::Context;
use clap::Args;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

/// Options shared by every command that computes bills
#[derive(Args, Debug, Clone)]
pub struct SnapshotArgs {
    /// JSON snapshot exported from the data source ("-" reads stdin)
    #[arg(short, long)]
    snapshot: PathBuf,
}

impl SnapshotArgs {
    pub fn load(&self) -> anyhow::Result<Snapshot> {
        read_snapshot(&self.snapshot)
            .with_context(|| format!("loading snapshot from {}", self.snapshot.display()))
    }
}

/// Read a snapshot (JSON) from a file or stdin with "-"
pub fn read_snapshot(path: &Path) -> Result<Snapshot, DataFetchError> {
    if path.as_os_str() == "-" {
        let stdin = io::stdin();
        read_snapshot_json(stdin.lock())
    } else {
        let file = File::open(path)?;
        read_snapshot_json(BufReader::new(file))
    }
}

/// Bill one month, strict unless `skip_malformed` is set
pub fn bill_period(
    snapshot: &Snapshot,
    period: BillingPeriod,
    skip_malformed: bool,
) -> Result<BillingResult<'_>, BillingError> {
    let request = BillingRequest { snapshot, period };
    if skip_malformed {
        compute_billing_with(&request, &BillingOptions { skip_malformed })
    } else {
        compute_billing(&request)
    }
}

/// Cards in snapshot order, first occurrence of each id
pub fn unique_cards(snapshot: &Snapshot) -> Vec<&Card> {
    let mut seen = HashSet::new();
    snapshot
        .cards
        .iter()
        .filter(|card| seen.insert(card.id.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Installment, LumpSum};

    fn card(id: &str, name: &str) -> Card {
        Card {
            id: id.to_string(),
            name: name.to_string(),
            pay_day: None,
        }
    }

    fn snapshot_with_bad_date() -> Snapshot {
        Snapshot {
            cards: vec![card("A", "Card A")],
            lump_sums: vec![LumpSum {
                card_id: "A".to_string(),
                year: 2026,
                month: 2,
                amount: 20_000,
            }],
            installments: vec![Installment {
                card_id: "A".to_string(),
                item: "Phone".to_string(),
                merchant: "Shop".to_string(),
                total_amount: 90_000,
                months: 3,
                payment_start_date: Some("soon".to_string()),
            }],
        }
    }

    #[test]
    fn bill_period_is_strict_by_default() {
        let snapshot = snapshot_with_bad_date();
        let period = BillingPeriod::new(2026, 2).unwrap();
        let err = bill_period(&snapshot, period, false).unwrap_err();
        assert!(matches!(err, BillingError::MalformedRecord { index: 0, .. }));
    }

    #[test]
    fn bill_period_skips_when_asked() {
        let snapshot = snapshot_with_bad_date();
        let period = BillingPeriod::new(2026, 2).unwrap();
        let result = bill_period(&snapshot, period, true).unwrap();
        assert_eq!(result.grand_total, 20_000);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].item, "Phone");
    }

    #[test]
    fn unique_cards_keeps_first_occurrence() {
        let snapshot = Snapshot {
            cards: vec![card("A", "Card A"), card("B", "Card B"), card("A", "Other A")],
            ..Default::default()
        };
        let names: Vec<_> = unique_cards(&snapshot).iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Card A", "Card B"]);
    }
}
