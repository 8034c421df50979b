//! Validate command - surface data quality issues without computing bills

use super::SnapshotArgs;
use crate::core::Snapshot;
use clap::Args;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Args, Debug)]
pub struct ValidateCommand {
    #[command(flatten)]
    snapshot: SnapshotArgs,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueKind {
    DuplicateCardId,
    UnknownCard,
    InvalidMonth,
    NegativeAmount,
    MalformedStartDate,
    NonPositiveMonths,
}

/// A validation issue for output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    /// Which record, e.g. "installments[2]"
    pub record: String,
    pub message: String,
}

/// JSON output structure
#[derive(Debug, Serialize)]
struct ValidationOutput<'a> {
    issue_count: usize,
    issues: &'a [ValidationIssue],
}

impl ValidateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let snapshot = self.snapshot.load()?;
        let issues = find_issues(&snapshot);

        log::info!("Validation found {} issue(s)", issues.len());

        if self.json {
            let output = ValidationOutput {
                issue_count: issues.len(),
                issues: &issues,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print_text(&issues);
        }

        // Exit with code 1 if issues found
        if !issues.is_empty() {
            std::process::exit(1);
        }
        Ok(())
    }
}

fn print_text(issues: &[ValidationIssue]) {
    println!();
    println!("VALIDATION RESULTS");
    println!();

    if issues.is_empty() {
        println!("\u{2713} No issues found.");
    } else {
        println!("\u{26A0} {} issue(s) found:", issues.len());
        println!();

        for (i, issue) in issues.iter().enumerate() {
            println!("  {}. [{:?}] {}", i + 1, issue.kind, issue.record);
            println!("     {}", issue.message);
            println!();
        }
    }
}

/// Data-quality problems in a snapshot.
///
/// Unknown card references are reported here only; billing still leaves them
/// out of every total without error.
pub fn find_issues(snapshot: &Snapshot) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut card_ids = HashSet::new();

    for (i, card) in snapshot.cards.iter().enumerate() {
        if !card_ids.insert(card.id.as_str()) {
            issues.push(ValidationIssue {
                kind: IssueKind::DuplicateCardId,
                record: format!("cards[{i}]"),
                message: format!("Card id '{}' appears more than once", card.id),
            });
        }
    }

    for (i, lump) in snapshot.lump_sums.iter().enumerate() {
        let record = format!("lumpSums[{i}]");
        if !card_ids.contains(lump.card_id.as_str()) {
            issues.push(unknown_card(&record, &lump.card_id));
        }
        if !(1..=12).contains(&lump.month) {
            issues.push(ValidationIssue {
                kind: IssueKind::InvalidMonth,
                record: record.clone(),
                message: format!("Month {} is outside 1-12 and never bills", lump.month),
            });
        }
        if lump.amount < 0 {
            issues.push(negative_amount(&record, lump.amount));
        }
    }

    for (i, inst) in snapshot.installments.iter().enumerate() {
        let record = format!("installments[{i}]");
        if !card_ids.contains(inst.card_id.as_str()) {
            issues.push(unknown_card(&record, &inst.card_id));
        }
        if let Err(err) = inst.start_period() {
            issues.push(ValidationIssue {
                kind: IssueKind::MalformedStartDate,
                record: record.clone(),
                message: format!("'{}': {}", inst.item, err),
            });
        }
        if inst.months <= 0 {
            issues.push(ValidationIssue {
                kind: IssueKind::NonPositiveMonths,
                record: record.clone(),
                message: format!(
                    "'{}' has {} months and never bills",
                    inst.item, inst.months
                ),
            });
        }
        if inst.total_amount < 0 {
            issues.push(negative_amount(&record, inst.total_amount));
        }
    }

    issues
}

fn unknown_card(record: &str, card_id: &str) -> ValidationIssue {
    ValidationIssue {
        kind: IssueKind::UnknownCard,
        record: record.to_string(),
        message: format!("Card '{}' is not in the card list; excluded from totals", card_id),
    }
}

fn negative_amount(record: &str, amount: i64) -> ValidationIssue {
    ValidationIssue {
        kind: IssueKind::NegativeAmount,
        record: record.to_string(),
        message: format!("Amount {} is negative", amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Card, Installment, LumpSum};

    fn card(id: &str) -> Card {
        Card {
            id: id.to_string(),
            name: String::new(),
            pay_day: None,
        }
    }

    fn kinds(snapshot: &Snapshot) -> Vec<(IssueKind, String)> {
        find_issues(snapshot)
            .into_iter()
            .map(|i| (i.kind, i.record))
            .collect()
    }

    #[test]
    fn clean_snapshot_has_no_issues() {
        let snapshot = Snapshot {
            cards: vec![card("A")],
            lump_sums: vec![LumpSum {
                card_id: "A".to_string(),
                year: 2026,
                month: 2,
                amount: 20_000,
            }],
            installments: vec![Installment {
                card_id: "A".to_string(),
                item: "Laptop".to_string(),
                merchant: "Shop".to_string(),
                total_amount: 300_000,
                months: 3,
                payment_start_date: Some("2026-01-01".to_string()),
            }],
        };
        assert!(kinds(&snapshot).is_empty());
    }

    #[test]
    fn reports_each_problem() {
        let snapshot = Snapshot {
            cards: vec![card("A"), card("A")],
            lump_sums: vec![LumpSum {
                card_id: "Z".to_string(),
                year: 2026,
                month: 13,
                amount: -5,
            }],
            installments: vec![Installment {
                card_id: "A".to_string(),
                item: "Phone".to_string(),
                merchant: String::new(),
                total_amount: 10,
                months: 0,
                payment_start_date: None,
            }],
        };

        assert_eq!(
            kinds(&snapshot),
            vec![
                (IssueKind::DuplicateCardId, "cards[1]".to_string()),
                (IssueKind::UnknownCard, "lumpSums[0]".to_string()),
                (IssueKind::InvalidMonth, "lumpSums[0]".to_string()),
                (IssueKind::NegativeAmount, "lumpSums[0]".to_string()),
                (IssueKind::MalformedStartDate, "installments[0]".to_string()),
                (IssueKind::NonPositiveMonths, "installments[0]".to_string()),
            ]
        );
    }
}
