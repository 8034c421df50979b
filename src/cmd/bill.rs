//! Bill command - amount due for one billing month, per card and in total

use super::display::{card_label, format_pay_day, format_won};
use super::{bill_period, unique_cards, SnapshotArgs};
use crate::core::{
    ActiveTransaction, BillingPeriod, BillingResult, Card, Snapshot, TransactionKind,
};
use clap::{Args, ValueEnum};
use std::cmp::Reverse;
use std::io;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct BillCommand {
    #[command(flatten)]
    snapshot: SnapshotArgs,

    /// Billing month as YYYY-MM (default: current month)
    #[arg(short, long)]
    period: Option<BillingPeriod>,

    /// Move this many months from the billing month (negative for earlier)
    #[arg(short, long, default_value_t = 0, allow_hyphen_values = true)]
    offset: i32,

    /// Only list charges of this type
    #[arg(short = 't', long = "type", value_enum, default_value_t = TypeFilter::All)]
    kind: TypeFilter,

    /// Skip installments with an unusable start date instead of failing
    #[arg(long)]
    skip_malformed: bool,

    /// Output the full billing result as JSON
    #[arg(long, conflicts_with = "csv")]
    json: bool,

    /// Output active charges as CSV
    #[arg(long)]
    csv: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum TypeFilter {
    #[default]
    All,
    Lump,
    Installment,
}

impl TypeFilter {
    fn includes(&self, kind: TransactionKind) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Lump => kind == TransactionKind::Lump,
            TypeFilter::Installment => kind == TransactionKind::Installment,
        }
    }
}

impl BillCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let snapshot = self.snapshot.load()?;
        let period = self
            .period
            .unwrap_or_else(BillingPeriod::current)
            .offset(self.offset)?;

        let result = bill_period(&snapshot, period, self.skip_malformed)?;

        log::info!(
            "{}: {} active charges, total {}",
            period,
            result.active_transactions.len(),
            result.grand_total
        );

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        } else if self.csv {
            self.write_csv(&snapshot, &result)
        } else {
            self.print_bill(&snapshot, &result);
            Ok(())
        }
    }

    fn print_bill(&self, snapshot: &Snapshot, result: &BillingResult) {
        println!();
        println!("BILL {}", result.period);
        println!();
        println!("TOTAL DUE: {}", format_won(result.grand_total));
        println!(
            "  Includes {} items for this cycle.",
            result.active_transactions.len()
        );
        println!();

        let cards = unique_cards(snapshot);
        if cards.is_empty() {
            println!("No cards in snapshot");
        } else {
            let rows: Vec<CardRow> = cards.iter().map(|card| CardRow::new(card, result)).collect();
            let table = Table::new(rows)
                .with(Style::rounded())
                .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
                .to_string();
            println!("{}", table);
        }

        for card in &cards {
            let rows = transaction_rows(card, result, self.kind, format_won);
            println!();
            println!("{} (pay day: {})", card_label(card), format_pay_day(card));
            if rows.is_empty() {
                println!("  No transactions");
                continue;
            }
            let table = Table::new(rows)
                .with(Style::modern())
                .with(Modify::new(Columns::new(3..)).with(Alignment::right()))
                .to_string();
            println!("{}", table);
        }

        if !result.skipped.is_empty() {
            eprintln!();
            eprintln!("\u{26A0} {} installment(s) skipped:", result.skipped.len());
            for skipped in &result.skipped {
                eprintln!(
                    "  #{} {} ({}, card {}): {}",
                    skipped.index, skipped.item, skipped.merchant, skipped.card_id, skipped.reason
                );
            }
        }
        println!();
    }

    fn write_csv(&self, snapshot: &Snapshot, result: &BillingResult) -> anyhow::Result<()> {
        let mut wtr = csv::Writer::from_writer(io::stdout());
        for card in unique_cards(snapshot) {
            for row in transaction_rows(card, result, self.kind, |amount| amount.to_string()) {
                wtr.serialize(row)?;
            }
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Per-card totals row
#[derive(Debug, Clone, Tabled)]
struct CardRow {
    #[tabled(rename = "Card")]
    card: String,

    #[tabled(rename = "Pay Day")]
    pay_day: String,

    #[tabled(rename = "Total")]
    total: String,

    #[tabled(rename = "Lump Sum")]
    lump_sum: String,

    #[tabled(rename = "Installment")]
    installment: String,
}

impl CardRow {
    fn new(card: &Card, result: &BillingResult) -> Self {
        let totals = result.card_totals(&card.id);
        CardRow {
            card: card_label(card).to_string(),
            pay_day: format_pay_day(card),
            total: format_won(totals.total),
            lump_sum: format_won(totals.lump_sum_total),
            installment: format_won(totals.installment_total),
        }
    }
}

/// Row for one active charge
#[derive(Debug, Clone, PartialEq, Eq, Tabled, serde::Serialize)]
pub struct TransactionRow {
    #[tabled(rename = "Card")]
    pub card: String,

    #[tabled(rename = "Type")]
    #[serde(rename = "type")]
    pub kind: String,

    #[tabled(rename = "Description")]
    pub description: String,

    #[tabled(rename = "Amount")]
    pub amount: String,

    #[tabled(rename = "Progress")]
    pub progress: String,
}

/// Active charges of one card, largest first
fn transaction_rows(
    card: &Card,
    result: &BillingResult,
    filter: TypeFilter,
    format_amount: impl Fn(i64) -> String,
) -> Vec<TransactionRow> {
    let mut txs: Vec<&ActiveTransaction> = result
        .transactions_for_card(&card.id)
        .filter(|tx| filter.includes(tx.kind()))
        .collect();
    txs.sort_by_key(|tx| Reverse(tx.amount()));

    txs.into_iter()
        .map(|tx| match tx {
            ActiveTransaction::Lump { source } => TransactionRow {
                card: card.id.clone(),
                kind: "lump".to_string(),
                description: "Lump sum payment".to_string(),
                amount: format_amount(source.amount),
                progress: String::new(),
            },
            ActiveTransaction::Installment {
                source,
                amount,
                current_installment_number,
            } => TransactionRow {
                card: card.id.clone(),
                kind: "installment".to_string(),
                description: if source.merchant.is_empty() {
                    source.item.clone()
                } else {
                    format!("{} ({})", source.item, source.merchant)
                },
                amount: format_amount(*amount),
                progress: format!("{} / {}", current_installment_number, source.months),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{compute_billing, BillingRequest, Installment, LumpSum};

    fn snapshot() -> Snapshot {
        Snapshot {
            cards: vec![
                Card {
                    id: "A".to_string(),
                    name: "Card A".to_string(),
                    pay_day: Some(15),
                },
                Card {
                    id: "A".to_string(),
                    name: "Duplicate".to_string(),
                    pay_day: None,
                },
            ],
            lump_sums: vec![
                LumpSum {
                    card_id: "A".to_string(),
                    year: 2026,
                    month: 2,
                    amount: 20_000,
                },
                LumpSum {
                    card_id: "A".to_string(),
                    year: 2026,
                    month: 2,
                    amount: 500_000,
                },
            ],
            installments: vec![Installment {
                card_id: "A".to_string(),
                item: "Laptop".to_string(),
                merchant: "Shop".to_string(),
                total_amount: 300_000,
                months: 3,
                payment_start_date: Some("2026-01-01".to_string()),
            }],
        }
    }

    fn rows(filter: TypeFilter) -> Vec<TransactionRow> {
        let snapshot = snapshot();
        let result = compute_billing(&BillingRequest {
            snapshot: &snapshot,
            period: BillingPeriod::new(2026, 2).unwrap(),
        })
        .unwrap();
        transaction_rows(&snapshot.cards[0], &result, filter, |a| a.to_string())
    }

    #[test]
    fn rows_sorted_by_amount_descending() {
        let amounts: Vec<_> = rows(TypeFilter::All).into_iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec!["500000", "100000", "20000"]);
    }

    #[test]
    fn rows_filtered_by_type() {
        let lump = rows(TypeFilter::Lump);
        assert_eq!(lump.len(), 2);
        assert!(lump.iter().all(|r| r.kind == "lump"));

        let inst = rows(TypeFilter::Installment);
        assert_eq!(inst.len(), 1);
        assert_eq!(inst[0].description, "Laptop (Shop)");
        assert_eq!(inst[0].progress, "2 / 3");
    }

    #[test]
    fn duplicate_card_ids_listed_once() {
        let snapshot = snapshot();
        let cards = unique_cards(&snapshot);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].name, "Card A");
    }
}
