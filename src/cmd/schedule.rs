//! Schedule command - bills for a run of consecutive months

use super::display::{card_label, format_won};
use super::{bill_period, unique_cards, SnapshotArgs};
use crate::core::{BillingPeriod, Card, CardTotals};
use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::{
    builder::Builder,
    settings::{object::Columns, Alignment, Modify, Style},
};

#[derive(Args, Debug)]
pub struct ScheduleCommand {
    #[command(flatten)]
    snapshot: SnapshotArgs,

    /// First billing month as YYYY-MM (default: current month)
    #[arg(short, long)]
    from: Option<BillingPeriod>,

    /// Number of months to compute
    #[arg(short, long, default_value_t = 12)]
    months: usize,

    /// Skip installments with an unusable start date instead of failing
    #[arg(long)]
    skip_malformed: bool,

    /// Output as JSON instead of a table
    #[arg(long)]
    json: bool,
}

/// One month of the schedule
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleEntry {
    period: BillingPeriod,
    grand_total: i64,
    item_count: usize,
    per_card: BTreeMap<String, CardTotals>,
}

impl ScheduleCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let snapshot = self.snapshot.load()?;
        let start = self.from.unwrap_or_else(BillingPeriod::current);

        let entries = start
            .range(self.months)?
            .into_iter()
            .map(|period| {
                let result = bill_period(&snapshot, period, self.skip_malformed)?;
                Ok(ScheduleEntry {
                    period,
                    grand_total: result.grand_total,
                    item_count: result.active_transactions.len(),
                    per_card: result.per_card,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        log::info!("Computed {} months from {}", entries.len(), start);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
            return Ok(());
        }

        if entries.is_empty() {
            println!("No months requested");
            return Ok(());
        }

        println!();
        println!("BILLING SCHEDULE ({} months from {})", entries.len(), start);
        println!();
        println!("{}", schedule_table(&unique_cards(&snapshot), &entries));
        println!();
        Ok(())
    }
}

/// One row per month, one column per card
fn schedule_table(cards: &[&Card], entries: &[ScheduleEntry]) -> String {
    let mut builder = Builder::default();
    let mut header = vec!["Month".to_string(), "Items".to_string(), "Total".to_string()];
    header.extend(cards.iter().map(|c| card_label(c).to_string()));
    builder.push_record(header);

    for entry in entries {
        let mut record = vec![
            entry.period.to_string(),
            entry.item_count.to_string(),
            format_won(entry.grand_total),
        ];
        record.extend(
            cards
                .iter()
                .map(|card| format_won(entry.per_card.get(&card.id).map_or(0, |t| t.total))),
        );
        builder.push_record(record);
    }

    builder
        .build()
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string()
}
