use super::period::BillingPeriod;
use super::snapshot::{Installment, LumpSum, Snapshot, StartDateError};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BillingError {
    #[error("installment #{index} ('{item}' at '{merchant}', card {card_id}): {reason}")]
    MalformedRecord {
        index: usize,
        card_id: String,
        item: String,
        merchant: String,
        #[source]
        reason: StartDateError,
    },
    #[error("billing total for {0} exceeds the representable amount")]
    AmountOverflow(BillingPeriod),
}

/// Snapshot and the month to bill
#[derive(Debug, Clone, Copy)]
pub struct BillingRequest<'a> {
    pub snapshot: &'a Snapshot,
    pub period: BillingPeriod,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BillingOptions {
    /// Record installments with an unusable start date in
    /// [`BillingResult::skipped`] instead of failing the whole computation.
    pub skip_malformed: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardTotals {
    pub total: i64,
    pub lump_sum_total: i64,
    pub installment_total: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Lump,
    Installment,
}

/// A charge that contributes to the billed month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActiveTransaction<'a> {
    Lump {
        source: &'a LumpSum,
    },
    Installment {
        source: &'a Installment,
        amount: i64,
        /// 1-based position of this month within the plan
        #[serde(rename = "currentInstallmentNumber")]
        current_installment_number: i64,
    },
}

impl ActiveTransaction<'_> {
    pub fn kind(&self) -> TransactionKind {
        match self {
            ActiveTransaction::Lump { .. } => TransactionKind::Lump,
            ActiveTransaction::Installment { .. } => TransactionKind::Installment,
        }
    }

    pub fn card_id(&self) -> &str {
        match self {
            ActiveTransaction::Lump { source } => &source.card_id,
            ActiveTransaction::Installment { source, .. } => &source.card_id,
        }
    }

    /// Amount billed this month
    pub fn amount(&self) -> i64 {
        match self {
            ActiveTransaction::Lump { source } => source.amount,
            ActiveTransaction::Installment { amount, .. } => *amount,
        }
    }
}

/// Installment left out of the totals because its start date was unusable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRecord {
    pub index: usize,
    pub card_id: String,
    pub item: String,
    pub merchant: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingResult<'a> {
    pub period: BillingPeriod,
    pub grand_total: i64,
    /// Totals for every card in the snapshot, including cards with nothing due
    pub per_card: BTreeMap<String, CardTotals>,
    /// Lump sums then installments, in snapshot order
    pub active_transactions: Vec<ActiveTransaction<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedRecord>,
}

impl<'a> BillingResult<'a> {
    pub fn transactions_for_card<'r>(
        &'r self,
        card_id: &'r str,
    ) -> impl Iterator<Item = &'r ActiveTransaction<'a>> + 'r {
        self.active_transactions
            .iter()
            .filter(move |tx| tx.card_id() == card_id)
    }

    pub fn card_totals(&self, card_id: &str) -> CardTotals {
        self.per_card.get(card_id).copied().unwrap_or_default()
    }
}

/// Compute the bill for `request.period`, failing on the first malformed installment.
pub fn compute_billing<'a>(request: &BillingRequest<'a>) -> Result<BillingResult<'a>, BillingError> {
    compute_billing_with(request, &BillingOptions::default())
}

/// Compute the bill for `request.period`.
///
/// Charges referencing a card that is not in the snapshot are left out of
/// every total without error.
pub fn compute_billing_with<'a>(
    request: &BillingRequest<'a>,
    options: &BillingOptions,
) -> Result<BillingResult<'a>, BillingError> {
    let BillingRequest { snapshot, period } = *request;

    let mut per_card: BTreeMap<String, CardTotals> = snapshot
        .cards
        .iter()
        .map(|card| (card.id.clone(), CardTotals::default()))
        .collect();
    let mut grand_total: i64 = 0;
    let mut active_transactions = Vec::new();
    let mut skipped = Vec::new();

    let overflow = || BillingError::AmountOverflow(period);

    for lump in snapshot.lump_sums.iter().filter(|ls| ls.bills_in(period)) {
        let Some(totals) = per_card.get_mut(&lump.card_id) else {
            log::debug!("Lump sum on unknown card '{}' excluded", lump.card_id);
            continue;
        };
        totals.total = totals.total.checked_add(lump.amount).ok_or_else(overflow)?;
        totals.lump_sum_total = totals
            .lump_sum_total
            .checked_add(lump.amount)
            .ok_or_else(overflow)?;
        grand_total = grand_total.checked_add(lump.amount).ok_or_else(overflow)?;

        log::debug!("{} lump sum {} on card '{}'", period, lump.amount, lump.card_id);
        active_transactions.push(ActiveTransaction::Lump { source: lump });
    }

    for (index, inst) in snapshot.installments.iter().enumerate() {
        let start = match inst.start_period() {
            Ok(start) => start,
            Err(reason) if !options.skip_malformed => {
                return Err(BillingError::MalformedRecord {
                    index,
                    card_id: inst.card_id.clone(),
                    item: inst.item.clone(),
                    merchant: inst.merchant.clone(),
                    reason,
                });
            }
            Err(reason) => {
                log::warn!("Skipping installment #{} '{}': {}", index, inst.item, reason);
                skipped.push(SkippedRecord {
                    index,
                    card_id: inst.card_id.clone(),
                    item: inst.item.clone(),
                    merchant: inst.merchant.clone(),
                    reason: reason.to_string(),
                });
                continue;
            }
        };

        let month_diff = period.months_since(start);
        if month_diff < 0 || month_diff >= inst.months {
            continue;
        }
        let Some(amount) = inst.monthly_amount() else {
            continue;
        };
        let Some(totals) = per_card.get_mut(&inst.card_id) else {
            log::debug!("Installment '{}' on unknown card '{}' excluded", inst.item, inst.card_id);
            continue;
        };
        totals.total = totals.total.checked_add(amount).ok_or_else(overflow)?;
        totals.installment_total = totals
            .installment_total
            .checked_add(amount)
            .ok_or_else(overflow)?;
        grand_total = grand_total.checked_add(amount).ok_or_else(overflow)?;

        log::debug!(
            "{} installment '{}' {}/{} = {} on card '{}'",
            period,
            inst.item,
            month_diff + 1,
            inst.months,
            amount,
            inst.card_id
        );
        active_transactions.push(ActiveTransaction::Installment {
            source: inst,
            amount,
            current_installment_number: month_diff + 1,
        });
    }

    Ok(BillingResult {
        period,
        grand_total,
        per_card,
        active_transactions,
        skipped,
    })
}
