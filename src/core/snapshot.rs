use super::period::BillingPeriod;
use cardbill_derive::FieldSchema;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::io::Read;

/// Status value the data source sends with a usable payload
pub const SUCCESS_STATUS: &str = "success";

#[derive(Debug, thiserror::Error)]
pub enum DataFetchError {
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("no snapshot data received")]
    Empty,
    #[error("invalid snapshot payload: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("data source reported status '{status}': {message}")]
    Status { status: String, message: String },
}

/// Describes one serialized field of an input record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}

/// Payload returned by the spreadsheet-backed data source
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEnvelope {
    /// "success" when the payload carries data
    #[serde(default)]
    pub status: Option<String>,
    /// Error summary sent by the data source on failure
    #[serde(default)]
    pub error: Option<String>,
    /// Error details sent by the data source on failure
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub lump_sums: Vec<LumpSum>,
    #[serde(default)]
    pub installments: Vec<Installment>,
}

impl SnapshotEnvelope {
    /// Unwrap the data, rejecting any payload whose status is not "success".
    pub fn into_snapshot(self) -> Result<Snapshot, DataFetchError> {
        match self.status.as_deref() {
            Some(SUCCESS_STATUS) => Ok(Snapshot {
                cards: self.cards,
                lump_sums: self.lump_sums,
                installments: self.installments,
            }),
            status => {
                let message = match (self.error, self.details) {
                    (Some(e), Some(d)) => format!("{e} ({d})"),
                    (e, d) => e.or(d).unwrap_or_else(|| "no details".to_string()),
                };
                Err(DataFetchError::Status {
                    status: status.unwrap_or("<missing>").to_string(),
                    message,
                })
            }
        }
    }
}

/// Read-only set of cards and charges at a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub cards: Vec<Card>,
    pub lump_sums: Vec<LumpSum>,
    pub installments: Vec<Installment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, FieldSchema)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Unique card identifier referenced by charges
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Display label
    #[serde(default)]
    pub name: String,
    /// Day of month the bill falls due
    #[serde(default)]
    pub pay_day: Option<u32>,
}

/// One-time charge billed entirely in a single month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, FieldSchema)]
#[serde(rename_all = "camelCase")]
pub struct LumpSum {
    /// Card the charge is billed to
    #[serde(deserialize_with = "deserialize_id")]
    pub card_id: String,
    /// Billing year
    pub year: i32,
    /// Billing month (1-12)
    pub month: u32,
    /// Amount in the smallest currency unit
    pub amount: i64,
}

impl LumpSum {
    pub fn bills_in(&self, period: BillingPeriod) -> bool {
        self.year == period.year() && self.month == period.month()
    }
}

/// Charge spread across consecutive monthly cycles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, FieldSchema)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    /// Card the plan is billed to
    #[serde(deserialize_with = "deserialize_id")]
    pub card_id: String,
    /// Purchased item
    #[serde(default)]
    pub item: String,
    /// Merchant name
    #[serde(default)]
    pub merchant: String,
    /// Total amount in the smallest currency unit
    pub total_amount: i64,
    /// Number of monthly cycles the plan runs for
    pub months: i64,
    /// First billing date (YYYY-MM-DD or timestamp); only year and month are used
    #[serde(default)]
    pub payment_start_date: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StartDateError {
    #[error("payment start date is missing")]
    Missing,
    #[error("payment start date '{0}' is not a recognised date")]
    Unparsable(String),
}

impl Installment {
    /// First billing period of the plan.
    ///
    /// The calendar date is taken as written, including for timestamps that
    /// carry an offset.
    pub fn start_period(&self) -> Result<BillingPeriod, StartDateError> {
        let raw = self
            .payment_start_date
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(StartDateError::Missing)?;
        parse_start_date(raw)
            .map(BillingPeriod::from_date)
            .ok_or_else(|| StartDateError::Unparsable(raw.to_string()))
    }

    /// Per-cycle amount: the total floor-divided by the number of months.
    ///
    /// The remainder is never billed. `None` when `months` is not positive.
    pub fn monthly_amount(&self) -> Option<i64> {
        (self.months > 0).then(|| self.total_amount.div_euclid(self.months))
    }
}

/// Read a snapshot payload from JSON
pub fn read_snapshot_json<R: Read>(mut reader: R) -> Result<Snapshot, DataFetchError> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;
    if buffer.iter().all(u8::is_ascii_whitespace) {
        return Err(DataFetchError::Empty);
    }
    let envelope: SnapshotEnvelope = serde_json::from_slice(&buffer)?;
    let snapshot = envelope.into_snapshot()?;
    log::debug!(
        "Snapshot: {} cards, {} lump sums, {} installments",
        snapshot.cards.len(),
        snapshot.lump_sums.len(),
        snapshot.installments.len()
    );
    Ok(snapshot)
}

fn parse_start_date(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Spreadsheet exports may send identifiers as numbers
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Int(n) => n.to_string(),
        Id::Float(n) => n.to_string(),
    })
}
