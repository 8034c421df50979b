pub mod billing;
pub mod period;
pub mod snapshot;

// Flat public surface for domain types and functions.
#[allow(unused_imports)]
pub use billing::{
    compute_billing, compute_billing_with, ActiveTransaction, BillingError, BillingOptions,
    BillingRequest, BillingResult, CardTotals, SkippedRecord, TransactionKind,
};
#[allow(unused_imports)]
pub use period::{BillingPeriod, PeriodError};
#[allow(unused_imports)]
pub use snapshot::{
    read_snapshot_json, Card, DataFetchError, FieldInfo, Installment, LumpSum, Snapshot,
    SnapshotEnvelope, StartDateError,
};
