// Ports define what the core needs from the partitioned store, without
// implementing it. Adapters live below; the in-memory one is the reference
// backend for tests and local development.

pub mod in_memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::modules::invoices::domain::{Invoice, InvoiceStatus, Payment};
use crate::modules::time_entries::domain::{TimeEntry, TimeEntryStatus, TimerSession};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("record already exists")]
    AlreadyExists,

    #[error("transaction condition failed")]
    ConditionFailed,

    #[error("backend error: {0}")]
    Backend(String),
}

/// Inclusive calendar-date range used by the secondary-index queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    pub fn single(date: NaiveDate) -> Self {
        Self {
            from: date,
            to: date,
        }
    }
}

/// Invoice-side effect committed together with a payment insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaidStamp {
    pub paid_date: NaiveDate,
}

/// Typed access to the four collections. Point lookups by primary key,
/// range queries over the secondary indexes, and the two primitives the
/// correctness guarantees hang on: conditional creates and the multi-item
/// payment transaction.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // time entries: pk = entry id; indexes (user, date), (project, date),
    // (status, date)

    /// Conditional create; fails with `AlreadyExists` if the id is taken.
    async fn insert_entry(&self, entry: TimeEntry) -> Result<(), StoreError>;
    async fn get_entry(&self, id: &str) -> Result<TimeEntry, StoreError>;
    /// Full-row replace; fails with `NotFound` if the id is absent.
    async fn put_entry(&self, entry: TimeEntry) -> Result<(), StoreError>;
    async fn delete_entry(&self, id: &str) -> Result<(), StoreError>;
    async fn entries_by_user(
        &self,
        user_id: &str,
        range: DateRange,
    ) -> Result<Vec<TimeEntry>, StoreError>;
    async fn entries_by_project(
        &self,
        project_id: &str,
        range: DateRange,
    ) -> Result<Vec<TimeEntry>, StoreError>;
    async fn entries_by_status(
        &self,
        status: TimeEntryStatus,
        range: DateRange,
    ) -> Result<Vec<TimeEntry>, StoreError>;

    // timer sessions: pk = user id, at most one row per user

    /// Conditional create keyed by user; `AlreadyExists` when a timer runs.
    async fn insert_session(&self, session: TimerSession) -> Result<(), StoreError>;
    async fn get_session(&self, user_id: &str) -> Result<TimerSession, StoreError>;
    async fn delete_session(&self, user_id: &str) -> Result<(), StoreError>;

    // invoices: pk = invoice id; indexes (client, issue date),
    // (status, due date), (invoice number)

    async fn insert_invoice(&self, invoice: Invoice) -> Result<(), StoreError>;
    async fn get_invoice(&self, id: &str) -> Result<Invoice, StoreError>;
    async fn put_invoice(&self, invoice: Invoice) -> Result<(), StoreError>;
    async fn invoices_by_client(&self, client_id: &str) -> Result<Vec<Invoice>, StoreError>;
    async fn invoices_by_status(&self, status: InvoiceStatus) -> Result<Vec<Invoice>, StoreError>;
    async fn invoice_by_number(&self, number: &str) -> Result<Invoice, StoreError>;

    /// Atomic per-month counter; replaces count-then-format numbering so two
    /// concurrent creates can never share a sequence number.
    async fn next_invoice_sequence(&self, year: i32, month: u32) -> Result<u32, StoreError>;

    // payments: pk = payment id; index (invoice, payment date); append-only

    async fn payments_by_invoice(&self, invoice_id: &str) -> Result<Vec<Payment>, StoreError>;

    /// Multi-item atomic transaction: insert the payment (conditioned on its
    /// id not existing and on the invoice's currently recorded payment total
    /// equalling `expected_prior_total`) and, when `paid` is given, mark the
    /// invoice paid in the same commit. Both writes land together or neither
    /// does; a violated condition returns `ConditionFailed` and writes
    /// nothing.
    async fn commit_payment(
        &self,
        payment: Payment,
        expected_prior_total: Decimal,
        paid: Option<PaidStamp>,
    ) -> Result<(), StoreError>;
}
