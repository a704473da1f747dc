use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::modules::invoices::domain::{Invoice, InvoiceStatus, Payment};
use crate::modules::time_entries::domain::{TimeEntry, TimeEntryStatus, TimerSession};
use crate::shared::infrastructure::store::{DateRange, LedgerStore, PaidStamp, StoreError};

#[derive(Default)]
struct Collections {
    entries: HashMap<String, TimeEntry>,
    sessions: HashMap<String, TimerSession>,
    invoices: HashMap<String, Invoice>,
    payments: HashMap<String, Payment>,
    invoice_counters: HashMap<(i32, u32), u32>,
}

/// Reference backend: every collection behind one lock, so conditional
/// creates and the payment transaction are genuinely atomic. The offline
/// toggle and commit delay exist for failure and race tests.
#[derive(Default)]
pub struct InMemoryLedgerStore {
    collections: Mutex<Collections>,
    offline: AtomicBool,
    commit_delay_ms: AtomicU64,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_offline(&self) {
        self.offline.fetch_xor(true, Ordering::SeqCst);
    }

    /// Delay applied before `commit_payment` takes the lock, to widen the
    /// window between a caller's read phase and its commit.
    pub fn set_commit_delay_ms(&self, ms: u64) {
        self.commit_delay_ms.store(ms, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Backend("store offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn recorded_total(collections: &Collections, invoice_id: &str) -> Decimal {
        collections
            .payments
            .values()
            .filter(|p| p.invoice_id == invoice_id)
            .map(|p| p.amount)
            .sum()
    }
}

#[async_trait::async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn insert_entry(&self, entry: TimeEntry) -> Result<(), StoreError> {
        self.check_online()?;
        let mut c = self.collections.lock().await;
        if c.entries.contains_key(&entry.id) {
            return Err(StoreError::AlreadyExists);
        }
        c.entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    async fn get_entry(&self, id: &str) -> Result<TimeEntry, StoreError> {
        self.check_online()?;
        let c = self.collections.lock().await;
        c.entries.get(id).cloned().ok_or(StoreError::NotFound)
    }

    async fn put_entry(&self, entry: TimeEntry) -> Result<(), StoreError> {
        self.check_online()?;
        let mut c = self.collections.lock().await;
        if !c.entries.contains_key(&entry.id) {
            return Err(StoreError::NotFound);
        }
        c.entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    async fn delete_entry(&self, id: &str) -> Result<(), StoreError> {
        self.check_online()?;
        let mut c = self.collections.lock().await;
        c.entries
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn entries_by_user(
        &self,
        user_id: &str,
        range: DateRange,
    ) -> Result<Vec<TimeEntry>, StoreError> {
        self.check_online()?;
        let c = self.collections.lock().await;
        let mut hits: Vec<TimeEntry> = c
            .entries
            .values()
            .filter(|e| e.user_id == user_id && range.contains(e.date))
            .cloned()
            .collect();
        hits.sort_by(|a, b| (a.date, a.start_time, &a.id).cmp(&(b.date, b.start_time, &b.id)));
        Ok(hits)
    }

    async fn entries_by_project(
        &self,
        project_id: &str,
        range: DateRange,
    ) -> Result<Vec<TimeEntry>, StoreError> {
        self.check_online()?;
        let c = self.collections.lock().await;
        let mut hits: Vec<TimeEntry> = c
            .entries
            .values()
            .filter(|e| e.project_id == project_id && range.contains(e.date))
            .cloned()
            .collect();
        hits.sort_by(|a, b| (a.date, a.start_time, &a.id).cmp(&(b.date, b.start_time, &b.id)));
        Ok(hits)
    }

    async fn entries_by_status(
        &self,
        status: TimeEntryStatus,
        range: DateRange,
    ) -> Result<Vec<TimeEntry>, StoreError> {
        self.check_online()?;
        let c = self.collections.lock().await;
        let mut hits: Vec<TimeEntry> = c
            .entries
            .values()
            .filter(|e| e.status == status && range.contains(e.date))
            .cloned()
            .collect();
        hits.sort_by(|a, b| (a.date, a.start_time, &a.id).cmp(&(b.date, b.start_time, &b.id)));
        Ok(hits)
    }

    async fn insert_session(&self, session: TimerSession) -> Result<(), StoreError> {
        self.check_online()?;
        let mut c = self.collections.lock().await;
        if c.sessions.contains_key(&session.user_id) {
            return Err(StoreError::AlreadyExists);
        }
        c.sessions.insert(session.user_id.clone(), session);
        Ok(())
    }

    async fn get_session(&self, user_id: &str) -> Result<TimerSession, StoreError> {
        self.check_online()?;
        let c = self.collections.lock().await;
        c.sessions.get(user_id).cloned().ok_or(StoreError::NotFound)
    }

    async fn delete_session(&self, user_id: &str) -> Result<(), StoreError> {
        self.check_online()?;
        let mut c = self.collections.lock().await;
        c.sessions
            .remove(user_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn insert_invoice(&self, invoice: Invoice) -> Result<(), StoreError> {
        self.check_online()?;
        let mut c = self.collections.lock().await;
        if c.invoices.contains_key(&invoice.id) {
            return Err(StoreError::AlreadyExists);
        }
        c.invoices.insert(invoice.id.clone(), invoice);
        Ok(())
    }

    async fn get_invoice(&self, id: &str) -> Result<Invoice, StoreError> {
        self.check_online()?;
        let c = self.collections.lock().await;
        c.invoices.get(id).cloned().ok_or(StoreError::NotFound)
    }

    async fn put_invoice(&self, invoice: Invoice) -> Result<(), StoreError> {
        self.check_online()?;
        let mut c = self.collections.lock().await;
        if !c.invoices.contains_key(&invoice.id) {
            return Err(StoreError::NotFound);
        }
        c.invoices.insert(invoice.id.clone(), invoice);
        Ok(())
    }

    async fn invoices_by_client(&self, client_id: &str) -> Result<Vec<Invoice>, StoreError> {
        self.check_online()?;
        let c = self.collections.lock().await;
        let mut hits: Vec<Invoice> = c
            .invoices
            .values()
            .filter(|i| i.client_id == client_id)
            .cloned()
            .collect();
        hits.sort_by(|a, b| (a.issue_date, &a.id).cmp(&(b.issue_date, &b.id)));
        Ok(hits)
    }

    async fn invoices_by_status(&self, status: InvoiceStatus) -> Result<Vec<Invoice>, StoreError> {
        self.check_online()?;
        let c = self.collections.lock().await;
        let mut hits: Vec<Invoice> = c
            .invoices
            .values()
            .filter(|i| i.status == status)
            .cloned()
            .collect();
        hits.sort_by(|a, b| (a.due_date, &a.id).cmp(&(b.due_date, &b.id)));
        Ok(hits)
    }

    async fn invoice_by_number(&self, number: &str) -> Result<Invoice, StoreError> {
        self.check_online()?;
        let c = self.collections.lock().await;
        c.invoices
            .values()
            .find(|i| i.invoice_number == number)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn next_invoice_sequence(&self, year: i32, month: u32) -> Result<u32, StoreError> {
        self.check_online()?;
        let mut c = self.collections.lock().await;
        let counter = c.invoice_counters.entry((year, month)).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn payments_by_invoice(&self, invoice_id: &str) -> Result<Vec<Payment>, StoreError> {
        self.check_online()?;
        let c = self.collections.lock().await;
        let mut hits: Vec<Payment> = c
            .payments
            .values()
            .filter(|p| p.invoice_id == invoice_id)
            .cloned()
            .collect();
        hits.sort_by(|a, b| (a.payment_date, &a.id).cmp(&(b.payment_date, &b.id)));
        Ok(hits)
    }

    async fn commit_payment(
        &self,
        payment: Payment,
        expected_prior_total: Decimal,
        paid: Option<PaidStamp>,
    ) -> Result<(), StoreError> {
        self.check_online()?;
        let delay = self.commit_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let mut c = self.collections.lock().await;

        // Conditions are evaluated under the lock; nothing is written unless
        // all of them hold.
        if c.payments.contains_key(&payment.id) {
            return Err(StoreError::ConditionFailed);
        }
        if !c.invoices.contains_key(&payment.invoice_id) {
            return Err(StoreError::ConditionFailed);
        }
        if Self::recorded_total(&c, &payment.invoice_id) != expected_prior_total {
            return Err(StoreError::ConditionFailed);
        }

        if let Some(stamp) = paid {
            let invoice = c
                .invoices
                .get_mut(&payment.invoice_id)
                .ok_or(StoreError::ConditionFailed)?;
            invoice.status = InvoiceStatus::Paid;
            invoice.paid_date = Some(stamp.paid_date);
            invoice.updated_at = payment.created_at;
        }
        c.payments.insert(payment.id.clone(), payment);
        Ok(())
    }
}
