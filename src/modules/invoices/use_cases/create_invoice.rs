use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::modules::invoices::domain::{
    Invoice, InvoiceStatus, LineItem, LineItemKind, RecurrenceFrequency, RecurringInvoiceConfig,
    compute_totals, due_date_from_terms, invoice_number, next_recurrence,
};
use crate::modules::time_entries::domain::TimeEntryStatus;
use crate::shared::core::auth::Actor;
use crate::shared::core::errors::CoreError;
use crate::shared::core::money::{line_amount, minutes_to_hours};
use crate::shared::infrastructure::store::LedgerStore;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateInvoice {
    pub client_id: String,
    pub client_name: String,
    #[serde(default)]
    pub time_entry_ids: Vec<String>,
    /// Explicit additions on top of the time-derived items.
    #[serde(default)]
    pub line_items: Vec<LineItemInput>,
    pub issue_date: Option<NaiveDate>,
    #[serde(default = "default_terms")]
    pub payment_terms: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub discount_amount: Decimal,
    #[serde(default)]
    pub tax_rate: Decimal,
    /// Fallback rate for billed entries that carry none of their own.
    pub default_hourly_rate: Option<Decimal>,
    pub recurrence: Option<RecurrenceInput>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineItemInput {
    pub kind: LineItemKind,
    pub description: String,
    pub quantity: Decimal,
    pub rate: Decimal,
    #[serde(default = "default_taxable")]
    pub taxable: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecurrenceInput {
    pub frequency: RecurrenceFrequency,
    #[serde(default = "default_interval")]
    pub interval: u32,
}

fn default_terms() -> String {
    "Net 30".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_taxable() -> bool {
    true
}

fn default_interval() -> u32 {
    1
}

pub struct CreateInvoiceHandler {
    store: Arc<dyn LedgerStore>,
}

impl CreateInvoiceHandler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, actor: &Actor, command: CreateInvoice) -> Result<Invoice, CoreError> {
        if !actor.role.can_manage() {
            return Err(CoreError::Forbidden(
                "only managers and admins may create invoices".to_string(),
            ));
        }

        let mut violations = Vec::new();
        let mut line_items = Vec::new();
        let mut project_ids = Vec::new();

        // Billed time entries become taxable time items at their hourly rate.
        for id in &command.time_entry_ids {
            let entry = match self.store.get_entry(id).await {
                Ok(entry) => entry,
                Err(_) => {
                    violations.push(format!("time entry {id} not found"));
                    continue;
                }
            };
            if entry.status != TimeEntryStatus::Approved {
                violations.push(format!("time entry {id} is not approved"));
                continue;
            }
            if !entry.is_billable {
                violations.push(format!("time entry {id} is not billable"));
                continue;
            }
            let rate = match entry.hourly_rate.or(command.default_hourly_rate) {
                Some(rate) => rate,
                None => {
                    violations.push(format!(
                        "time entry {id} has no hourly rate and no default was given"
                    ));
                    continue;
                }
            };
            let hours = minutes_to_hours(entry.duration_minutes);
            line_items.push(LineItem {
                kind: LineItemKind::Time,
                description: format!("{} ({})", entry.description, entry.date),
                quantity: hours,
                rate,
                amount: line_amount(hours, rate),
                taxable: true,
            });
            if !project_ids.contains(&entry.project_id) {
                project_ids.push(entry.project_id.clone());
            }
        }

        for input in command.line_items {
            if input.description.trim().is_empty() {
                violations.push("line item description must not be empty".to_string());
                continue;
            }
            line_items.push(LineItem {
                kind: input.kind,
                description: input.description,
                quantity: input.quantity,
                rate: input.rate,
                amount: line_amount(input.quantity, input.rate),
                taxable: input.taxable,
            });
        }

        if line_items.is_empty() {
            violations.push("an invoice needs at least one line item".to_string());
        }
        if command.discount_amount < Decimal::ZERO {
            violations.push("discount must not be negative".to_string());
        }
        if command.tax_rate < Decimal::ZERO {
            violations.push("tax rate must not be negative".to_string());
        }
        CoreError::violations(violations)?;

        let now = Utc::now();
        let issue_date = command.issue_date.unwrap_or_else(|| now.date_naive());
        let due_date = due_date_from_terms(issue_date, &command.payment_terms);
        let totals = compute_totals(&line_items, command.discount_amount, command.tax_rate);

        let sequence = self
            .store
            .next_invoice_sequence(issue_date.year(), issue_date.month())
            .await
            .map_err(|err| {
                tracing::error!(operation = "create_invoice", %err, "sequence allocation failed");
                CoreError::from(err)
            })?;
        let number = invoice_number(issue_date.year(), issue_date.month(), sequence);

        let recurring = command.recurrence.map(|r| RecurringInvoiceConfig {
            frequency: r.frequency,
            interval: r.interval,
            generated_count: 0,
            next_date: next_recurrence(r.frequency, r.interval, issue_date),
        });

        let invoice = Invoice {
            id: Uuid::now_v7().to_string(),
            invoice_number: number,
            client_id: command.client_id,
            client_name: command.client_name,
            project_ids,
            time_entry_ids: command.time_entry_ids,
            status: InvoiceStatus::Draft,
            issue_date,
            due_date,
            paid_date: None,
            line_items,
            subtotal: totals.subtotal,
            tax_rate: command.tax_rate,
            tax_amount: totals.tax_amount,
            discount_amount: command.discount_amount,
            total_amount: totals.total_amount,
            currency: command.currency,
            payment_terms: command.payment_terms,
            is_recurring: recurring.is_some(),
            recurring,
            notes: command.notes,
            created_at: now,
            updated_at: now,
            created_by: actor.user_id.clone(),
        };

        self.store
            .insert_invoice(invoice.clone())
            .await
            .map_err(|err| {
                tracing::error!(invoice_id = %invoice.id, operation = "create_invoice", %err, "store write failed");
                CoreError::from(err)
            })?;
        tracing::info!(invoice_id = %invoice.id, number = %invoice.invoice_number, "invoice created");
        Ok(invoice)
    }
}
