use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::modules::invoices::domain::{Invoice, InvoiceStatus, LineItem, compute_totals, due_date_from_terms};
use crate::shared::core::auth::Actor;
use crate::shared::core::errors::CoreError;
use crate::shared::core::patch::clearable;
use crate::shared::infrastructure::store::{LedgerStore, StoreError};

/// Explicit patch structure. Which fields trigger which recomputation is an
/// explicit rule table below, not presence-driven logic.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoicePatch {
    pub client_name: Option<String>,
    pub line_items: Option<Vec<LineItem>>,
    pub discount_amount: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub payment_terms: Option<String>,
    #[serde(default, deserialize_with = "clearable")]
    pub notes: Option<Option<String>>,
}

impl InvoicePatch {
    pub fn is_empty(&self) -> bool {
        self.client_name.is_none()
            && self.line_items.is_none()
            && self.discount_amount.is_none()
            && self.tax_rate.is_none()
            && self.issue_date.is_none()
            && self.due_date.is_none()
            && self.payment_terms.is_none()
            && self.notes.is_none()
    }

    /// Rule: touching line items, discount or tax rate invalidates totals.
    fn touches_totals(&self) -> bool {
        self.line_items.is_some() || self.discount_amount.is_some() || self.tax_rate.is_some()
    }

    /// Rule: touching issue date or terms invalidates the due date, unless an
    /// explicit due date is part of the same patch.
    fn touches_due_date(&self) -> bool {
        (self.issue_date.is_some() || self.payment_terms.is_some()) && self.due_date.is_none()
    }
}

pub struct UpdateInvoiceHandler {
    store: Arc<dyn LedgerStore>,
}

impl UpdateInvoiceHandler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        actor: &Actor,
        invoice_id: &str,
        patch: InvoicePatch,
    ) -> Result<Invoice, CoreError> {
        if !actor.role.can_manage() {
            return Err(CoreError::Forbidden(
                "only managers and admins may update invoices".to_string(),
            ));
        }
        if patch.is_empty() {
            return Err(CoreError::invalid_state(
                "NO_VALID_UPDATES",
                "no recognized field present in the patch",
            ));
        }

        let mut invoice = self
            .store
            .get_invoice(invoice_id)
            .await
            .map_err(|err| match err {
                StoreError::NotFound => CoreError::not_found("invoice", invoice_id),
                other => CoreError::from(other),
            })?;

        if matches!(
            invoice.status,
            InvoiceStatus::Paid | InvoiceStatus::Cancelled | InvoiceStatus::Refunded
        ) {
            return Err(CoreError::invalid_state(
                "INVALID_STATE",
                format!(
                    "invoice is {} and can no longer be edited",
                    invoice.status.as_str()
                ),
            ));
        }

        let recompute_totals = patch.touches_totals();
        let recompute_due = patch.touches_due_date();

        if let Some(client_name) = patch.client_name {
            invoice.client_name = client_name;
        }
        if let Some(line_items) = patch.line_items {
            invoice.line_items = line_items;
        }
        if let Some(discount_amount) = patch.discount_amount {
            if discount_amount < Decimal::ZERO {
                return Err(CoreError::Validation(vec![
                    "discount must not be negative".to_string(),
                ]));
            }
            invoice.discount_amount = discount_amount;
        }
        if let Some(tax_rate) = patch.tax_rate {
            if tax_rate < Decimal::ZERO {
                return Err(CoreError::Validation(vec![
                    "tax rate must not be negative".to_string(),
                ]));
            }
            invoice.tax_rate = tax_rate;
        }
        if let Some(issue_date) = patch.issue_date {
            invoice.issue_date = issue_date;
        }
        if let Some(due_date) = patch.due_date {
            invoice.due_date = due_date;
        }
        if let Some(payment_terms) = patch.payment_terms {
            invoice.payment_terms = payment_terms;
        }
        if let Some(notes) = patch.notes {
            invoice.notes = notes;
        }

        if recompute_totals {
            let totals = compute_totals(
                &invoice.line_items,
                invoice.discount_amount,
                invoice.tax_rate,
            );
            // The ledger invariant holds at every write, not just when a
            // payment lands: the total may never drop below what is already
            // recorded against this invoice.
            let recorded: Decimal = self
                .store
                .payments_by_invoice(invoice_id)
                .await?
                .iter()
                .map(|p| p.amount)
                .sum();
            if totals.total_amount < recorded {
                return Err(CoreError::invariant(
                    "PAYMENT_EXCEEDS_INVOICE",
                    format!(
                        "recorded payments of {recorded} exceed the new total of {}",
                        totals.total_amount
                    ),
                ));
            }
            invoice.subtotal = totals.subtotal;
            invoice.tax_amount = totals.tax_amount;
            invoice.total_amount = totals.total_amount;
        }
        if recompute_due {
            invoice.due_date = due_date_from_terms(invoice.issue_date, &invoice.payment_terms);
        }
        invoice.updated_at = Utc::now();

        self.store.put_invoice(invoice.clone()).await.map_err(|err| {
            tracing::error!(invoice_id = %invoice.id, operation = "update_invoice", %err, "store write failed");
            CoreError::from(err)
        })?;
        Ok(invoice)
    }
}
