use std::sync::Arc;

use chrono::Utc;

use crate::modules::invoices::domain::{Invoice, InvoiceStatus};
use crate::shared::core::auth::Actor;
use crate::shared::core::errors::CoreError;
use crate::shared::infrastructure::store::{LedgerStore, StoreError};

pub struct UpdateInvoiceStatusHandler {
    store: Arc<dyn LedgerStore>,
}

impl UpdateInvoiceStatusHandler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        actor: &Actor,
        invoice_id: &str,
        next: InvoiceStatus,
    ) -> Result<Invoice, CoreError> {
        if !actor.role.can_manage() {
            return Err(CoreError::Forbidden(
                "only managers and admins may change invoice status".to_string(),
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

        // Self-transition is a no-op success, never an error.
        if invoice.status == next {
            return Ok(invoice);
        }
        if !invoice.status.can_transition_to(next) {
            return Err(CoreError::invariant(
                "INVALID_STATUS_TRANSITION",
                format!(
                    "invoice may not move from {} to {}",
                    invoice.status.as_str(),
                    next.as_str()
                ),
            ));
        }

        let now = Utc::now();
        invoice.status = next;
        if next == InvoiceStatus::Paid {
            invoice.paid_date = Some(now.date_naive());
        }
        invoice.updated_at = now;

        self.store.put_invoice(invoice.clone()).await.map_err(|err| {
            tracing::error!(invoice_id = %invoice.id, operation = "update_invoice_status", %err, "store write failed");
            CoreError::from(err)
        })?;
        tracing::info!(invoice_id = %invoice.id, status = next.as_str(), "invoice status changed");
        Ok(invoice)
    }
}
