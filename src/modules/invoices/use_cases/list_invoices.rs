use std::sync::Arc;

use crate::modules::invoices::domain::{Invoice, InvoiceStatus, Payment};
use crate::shared::core::auth::Actor;
use crate::shared::core::errors::CoreError;
use crate::shared::infrastructure::store::{LedgerStore, StoreError};

pub struct ListInvoicesHandler {
    store: Arc<dyn LedgerStore>,
}

impl ListInvoicesHandler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    fn check_role(actor: &Actor) -> Result<(), CoreError> {
        if actor.role.can_manage() {
            Ok(())
        } else {
            Err(CoreError::Forbidden(
                "invoice listings require a manager role".to_string(),
            ))
        }
    }

    pub async fn by_client(
        &self,
        actor: &Actor,
        client_id: &str,
    ) -> Result<Vec<Invoice>, CoreError> {
        Self::check_role(actor)?;
        Ok(self.store.invoices_by_client(client_id).await?)
    }

    pub async fn by_status(
        &self,
        actor: &Actor,
        status: InvoiceStatus,
    ) -> Result<Vec<Invoice>, CoreError> {
        Self::check_role(actor)?;
        Ok(self.store.invoices_by_status(status).await?)
    }

    pub async fn get(&self, actor: &Actor, invoice_id: &str) -> Result<Invoice, CoreError> {
        Self::check_role(actor)?;
        self.store
            .get_invoice(invoice_id)
            .await
            .map_err(|err| match err {
                StoreError::NotFound => CoreError::not_found("invoice", invoice_id),
                other => CoreError::from(other),
            })
    }

    pub async fn payments(
        &self,
        actor: &Actor,
        invoice_id: &str,
    ) -> Result<Vec<Payment>, CoreError> {
        Self::check_role(actor)?;
        self.get(actor, invoice_id).await?;
        Ok(self.store.payments_by_invoice(invoice_id).await?)
    }
}
