use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::modules::invoices::domain::{InvoiceStatus, Payment, PaymentStatus};
use crate::shared::core::auth::Actor;
use crate::shared::core::errors::CoreError;
use crate::shared::infrastructure::store::{LedgerStore, PaidStamp, StoreError};

#[derive(Debug, Clone, Deserialize)]
pub struct RecordPayment {
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_method: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub external_payment_id: Option<String>,
    pub processor_fee: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub invoice_status: InvoiceStatus,
    pub remaining_balance: Decimal,
}

pub struct RecordPaymentHandler {
    store: Arc<dyn LedgerStore>,
}

impl RecordPaymentHandler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Invariant: for a given invoice, the sum of recorded payments never
    /// exceeds its total, even under concurrent calls. The check runs here,
    /// but the store transaction re-verifies the prior sum under its own
    /// atomicity, so a racing payment fails the condition instead of
    /// overpaying or double-marking the invoice.
    pub async fn handle(
        &self,
        actor: &Actor,
        invoice_id: &str,
        command: RecordPayment,
    ) -> Result<PaymentReceipt, CoreError> {
        if !actor.role.can_manage() {
            return Err(CoreError::Forbidden(
                "only managers and admins may record payments".to_string(),
            ));
        }
        if command.amount <= Decimal::ZERO {
            return Err(CoreError::Validation(vec![
                "payment amount must be positive".to_string(),
            ]));
        }

        let invoice = self
            .store
            .get_invoice(invoice_id)
            .await
            .map_err(|err| match err {
                StoreError::NotFound => CoreError::not_found("invoice", invoice_id),
                other => CoreError::from(other),
            })?;

        if !invoice.status.accepts_payments() {
            return Err(CoreError::invalid_state(
                "INVALID_STATE",
                format!(
                    "invoice is {} and does not accept payments",
                    invoice.status.as_str()
                ),
            ));
        }

        let existing: Decimal = self
            .store
            .payments_by_invoice(invoice_id)
            .await?
            .iter()
            .map(|p| p.amount)
            .sum();

        if existing + command.amount > invoice.total_amount {
            return Err(CoreError::invariant(
                "PAYMENT_EXCEEDS_INVOICE",
                format!(
                    "payment of {} would exceed the open balance of {}",
                    command.amount,
                    invoice.total_amount - existing
                ),
            ));
        }

        let settles = existing + command.amount >= invoice.total_amount;
        let now = Utc::now();
        let payment = Payment {
            id: Uuid::now_v7().to_string(),
            invoice_id: invoice_id.to_string(),
            amount: command.amount,
            currency: invoice.currency.clone(),
            payment_date: command.payment_date,
            payment_method: command.payment_method,
            reference: command.reference,
            notes: command.notes,
            external_payment_id: command.external_payment_id,
            processor_fee: command.processor_fee,
            status: PaymentStatus::Completed,
            recorded_by: actor.user_id.clone(),
            created_at: now,
            updated_at: now,
        };

        let stamp = settles.then(|| PaidStamp {
            paid_date: command.payment_date,
        });
        match self
            .store
            .commit_payment(payment.clone(), existing, stamp)
            .await
        {
            Ok(()) => {}
            Err(StoreError::ConditionFailed) => {
                tracing::warn!(invoice_id, operation = "record_payment", "concurrent payment detected");
                return Err(CoreError::Conflict(
                    "another payment was recorded concurrently, retry".to_string(),
                ));
            }
            Err(err) => {
                tracing::error!(invoice_id, operation = "record_payment", %err, "store transaction failed");
                return Err(CoreError::from(err));
            }
        }

        tracing::info!(
            invoice_id,
            payment_id = %payment.id,
            settled = settles,
            "payment recorded"
        );
        Ok(PaymentReceipt {
            remaining_balance: invoice.total_amount - existing - payment.amount,
            invoice_status: if settles {
                InvoiceStatus::Paid
            } else {
                invoice.status
            },
            payment,
        })
    }
}

#[cfg(test)]
mod record_payment_tests {
    use super::*;
    use crate::modules::invoices::domain::fixtures;
    use crate::shared::core::auth::Role;
    use crate::shared::infrastructure::store::in_memory::InMemoryLedgerStore;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn command(amount: Decimal) -> RecordPayment {
        RecordPayment {
            amount,
            payment_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            payment_method: "bank_transfer".to_string(),
            reference: None,
            notes: None,
            external_payment_id: None,
            processor_fee: None,
        }
    }

    async fn seeded(total: Decimal) -> (Arc<InMemoryLedgerStore>, RecordPaymentHandler) {
        let store = Arc::new(InMemoryLedgerStore::new());
        store
            .insert_invoice(fixtures::invoice("inv-1", total))
            .await
            .unwrap();
        (store.clone(), RecordPaymentHandler::new(store))
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_record_a_partial_payment_without_settling() {
        let (store, handler) = seeded(dec!(100.00)).await;
        let actor = Actor::new("manager-1", Role::Manager);

        let receipt = handler
            .handle(&actor, "inv-1", command(dec!(40.00)))
            .await
            .unwrap();
        assert_eq!(receipt.invoice_status, InvoiceStatus::Sent);
        assert_eq!(receipt.remaining_balance, dec!(60.00));

        let invoice = store.get_invoice("inv-1").await.unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Sent);
        assert_eq!(invoice.paid_date, None);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_reject_overpayment_without_writing() {
        let (store, handler) = seeded(dec!(100.00)).await;
        let actor = Actor::new("manager-1", Role::Manager);
        handler
            .handle(&actor, "inv-1", command(dec!(80.00)))
            .await
            .unwrap();

        let result = handler.handle(&actor, "inv-1", command(dec!(30.00))).await;
        match result {
            Err(err) => assert_eq!(err.code(), "PAYMENT_EXCEEDS_INVOICE"),
            other => panic!("expected error, got {other:?}"),
        }

        assert_eq!(store.payments_by_invoice("inv-1").await.unwrap().len(), 1);
        let invoice = store.get_invoice("inv-1").await.unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Sent);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_settle_the_invoice_on_full_payment() {
        let (store, handler) = seeded(dec!(100.00)).await;
        let actor = Actor::new("manager-1", Role::Manager);
        handler
            .handle(&actor, "inv-1", command(dec!(80.00)))
            .await
            .unwrap();

        let receipt = handler
            .handle(&actor, "inv-1", command(dec!(20.00)))
            .await
            .unwrap();
        assert_eq!(receipt.invoice_status, InvoiceStatus::Paid);
        assert_eq!(receipt.remaining_balance, dec!(0.00));

        let invoice = store.get_invoice("inv-1").await.unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(
            invoice.paid_date,
            Some(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap())
        );
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_fail_exactly_one_of_two_racing_payments() {
        let (store, handler) = seeded(dec!(100.00)).await;
        store.set_commit_delay_ms(10);
        let actor = Actor::new("manager-1", Role::Manager);

        let (a, b) = tokio::join!(
            handler.handle(&actor, "inv-1", command(dec!(60.00))),
            handler.handle(&actor, "inv-1", command(dec!(60.00)))
        );
        assert!(
            a.is_ok() ^ b.is_ok(),
            "exactly one racing payment should land"
        );

        let recorded: Decimal = store
            .payments_by_invoice("inv-1")
            .await
            .unwrap()
            .iter()
            .map(|p| p.amount)
            .sum();
        assert_eq!(recorded, dec!(60.00));
        let invoice = store.get_invoice("inv-1").await.unwrap();
        assert!(recorded <= invoice.total_amount);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_reject_payments_on_draft_invoices() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let mut invoice = fixtures::invoice("inv-1", dec!(100.00));
        invoice.status = InvoiceStatus::Draft;
        store.insert_invoice(invoice).await.unwrap();
        let handler = RecordPaymentHandler::new(store);
        let actor = Actor::new("manager-1", Role::Manager);

        let result = handler.handle(&actor, "inv-1", command(dec!(10.00))).await;
        match result {
            Err(err) => assert_eq!(err.code(), "INVALID_STATE"),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_fail_invoice_not_found() {
        let handler = RecordPaymentHandler::new(Arc::new(InMemoryLedgerStore::new()));
        let actor = Actor::new("manager-1", Role::Manager);
        let result = handler.handle(&actor, "inv-404", command(dec!(10.00))).await;
        match result {
            Err(err) => assert_eq!(err.code(), "INVOICE_NOT_FOUND"),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_reject_non_positive_amounts() {
        let (_, handler) = seeded(dec!(100.00)).await;
        let actor = Actor::new("manager-1", Role::Manager);
        let result = handler.handle(&actor, "inv-1", command(dec!(0))).await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }
}
