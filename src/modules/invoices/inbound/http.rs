use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::modules::invoices::domain::{InvoiceStatus, Payment};
use crate::modules::invoices::use_cases::create_invoice::CreateInvoice;
use crate::modules::invoices::use_cases::record_payment::RecordPayment;
use crate::modules::invoices::use_cases::update_invoice::InvoicePatch;
use crate::shared::core::errors::CoreError;
use crate::shell::envelope::{self, CurrentActor};
use crate::shell::state::AppState;

#[derive(Deserialize)]
pub struct StatusBody {
    pub status: String,
}

#[derive(Serialize)]
pub struct PaymentRecorded {
    pub payment: Payment,
    pub invoice_status: InvoiceStatus,
    pub remaining_balance: rust_decimal::Decimal,
}

fn bad_json() -> Response {
    StatusCode::UNPROCESSABLE_ENTITY.into_response()
}

pub async fn create(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    body: Result<Json<CreateInvoice>, JsonRejection>,
) -> Response {
    let Ok(Json(command)) = body else {
        return bad_json();
    };
    match state.create_invoice.handle(&actor, command).await {
        Ok(invoice) => envelope::ok(StatusCode::CREATED, invoice),
        Err(err) => envelope::failure(&err),
    }
}

pub async fn get(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(invoice_id): Path<String>,
) -> Response {
    match state.list_invoices.get(&actor, &invoice_id).await {
        Ok(invoice) => envelope::ok(StatusCode::OK, invoice),
        Err(err) => envelope::failure(&err),
    }
}

pub async fn update(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(invoice_id): Path<String>,
    body: Result<Json<InvoicePatch>, JsonRejection>,
) -> Response {
    let Ok(Json(patch)) = body else {
        return bad_json();
    };
    match state.update_invoice.handle(&actor, &invoice_id, patch).await {
        Ok(invoice) => envelope::ok(StatusCode::OK, invoice),
        Err(err) => envelope::failure(&err),
    }
}

pub async fn list_by_client(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(client_id): Path<String>,
) -> Response {
    match state.list_invoices.by_client(&actor, &client_id).await {
        Ok(invoices) => envelope::ok(StatusCode::OK, invoices),
        Err(err) => envelope::failure(&err),
    }
}

pub async fn list_by_status(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(status): Path<String>,
) -> Response {
    let Some(status) = InvoiceStatus::parse(&status) else {
        return envelope::failure(&CoreError::Validation(vec![format!(
            "unknown invoice status: {status}"
        )]));
    };
    match state.list_invoices.by_status(&actor, status).await {
        Ok(invoices) => envelope::ok(StatusCode::OK, invoices),
        Err(err) => envelope::failure(&err),
    }
}

pub async fn set_status(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(invoice_id): Path<String>,
    body: Result<Json<StatusBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return bad_json();
    };
    let Some(next) = InvoiceStatus::parse(&body.status) else {
        return envelope::failure(&CoreError::Validation(vec![format!(
            "unknown invoice status: {}",
            body.status
        )]));
    };
    match state
        .update_invoice_status
        .handle(&actor, &invoice_id, next)
        .await
    {
        Ok(invoice) => envelope::ok(StatusCode::OK, invoice),
        Err(err) => envelope::failure(&err),
    }
}

pub async fn record_payment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(invoice_id): Path<String>,
    body: Result<Json<RecordPayment>, JsonRejection>,
) -> Response {
    let Ok(Json(command)) = body else {
        return bad_json();
    };
    match state.record_payment.handle(&actor, &invoice_id, command).await {
        Ok(receipt) => envelope::ok(
            StatusCode::CREATED,
            PaymentRecorded {
                payment: receipt.payment,
                invoice_status: receipt.invoice_status,
                remaining_balance: receipt.remaining_balance,
            },
        ),
        Err(err) => envelope::failure(&err),
    }
}

pub async fn list_payments(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(invoice_id): Path<String>,
) -> Response {
    match state.list_invoices.payments(&actor, &invoice_id).await {
        Ok(payments) => envelope::ok(StatusCode::OK, payments),
        Err(err) => envelope::failure(&err),
    }
}
