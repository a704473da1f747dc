use std::sync::Arc;

use crate::modules::invoices::use_cases::create_invoice::CreateInvoiceHandler;
use crate::modules::invoices::use_cases::list_invoices::ListInvoicesHandler;
use crate::modules::invoices::use_cases::record_payment::RecordPaymentHandler;
use crate::modules::invoices::use_cases::update_invoice::UpdateInvoiceHandler;
use crate::modules::invoices::use_cases::update_invoice_status::UpdateInvoiceStatusHandler;
use crate::modules::summaries::use_cases::daily_summary::DailySummaryHandler;
use crate::modules::summaries::use_cases::weekly_overview::WeeklyOverviewHandler;
use crate::modules::summaries::user_directory::{StaticUserDirectory, UserDirectory};
use crate::modules::time_entries::use_cases::approve_entries::ApproveEntriesHandler;
use crate::modules::time_entries::use_cases::create_entry::CreateEntryHandler;
use crate::modules::time_entries::use_cases::delete_entry::DeleteEntryHandler;
use crate::modules::time_entries::use_cases::list_entries::ListEntriesHandler;
use crate::modules::time_entries::use_cases::reject_entries::RejectEntriesHandler;
use crate::modules::time_entries::use_cases::submit_entries::SubmitEntriesHandler;
use crate::modules::time_entries::use_cases::track_timer::{StartTimerHandler, StopTimerHandler};
use crate::modules::time_entries::use_cases::update_entry::UpdateEntryHandler;
use crate::shared::infrastructure::store::in_memory::InMemoryLedgerStore;
use crate::shared::infrastructure::store::LedgerStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub create_entry: Arc<CreateEntryHandler>,
    pub update_entry: Arc<UpdateEntryHandler>,
    pub delete_entry: Arc<DeleteEntryHandler>,
    pub list_entries: Arc<ListEntriesHandler>,
    pub submit_entries: Arc<SubmitEntriesHandler>,
    pub approve_entries: Arc<ApproveEntriesHandler>,
    pub reject_entries: Arc<RejectEntriesHandler>,
    pub start_timer: Arc<StartTimerHandler>,
    pub stop_timer: Arc<StopTimerHandler>,
    pub create_invoice: Arc<CreateInvoiceHandler>,
    pub update_invoice: Arc<UpdateInvoiceHandler>,
    pub update_invoice_status: Arc<UpdateInvoiceStatusHandler>,
    pub record_payment: Arc<RecordPaymentHandler>,
    pub list_invoices: Arc<ListInvoicesHandler>,
    pub daily_summary: Arc<DailySummaryHandler>,
    pub weekly_overview: Arc<WeeklyOverviewHandler>,
}

impl AppState {
    /// Wires every use case against the given store and directory.
    pub fn wire(store: Arc<dyn LedgerStore>, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            create_entry: Arc::new(CreateEntryHandler::new(store.clone())),
            update_entry: Arc::new(UpdateEntryHandler::new(store.clone())),
            delete_entry: Arc::new(DeleteEntryHandler::new(store.clone())),
            list_entries: Arc::new(ListEntriesHandler::new(store.clone())),
            submit_entries: Arc::new(SubmitEntriesHandler::new(store.clone())),
            approve_entries: Arc::new(ApproveEntriesHandler::new(store.clone())),
            reject_entries: Arc::new(RejectEntriesHandler::new(store.clone())),
            start_timer: Arc::new(StartTimerHandler::new(store.clone())),
            stop_timer: Arc::new(StopTimerHandler::new(store.clone())),
            create_invoice: Arc::new(CreateInvoiceHandler::new(store.clone())),
            update_invoice: Arc::new(UpdateInvoiceHandler::new(store.clone())),
            update_invoice_status: Arc::new(UpdateInvoiceStatusHandler::new(store.clone())),
            record_payment: Arc::new(RecordPaymentHandler::new(store.clone())),
            list_invoices: Arc::new(ListInvoicesHandler::new(store.clone())),
            daily_summary: Arc::new(DailySummaryHandler::new(store.clone(), directory.clone())),
            weekly_overview: Arc::new(WeeklyOverviewHandler::new(store.clone(), directory)),
            store,
        }
    }

    pub fn in_memory() -> Self {
        Self::wire(
            Arc::new(InMemoryLedgerStore::new()),
            Arc::new(StaticUserDirectory::new()),
        )
    }
}
