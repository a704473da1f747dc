// Invoice and payment ledger domain. Framework-free.

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::core::money::round2;

pub const DEFAULT_PAYMENT_TERMS_DAYS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Viewed,
    Paid,
    Overdue,
    Cancelled,
    Refunded,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Viewed => "viewed",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
            InvoiceStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(InvoiceStatus::Draft),
            "sent" => Some(InvoiceStatus::Sent),
            "viewed" => Some(InvoiceStatus::Viewed),
            "paid" => Some(InvoiceStatus::Paid),
            "overdue" => Some(InvoiceStatus::Overdue),
            "cancelled" => Some(InvoiceStatus::Cancelled),
            "refunded" => Some(InvoiceStatus::Refunded),
            _ => None,
        }
    }

    pub fn allowed_transitions(&self) -> &'static [InvoiceStatus] {
        match self {
            InvoiceStatus::Draft => &[InvoiceStatus::Sent, InvoiceStatus::Cancelled],
            InvoiceStatus::Sent => &[
                InvoiceStatus::Viewed,
                InvoiceStatus::Paid,
                InvoiceStatus::Overdue,
                InvoiceStatus::Cancelled,
            ],
            InvoiceStatus::Viewed => &[
                InvoiceStatus::Paid,
                InvoiceStatus::Overdue,
                InvoiceStatus::Cancelled,
            ],
            InvoiceStatus::Paid => &[InvoiceStatus::Refunded],
            InvoiceStatus::Overdue => &[InvoiceStatus::Paid, InvoiceStatus::Cancelled],
            InvoiceStatus::Cancelled | InvoiceStatus::Refunded => &[],
        }
    }

    /// Self-transition is always allowed and is a no-op for the caller.
    pub fn can_transition_to(&self, next: InvoiceStatus) -> bool {
        *self == next || self.allowed_transitions().contains(&next)
    }

    /// Payments may only land on an invoice the client has been billed for.
    pub fn accepts_payments(&self) -> bool {
        matches!(
            self,
            InvoiceStatus::Sent | InvoiceStatus::Viewed | InvoiceStatus::Overdue
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItemKind {
    Time,
    Expense,
    Fixed,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub kind: LineItemKind,
    pub description: String,
    pub quantity: Decimal,
    pub rate: Decimal,
    pub amount: Decimal,
    pub taxable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceFrequency {
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
}

/// Pure next-date computation; nothing in the core schedules it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringInvoiceConfig {
    pub frequency: RecurrenceFrequency,
    pub interval: u32,
    pub generated_count: u32,
    pub next_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    pub client_id: String,
    pub client_name: String,
    pub project_ids: Vec<String>,
    pub time_entry_ids: Vec<String>,
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub line_items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub currency: String,
    pub payment_terms: String,
    pub is_recurring: bool,
    pub recurring: Option<RecurringInvoiceConfig>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Completed,
}

/// Append-only once recorded; never mutated or deleted by this core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub invoice_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub payment_date: NaiveDate,
    pub payment_method: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub external_payment_id: Option<String>,
    pub processor_fee: Option<Decimal>,
    pub status: PaymentStatus,
    pub recorded_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

/// total = subtotal - discount + tax, where tax applies only to taxable line
/// items net of the discount.
pub fn compute_totals(
    line_items: &[LineItem],
    discount_amount: Decimal,
    tax_rate: Decimal,
) -> InvoiceTotals {
    let subtotal = round2(line_items.iter().map(|item| item.amount).sum());
    let taxable_subtotal: Decimal = line_items
        .iter()
        .filter(|item| item.taxable)
        .map(|item| item.amount)
        .sum();
    let taxable_base = (taxable_subtotal - discount_amount).max(Decimal::ZERO);
    let tax_amount = round2(taxable_base * tax_rate);
    let total_amount = round2(subtotal - discount_amount + tax_amount);
    InvoiceTotals {
        subtotal,
        tax_amount,
        total_amount,
    }
}

/// "Net N" -> N days, "Due on receipt" -> 0, anything else -> 30 days.
pub fn due_date_from_terms(issue_date: NaiveDate, terms: &str) -> NaiveDate {
    let normalized = terms.trim().to_lowercase();
    let days = if normalized == "due on receipt" {
        0
    } else if let Some(n) = normalized
        .strip_prefix("net")
        .and_then(|rest| rest.trim().parse::<u64>().ok())
    {
        n
    } else {
        DEFAULT_PAYMENT_TERMS_DAYS
    };
    issue_date
        .checked_add_days(Days::new(days))
        .unwrap_or(issue_date)
}

pub fn invoice_number(year: i32, month: u32, sequence: u32) -> String {
    format!("INV-{year}-{month:02}-{sequence:04}")
}

/// Next due date for a recurring invoice, a pure function of the config.
pub fn next_recurrence(
    frequency: RecurrenceFrequency,
    interval: u32,
    from: NaiveDate,
) -> NaiveDate {
    let interval = interval.max(1);
    let next = match frequency {
        RecurrenceFrequency::Weekly => from.checked_add_days(Days::new(7 * interval as u64)),
        RecurrenceFrequency::Biweekly => from.checked_add_days(Days::new(14 * interval as u64)),
        RecurrenceFrequency::Monthly => from.checked_add_months(Months::new(interval)),
        RecurrenceFrequency::Quarterly => from.checked_add_months(Months::new(3 * interval)),
        RecurrenceFrequency::Yearly => from.checked_add_months(Months::new(12 * interval)),
    };
    next.unwrap_or(from)
}


#[cfg(test)]
mod invoice_domain_tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(InvoiceStatus::Draft, InvoiceStatus::Sent, true)]
    #[case(InvoiceStatus::Draft, InvoiceStatus::Cancelled, true)]
    #[case(InvoiceStatus::Draft, InvoiceStatus::Paid, false)]
    #[case(InvoiceStatus::Sent, InvoiceStatus::Viewed, true)]
    #[case(InvoiceStatus::Sent, InvoiceStatus::Paid, true)]
    #[case(InvoiceStatus::Viewed, InvoiceStatus::Overdue, true)]
    #[case(InvoiceStatus::Overdue, InvoiceStatus::Paid, true)]
    #[case(InvoiceStatus::Paid, InvoiceStatus::Refunded, true)]
    #[case(InvoiceStatus::Paid, InvoiceStatus::Sent, false)]
    #[case(InvoiceStatus::Cancelled, InvoiceStatus::Sent, false)]
    #[case(InvoiceStatus::Cancelled, InvoiceStatus::Paid, false)]
    #[case(InvoiceStatus::Refunded, InvoiceStatus::Draft, false)]
    fn it_should_enforce_the_status_table(
        #[case] from: InvoiceStatus,
        #[case] to: InvoiceStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[rstest]
    fn it_should_always_allow_self_transition() {
        for status in [
            InvoiceStatus::Draft,
            InvoiceStatus::Sent,
            InvoiceStatus::Viewed,
            InvoiceStatus::Paid,
            InvoiceStatus::Overdue,
            InvoiceStatus::Cancelled,
            InvoiceStatus::Refunded,
        ] {
            assert!(status.can_transition_to(status));
        }
    }

    #[rstest]
    fn it_should_compute_totals_with_tax_on_taxable_items_net_of_discount() {
        let items = vec![
            fixtures::line_item(dec!(100.00), true),
            fixtures::line_item(dec!(50.00), false),
        ];
        let totals = compute_totals(&items, dec!(20.00), dec!(0.10));
        assert_eq!(totals.subtotal, dec!(150.00));
        // taxable base: 100 - 20 = 80, tax 8.00
        assert_eq!(totals.tax_amount, dec!(8.00));
        assert_eq!(totals.total_amount, dec!(138.00));
    }

    #[rstest]
    fn it_should_not_tax_below_zero_when_discount_swallows_the_taxable_base() {
        let items = vec![fixtures::line_item(dec!(30.00), true)];
        let totals = compute_totals(&items, dec!(50.00), dec!(0.21));
        assert_eq!(totals.tax_amount, dec!(0.00));
        assert_eq!(totals.total_amount, dec!(-20.00));
    }

    #[rstest]
    fn it_should_round_totals_to_two_decimals() {
        let items = vec![LineItem {
            kind: LineItemKind::Time,
            description: "dev".to_string(),
            quantity: dec!(1.33),
            rate: dec!(85.50),
            amount: dec!(113.72),
            taxable: true,
        }];
        let totals = compute_totals(&items, dec!(0), dec!(0.19));
        assert_eq!(totals.tax_amount, dec!(21.61));
        assert_eq!(totals.total_amount, dec!(135.33));
    }

    #[rstest]
    #[case("Net 30", 31)]
    #[case("net 15", 15)]
    #[case("Net 7", 7)]
    #[case("Due on receipt", 1)]
    #[case("whenever", 31)]
    fn it_should_compute_due_dates_from_terms(#[case] terms: &str, #[case] due_day: u32) {
        let issue = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let due = due_date_from_terms(issue, terms);
        assert_eq!(due, NaiveDate::from_ymd_opt(2026, 3, due_day).unwrap());
    }

    #[rstest]
    fn it_should_format_invoice_numbers_with_padded_month_and_sequence() {
        assert_eq!(invoice_number(2026, 3, 7), "INV-2026-03-0007");
        assert_eq!(invoice_number(2026, 11, 123), "INV-2026-11-0123");
    }

    #[rstest]
    #[case(RecurrenceFrequency::Weekly, 1, 2026, 3, 8)]
    #[case(RecurrenceFrequency::Biweekly, 1, 2026, 3, 15)]
    #[case(RecurrenceFrequency::Monthly, 1, 2026, 4, 1)]
    #[case(RecurrenceFrequency::Monthly, 2, 2026, 5, 1)]
    #[case(RecurrenceFrequency::Quarterly, 1, 2026, 6, 1)]
    #[case(RecurrenceFrequency::Yearly, 1, 2027, 3, 1)]
    fn it_should_compute_the_next_recurrence_date(
        #[case] frequency: RecurrenceFrequency,
        #[case] interval: u32,
        #[case] year: i32,
        #[case] month: u32,
        #[case] day: u32,
    ) {
        let from = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(
            next_recurrence(frequency, interval, from),
            NaiveDate::from_ymd_opt(year, month, day).unwrap()
        );
    }

    #[rstest]
    fn it_should_clamp_month_end_recurrence() {
        let from = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        assert_eq!(
            next_recurrence(RecurrenceFrequency::Monthly, 1, from),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
        );
    }

    #[rstest]
    fn it_should_only_accept_payments_on_billed_invoices() {
        assert!(InvoiceStatus::Sent.accepts_payments());
        assert!(InvoiceStatus::Viewed.accepts_payments());
        assert!(InvoiceStatus::Overdue.accepts_payments());
        assert!(!InvoiceStatus::Draft.accepts_payments());
        assert!(!InvoiceStatus::Cancelled.accepts_payments());
        assert!(!InvoiceStatus::Refunded.accepts_payments());
        assert!(!InvoiceStatus::Paid.accepts_payments());
    }
}
