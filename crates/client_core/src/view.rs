//! Presentation-ready snapshot of the dashboard.
//!
//! Renderers consume [`DashboardView`] as-is and keep no state of their own,
//! so what they show always matches the workflow and the loaded collection.

use rust_decimal::Decimal;
use shared::domain::{parse_timestamp, PaymentId, PaymentRecord, PaymentStatus};

use crate::{derive::StatusFilter, workflow::WorkflowState};

pub const DEFAULT_THUMBNAIL: &str = "/SriLanks.webp";
pub const LOADING_MESSAGE: &str = "Loading your payment history...";
pub const BANK_DETAILS_NOTICE: &str = "Please add your bank details in your profile before \
requesting any payments. If you have already added your bank details, please ignore this message.";
pub const EMPTY_STATE_TITLE: &str = "No payments found";
pub const EMPTY_STATE_CALL_TO_ACTION: &str = "Create an event to get started";

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRow {
    pub id: PaymentId,
    pub event_name: String,
    pub date_label: String,
    pub participant_count: u64,
    pub ticket_price: Decimal,
    pub status: PaymentStatus,
    pub total_amount: Decimal,
    pub thumbnail: String,
}

impl From<&PaymentRecord> for PaymentRow {
    fn from(record: &PaymentRecord) -> Self {
        Self {
            id: record.id.clone(),
            event_name: record.event_name.clone(),
            date_label: format_created_at(&record.created_at),
            participant_count: record.participant_count,
            ticket_price: record.ticket_price,
            status: record.payment_status,
            total_amount: record.total_amount(),
            thumbnail: record
                .images
                .first()
                .cloned()
                .unwrap_or_else(|| DEFAULT_THUMBNAIL.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    pub title: &'static str,
    pub message: String,
    pub call_to_action: &'static str,
}

pub fn empty_state(filter: &StatusFilter) -> EmptyState {
    let message = if filter.is_active() {
        format!("You don't have any {filter} payments.")
    } else {
        "You don't have any payments yet.".to_string()
    };
    EmptyState {
        title: EMPTY_STATE_TITLE,
        message,
        call_to_action: EMPTY_STATE_CALL_TO_ACTION,
    }
}

/// One option of the request dialog. The label carries the amount the
/// organizer is about to request.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: PaymentId,
    pub label: String,
    pub total_amount: Decimal,
}

impl From<&PaymentRecord> for Candidate {
    fn from(record: &PaymentRecord) -> Self {
        Self {
            id: record.id.clone(),
            label: candidate_label(record),
            total_amount: record.total_amount(),
        }
    }
}

pub fn candidate_label(record: &PaymentRecord) -> String {
    format!(
        "{} | {} participants | Rs{} | Rs{}",
        record.event_name,
        record.participant_count,
        format_amount(record.ticket_price),
        format_amount(record.total_amount()),
    )
}

pub fn format_amount(amount: Decimal) -> String {
    amount.normalize().to_string()
}

/// `Jan 1, 2024, 12:00 AM` in UTC; the raw value when it cannot be parsed.
pub fn format_created_at(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(at) => at.format("%b %-d, %Y, %I:%M %p").to_string(),
        None => raw.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub loading: bool,
    pub filter: StatusFilter,
    pub rows: Vec<PaymentRow>,
    /// Present when loading has finished and nothing matches the filter.
    pub empty_state: Option<EmptyState>,
    pub candidates: Vec<Candidate>,
    pub workflow: WorkflowState,
    pub notice: Option<String>,
    pub bank_notice_visible: bool,
}

impl DashboardView {
    pub fn selected_candidate(&self) -> Option<&Candidate> {
        let selection = self.workflow.selection()?;
        self.candidates
            .iter()
            .find(|candidate| &candidate.id == selection)
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
