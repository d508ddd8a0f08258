use std::fmt::Write as _;

use client_core::{
    derive::FILTER_OPTIONS,
    view::{format_amount, Candidate, DashboardView, BANK_DETAILS_NOTICE, LOADING_MESSAGE},
};

const NAME_WIDTH: usize = 32;

/// Plain-text rendering of the payment list, bank notice and empty state.
pub fn render_payments(view: &DashboardView) -> String {
    let mut out = String::new();

    if view.bank_notice_visible {
        let _ = writeln!(out, "! {}", BANK_DETAILS_NOTICE);
        let _ = writeln!(out);
    }

    let _ = writeln!(
        out,
        "Payments (filter: {}; options: {})",
        view.filter,
        FILTER_OPTIONS
            .iter()
            .map(|(value, _)| *value)
            .collect::<Vec<_>>()
            .join(", ")
    );

    if view.loading {
        let _ = writeln!(out, "{LOADING_MESSAGE}");
        return out;
    }

    if let Some(empty) = &view.empty_state {
        let _ = writeln!(out, "{}", empty.title);
        let _ = writeln!(out, "{}", empty.message);
        let _ = writeln!(out, "-> {}", empty.call_to_action);
        return out;
    }

    let _ = writeln!(
        out,
        "{:<name$}  {:<24}  {:>12}  {:>10}  {:>12}  {:<9}",
        "Event",
        "Date",
        "Participants",
        "Price",
        "Total",
        "Status",
        name = NAME_WIDTH,
    );
    for row in &view.rows {
        let _ = writeln!(
            out,
            "{:<name$}  {:<24}  {:>12}  {:>10}  {:>12}  {:<9}",
            truncate(&row.event_name, NAME_WIDTH),
            row.date_label,
            row.participant_count,
            format!("Rs{}", format_amount(row.ticket_price)),
            format!("Rs{}", format_amount(row.total_amount)),
            row.status,
            name = NAME_WIDTH,
        );
    }

    if let Some(notice) = &view.notice {
        let _ = writeln!(out);
        let _ = writeln!(out, "! {notice}");
    }
    out
}

/// Numbered candidate list for the request prompt.
pub fn render_candidates(candidates: &[Candidate]) -> String {
    if candidates.is_empty() {
        return "No ongoing events are available for a payment request.\n".to_string();
    }
    let mut out = String::new();
    for (index, candidate) in candidates.iter().enumerate() {
        let _ = writeln!(out, "{:>3}. {}", index + 1, candidate.label);
    }
    out
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut cut: String = value.chars().take(width.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
