//! Client-side state for the organizer payments dashboard: transport,
//! fetch bookkeeping, derived views and the request-payment workflow.

pub mod api;
pub mod dashboard;
pub mod derive;
pub mod error;
pub mod loader;
pub mod view;
pub mod workflow;

pub use api::{HttpPaymentsApi, PaymentsApi};
pub use dashboard::{DashboardEvent, PaymentsDashboard, RequestOutcome};
pub use derive::StatusFilter;
pub use error::PaymentsApiError;
pub use workflow::{WorkflowEffect, WorkflowEvent, WorkflowState};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
