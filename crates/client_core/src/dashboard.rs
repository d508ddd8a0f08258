//! Owned state container for one mounted payments dashboard.
//!
//! The collection lives in the [`PaymentsLoader`] and the request dialog in a
//! [`WorkflowState`]; both sit behind one lock and change only through the
//! methods below. Network calls run with the lock released, so intents
//! issued while a request is in flight are handled as ordinary transitions.

use std::collections::VecDeque;

use shared::domain::{PaymentId, PaymentRecord};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::{
    api::PaymentsApi,
    derive::{derive_view, request_candidates, StatusFilter},
    loader::{FetchOutcome, FetchPurpose, PaymentsLoader},
    view::{empty_state, Candidate, DashboardView, PaymentRow},
    workflow::{transition, TransitionError, WorkflowEffect, WorkflowEvent, WorkflowState},
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    LoadStarted,
    PaymentsLoaded { count: usize },
    LoadFailed { reason: String },
    WorkflowChanged(WorkflowState),
    RequestCompleted { id: PaymentId },
    RequestFailed { notice: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The service accepted the request. `resync` is how the follow-up
    /// fetch settled.
    Requested {
        id: PaymentId,
        resync: Option<FetchOutcome>,
    },
    Failed {
        id: PaymentId,
        reason: String,
    },
}

#[derive(Debug)]
struct DashboardState {
    loader: PaymentsLoader,
    filter: StatusFilter,
    workflow: WorkflowState,
    notice: Option<String>,
    bank_notice_visible: bool,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            loader: PaymentsLoader::new(),
            filter: StatusFilter::All,
            workflow: WorkflowState::Closed,
            notice: None,
            bank_notice_visible: true,
        }
    }
}

pub struct PaymentsDashboard<A: PaymentsApi> {
    api: A,
    inner: Mutex<DashboardState>,
    events: broadcast::Sender<DashboardEvent>,
}

impl<A: PaymentsApi> PaymentsDashboard<A> {
    /// Creates an empty, not yet loaded dashboard.
    pub fn new(api: A) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            api,
            inner: Mutex::new(DashboardState::default()),
            events,
        }
    }

    /// Creates a dashboard and runs the initial load.
    pub async fn mount(api: A) -> Self {
        let dashboard = Self::new(api);
        dashboard.load().await;
        dashboard
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    /// Fetches the full collection. Never fails: errors are logged and
    /// leave an empty list.
    pub async fn load(&self) -> FetchOutcome {
        self.fetch(FetchPurpose::Load).await
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.lock().await.loader.is_loading()
    }

    pub async fn records(&self) -> Vec<PaymentRecord> {
        self.inner.lock().await.loader.records().to_vec()
    }

    pub async fn set_filter(&self, raw: &str) {
        let filter = StatusFilter::parse(raw);
        debug!(filter = %filter, "status filter changed");
        self.inner.lock().await.filter = filter;
    }

    pub async fn workflow(&self) -> WorkflowState {
        self.inner.lock().await.workflow.clone()
    }

    pub async fn view(&self) -> DashboardView {
        let guard = self.inner.lock().await;
        let records = guard.loader.records();
        let loading = guard.loader.is_loading();
        let rows: Vec<PaymentRow> = derive_view(records, &guard.filter)
            .into_iter()
            .map(PaymentRow::from)
            .collect();
        let empty = (!loading && rows.is_empty()).then(|| empty_state(&guard.filter));

        DashboardView {
            loading,
            filter: guard.filter.clone(),
            rows,
            empty_state: empty,
            candidates: request_candidates(records)
                .into_iter()
                .map(Candidate::from)
                .collect(),
            workflow: guard.workflow.clone(),
            notice: guard.notice.clone(),
            bank_notice_visible: guard.bank_notice_visible,
        }
    }

    pub async fn dismiss_bank_notice(&self) {
        self.inner.lock().await.bank_notice_visible = false;
    }

    pub async fn dismiss_notice(&self) {
        self.inner.lock().await.notice = None;
    }

    pub async fn open_request(&self) -> Result<(), TransitionError> {
        self.dispatch(WorkflowEvent::Open).await.map(|_| ())
    }

    pub async fn select_candidate(&self, id: Option<PaymentId>) -> Result<(), TransitionError> {
        self.dispatch(WorkflowEvent::Select(id)).await.map(|_| ())
    }

    pub async fn cancel_request(&self) -> Result<(), TransitionError> {
        self.dispatch(WorkflowEvent::Cancel).await.map(|_| ())
    }

    /// Sends the selected payment request. Returns an error without touching
    /// the network when nothing is selected or a request is already in
    /// flight.
    pub async fn submit_request(&self) -> Result<RequestOutcome, TransitionError> {
        let effects = self.dispatch(WorkflowEvent::Submit).await?;
        self.inner.lock().await.notice = None;
        match self.run_effects(effects).await {
            Some(outcome) => Ok(outcome),
            None => Err(TransitionError::NoSubmissionInFlight),
        }
    }

    async fn fetch(&self, purpose: FetchPurpose) -> FetchOutcome {
        let ticket = self.inner.lock().await.loader.begin(purpose);
        let _ = self.events.send(DashboardEvent::LoadStarted);

        let result = self.api.fetch_payments().await;

        let outcome = self.inner.lock().await.loader.settle(ticket, result);
        let event = match &outcome {
            FetchOutcome::Replaced { count, .. } => {
                Some(DashboardEvent::PaymentsLoaded { count: *count })
            }
            FetchOutcome::Cleared { reason } | FetchOutcome::KeptStale { reason } => {
                Some(DashboardEvent::LoadFailed {
                    reason: reason.clone(),
                })
            }
            FetchOutcome::Superseded => None,
        };
        if let Some(event) = event {
            let _ = self.events.send(event);
        }
        outcome
    }

    async fn dispatch(&self, event: WorkflowEvent) -> Result<Vec<WorkflowEffect>, TransitionError> {
        let mut guard = self.inner.lock().await;
        let candidates: Vec<PaymentId> = request_candidates(guard.loader.records())
            .into_iter()
            .map(|record| record.id.clone())
            .collect();

        let next = match transition(&guard.workflow, event, &candidates) {
            Ok(next) => next,
            Err(err) => {
                debug!(state = ?guard.workflow, error = %err, "workflow event rejected");
                return Err(err);
            }
        };

        let changed = guard.workflow != next.state;
        guard.workflow = next.state.clone();
        drop(guard);

        if changed {
            debug!(state = ?next.state, "workflow state changed");
            let _ = self.events.send(DashboardEvent::WorkflowChanged(next.state));
        }
        Ok(next.effects)
    }

    async fn run_effects(&self, effects: Vec<WorkflowEffect>) -> Option<RequestOutcome> {
        let mut queue = VecDeque::from(effects);
        let mut outcome = None;

        while let Some(effect) = queue.pop_front() {
            match effect {
                WorkflowEffect::SendRequest(id) => {
                    let event = match self.api.request_payment(&id).await {
                        Ok(()) => {
                            info!(event_id = %id, "payment requested");
                            let _ = self
                                .events
                                .send(DashboardEvent::RequestCompleted { id: id.clone() });
                            outcome = Some(RequestOutcome::Requested { id, resync: None });
                            WorkflowEvent::SubmitSucceeded
                        }
                        Err(err) => {
                            error!(event_id = %id, error = %err, "error updating payment status");
                            let reason = err.to_string();
                            outcome = Some(RequestOutcome::Failed {
                                id,
                                reason: reason.clone(),
                            });
                            WorkflowEvent::SubmitFailed { reason }
                        }
                    };
                    match self.dispatch(event).await {
                        Ok(next) => queue.extend(next),
                        Err(err) => warn!(error = %err, "request outcome could not be applied"),
                    }
                }
                WorkflowEffect::Resync => {
                    let fetched = self.fetch(FetchPurpose::Resync).await;
                    if let Some(RequestOutcome::Requested { resync, .. }) = &mut outcome {
                        *resync = Some(fetched);
                    }
                    match self.dispatch(WorkflowEvent::ResyncSettled).await {
                        Ok(next) => queue.extend(next),
                        Err(err) => warn!(error = %err, "resync could not close the request"),
                    }
                }
                WorkflowEffect::Notify(notice) => {
                    self.inner.lock().await.notice = Some(notice.clone());
                    let _ = self.events.send(DashboardEvent::RequestFailed { notice });
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
#[path = "tests/dashboard_tests.rs"]
mod tests;
