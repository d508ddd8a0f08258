use super::*;
use std::{
    future::Future,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::{domain::PaymentStatus, protocol::DecodedPayments};
use tokio::sync::oneshot;

use crate::{error::PaymentsApiError, workflow::REQUEST_FAILED_NOTICE};

type FetchResult = Result<DecodedPayments, PaymentsApiError>;
type RequestResult = Result<(), PaymentsApiError>;

enum Scripted<T> {
    Ready(T),
    Gated(oneshot::Receiver<T>),
}

impl<T> Scripted<T> {
    async fn resolve(self) -> T {
        match self {
            Self::Ready(value) => value,
            Self::Gated(rx) => rx.await.expect("gate dropped"),
        }
    }
}

/// In-memory payments service that answers from a script, in call order.
#[derive(Clone, Default)]
struct FakeApi {
    fetches: Arc<Mutex<VecDeque<Scripted<FetchResult>>>>,
    requests: Arc<Mutex<VecDeque<Scripted<RequestResult>>>>,
    fetch_calls: Arc<AtomicUsize>,
    requested: Arc<Mutex<Vec<PaymentId>>>,
}

impl FakeApi {
    async fn push_fetch(&self, result: FetchResult) {
        self.fetches.lock().await.push_back(Scripted::Ready(result));
    }

    async fn gate_fetch(&self) -> oneshot::Sender<FetchResult> {
        let (tx, rx) = oneshot::channel();
        self.fetches.lock().await.push_back(Scripted::Gated(rx));
        tx
    }

    async fn push_request(&self, result: RequestResult) {
        self.requests.lock().await.push_back(Scripted::Ready(result));
    }

    async fn gate_request(&self) -> oneshot::Sender<RequestResult> {
        let (tx, rx) = oneshot::channel();
        self.requests.lock().await.push_back(Scripted::Gated(rx));
        tx
    }

    fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    async fn requested(&self) -> Vec<PaymentId> {
        self.requested.lock().await.clone()
    }
}

#[async_trait]
impl PaymentsApi for FakeApi {
    async fn fetch_payments(&self) -> Result<DecodedPayments, PaymentsApiError> {
        let script = self.fetches.lock().await.pop_front();
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        match script {
            Some(script) => script.resolve().await,
            None => Ok(DecodedPayments::default()),
        }
    }

    async fn request_payment(&self, event_id: &PaymentId) -> Result<(), PaymentsApiError> {
        self.requested.lock().await.push(event_id.clone());
        let script = self.requests.lock().await.pop_front();
        match script {
            Some(script) => script.resolve().await,
            None => Ok(()),
        }
    }
}

fn record(id: &str, status: PaymentStatus, created_at: &str) -> PaymentRecord {
    PaymentRecord {
        id: PaymentId::new(id),
        event_name: format!("event {id}"),
        participant_count: 10,
        ticket_price: Decimal::from(20),
        payment_status: status,
        created_at: created_at.to_string(),
        images: Vec::new(),
    }
}

fn payments(records: Vec<PaymentRecord>) -> FetchResult {
    Ok(DecodedPayments {
        records,
        skipped: 0,
    })
}

fn server_error(operation: &'static str) -> PaymentsApiError {
    PaymentsApiError::Status {
        operation,
        status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn mixed_records() -> Vec<PaymentRecord> {
    vec![
        record("done", PaymentStatus::Completed, "2024-01-03T00:00:00Z"),
        record("e1", PaymentStatus::Ongoing, "2024-01-01T00:00:00Z"),
        record("wait", PaymentStatus::Pending, "2024-01-02T00:00:00Z"),
        record("e2", PaymentStatus::Ongoing, "2024-01-04T00:00:00Z"),
    ]
}

async fn wait_until<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..400 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

fn row_ids(view: &DashboardView) -> Vec<String> {
    view.rows.iter().map(|row| row.id.to_string()).collect()
}

#[tokio::test]
async fn mount_loads_and_derives_view() {
    let api = FakeApi::default();
    api.push_fetch(payments(mixed_records())).await;

    let dashboard = PaymentsDashboard::mount(api.clone()).await;
    let view = dashboard.view().await;

    assert!(!view.loading);
    assert_eq!(row_ids(&view), vec!["e2", "done", "wait", "e1"]);
    assert_eq!(view.empty_state, None);
    let candidate_ids: Vec<_> = view.candidates.iter().map(|c| c.id.to_string()).collect();
    assert_eq!(candidate_ids, vec!["e2", "e1"]);
    assert_eq!(view.workflow, WorkflowState::Closed);
    assert!(view.bank_notice_visible);
    assert_eq!(api.fetch_calls(), 1);
}

#[tokio::test]
async fn failed_mount_degrades_to_empty_state() {
    let api = FakeApi::default();
    api.push_fetch(Err(server_error("list payments"))).await;
    let dashboard = PaymentsDashboard::new(api);
    let mut events = dashboard.subscribe();

    let outcome = dashboard.load().await;
    assert!(matches!(outcome, FetchOutcome::Cleared { .. }));

    let view = dashboard.view().await;
    assert!(view.rows.is_empty());
    assert_eq!(
        view.empty_state.expect("empty state").message,
        "You don't have any payments yet."
    );
    assert_eq!(events.recv().await.expect("event"), DashboardEvent::LoadStarted);
    assert!(matches!(
        events.recv().await.expect("event"),
        DashboardEvent::LoadFailed { .. }
    ));
}

#[tokio::test]
async fn loading_flag_is_set_while_fetch_is_in_flight() {
    let api = FakeApi::default();
    let gate = api.gate_fetch().await;
    let dashboard = Arc::new(PaymentsDashboard::new(api.clone()));

    let task = {
        let dashboard = dashboard.clone();
        tokio::spawn(async move { dashboard.load().await })
    };
    wait_until(|| {
        let api = api.clone();
        async move { api.fetch_calls() == 1 }
    })
    .await;

    let view = dashboard.view().await;
    assert!(view.loading);
    assert_eq!(view.empty_state, None, "no empty state while loading");

    gate.send(payments(mixed_records())).expect("release");
    task.await.expect("join");
    assert!(!dashboard.is_loading().await);
    assert_eq!(dashboard.records().await.len(), 4);
}

#[tokio::test]
async fn filter_changes_recompute_the_view() {
    let api = FakeApi::default();
    api.push_fetch(payments(mixed_records())).await;
    let dashboard = PaymentsDashboard::mount(api).await;

    dashboard.set_filter("ongoing").await;
    assert_eq!(row_ids(&dashboard.view().await), vec!["e2", "e1"]);

    dashboard.set_filter("completed").await;
    assert_eq!(row_ids(&dashboard.view().await), vec!["done"]);

    dashboard.set_filter("refunded").await;
    let view = dashboard.view().await;
    assert!(view.rows.is_empty());
    assert_eq!(
        view.empty_state.expect("empty state").message,
        "You don't have any refunded payments."
    );
    assert_eq!(view.candidates.len(), 2, "candidates ignore the list filter");

    dashboard.set_filter("all").await;
    assert_eq!(dashboard.view().await.rows.len(), 4);
}

#[tokio::test]
async fn successful_request_closes_and_resyncs() {
    let api = FakeApi::default();
    api.push_fetch(payments(mixed_records())).await;
    let mut after = mixed_records();
    after[1].payment_status = PaymentStatus::Pending;
    api.push_fetch(payments(after)).await;
    api.push_request(Ok(())).await;

    let dashboard = PaymentsDashboard::mount(api.clone()).await;
    let mut events = dashboard.subscribe();
    dashboard.open_request().await.expect("open");
    dashboard
        .select_candidate(Some(PaymentId::new("e1")))
        .await
        .expect("select");

    let outcome = dashboard.submit_request().await.expect("submit");
    assert_eq!(
        outcome,
        RequestOutcome::Requested {
            id: PaymentId::new("e1"),
            resync: Some(FetchOutcome::Replaced {
                count: 4,
                skipped: 0
            }),
        }
    );
    assert_eq!(dashboard.workflow().await, WorkflowState::Closed);
    assert_eq!(api.requested().await, vec![PaymentId::new("e1")]);
    assert_eq!(api.fetch_calls(), 2);

    let view = dashboard.view().await;
    let candidate_ids: Vec<_> = view.candidates.iter().map(|c| c.id.to_string()).collect();
    assert_eq!(candidate_ids, vec!["e2"]);
    assert_eq!(view.notice, None);

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    let completed = seen
        .iter()
        .position(|e| matches!(e, DashboardEvent::RequestCompleted { .. }))
        .expect("completed event");
    let resync_started = seen
        .iter()
        .position(|e| matches!(e, DashboardEvent::LoadStarted))
        .expect("resync event");
    assert!(completed < resync_started, "resync follows the confirmed request");
    let resync_loaded = seen
        .iter()
        .position(|e| matches!(e, DashboardEvent::PaymentsLoaded { .. }))
        .expect("resync loaded event");
    let closed = seen
        .iter()
        .position(|e| *e == DashboardEvent::WorkflowChanged(WorkflowState::Closed))
        .expect("closed event");
    assert!(resync_loaded < closed, "dialog closes after the resync settles");
}

#[tokio::test]
async fn dialog_stays_submitting_until_resync_settles() {
    let api = FakeApi::default();
    api.push_fetch(payments(mixed_records())).await;
    api.push_request(Ok(())).await;
    let resync = api.gate_fetch().await;

    let dashboard = Arc::new(PaymentsDashboard::mount(api.clone()).await);
    dashboard.open_request().await.expect("open");
    dashboard
        .select_candidate(Some(PaymentId::new("e1")))
        .await
        .expect("select");

    let task = {
        let dashboard = dashboard.clone();
        tokio::spawn(async move { dashboard.submit_request().await })
    };
    wait_until(|| {
        let api = api.clone();
        async move { api.fetch_calls() == 2 }
    })
    .await;

    let during = dashboard.workflow().await;
    assert!(during.is_submitting(), "state during resync: {during:?}");
    assert_eq!(
        dashboard.open_request().await,
        Ok(()),
        "open is a no-op while in flight"
    );
    assert_eq!(
        dashboard.select_candidate(Some(PaymentId::new("e1"))).await,
        Err(TransitionError::SubmissionInFlight)
    );
    assert_eq!(
        dashboard.submit_request().await,
        Err(TransitionError::SubmissionInFlight)
    );

    let mut after = mixed_records();
    after[1].payment_status = PaymentStatus::Pending;
    resync.send(payments(after)).expect("release");
    let outcome = task.await.expect("join").expect("submit");

    assert!(matches!(outcome, RequestOutcome::Requested { .. }));
    assert_eq!(dashboard.workflow().await, WorkflowState::Closed);
    assert_eq!(api.requested().await, vec![PaymentId::new("e1")]);
}

#[tokio::test]
async fn rejected_request_keeps_dialog_open_with_selection() {
    let api = FakeApi::default();
    api.push_fetch(payments(mixed_records())).await;
    api.push_request(Err(server_error("request payment"))).await;

    let dashboard = PaymentsDashboard::mount(api.clone()).await;
    let before = dashboard.records().await;
    let mut events = dashboard.subscribe();
    dashboard.open_request().await.expect("open");
    dashboard
        .select_candidate(Some(PaymentId::new("e1")))
        .await
        .expect("select");

    let outcome = dashboard.submit_request().await.expect("submit");
    assert!(matches!(outcome, RequestOutcome::Failed { ref id, .. } if id.as_str() == "e1"));

    assert_eq!(
        dashboard.workflow().await,
        WorkflowState::Open {
            selection: Some(PaymentId::new("e1"))
        }
    );
    assert_eq!(dashboard.records().await, before);
    assert_eq!(api.fetch_calls(), 1, "no resync after a failed request");

    let view = dashboard.view().await;
    assert_eq!(view.notice.as_deref(), Some(REQUEST_FAILED_NOTICE));
    assert_eq!(
        view.selected_candidate().map(|c| c.id.as_str()),
        Some("e1")
    );

    let mut saw_notice = false;
    while let Ok(event) = events.try_recv() {
        if event
            == (DashboardEvent::RequestFailed {
                notice: REQUEST_FAILED_NOTICE.to_string(),
            })
        {
            saw_notice = true;
        }
    }
    assert!(saw_notice);

    // Retry without re-picking.
    api.push_request(Ok(())).await;
    let retry = dashboard.submit_request().await.expect("retry");
    assert!(matches!(retry, RequestOutcome::Requested { .. }));
    assert_eq!(dashboard.view().await.notice, None);
    assert_eq!(api.requested().await.len(), 2);
}

#[tokio::test]
async fn submit_without_selection_sends_nothing() {
    let api = FakeApi::default();
    api.push_fetch(payments(mixed_records())).await;
    let dashboard = PaymentsDashboard::mount(api.clone()).await;

    assert_eq!(
        dashboard.submit_request().await,
        Err(TransitionError::NotOpen)
    );
    dashboard.open_request().await.expect("open");
    assert_eq!(
        dashboard.submit_request().await,
        Err(TransitionError::NothingSelected)
    );
    assert!(api.requested().await.is_empty());
}

#[tokio::test]
async fn non_candidates_cannot_be_selected() {
    let api = FakeApi::default();
    api.push_fetch(payments(mixed_records())).await;
    let dashboard = PaymentsDashboard::mount(api).await;
    dashboard.open_request().await.expect("open");

    for id in ["done", "wait", "missing"] {
        assert_eq!(
            dashboard.select_candidate(Some(PaymentId::new(id))).await,
            Err(TransitionError::NotACandidate(PaymentId::new(id)))
        );
    }
    assert_eq!(
        dashboard.workflow().await,
        WorkflowState::Open { selection: None }
    );
}

#[tokio::test]
async fn only_one_submission_can_be_in_flight() {
    let api = FakeApi::default();
    api.push_fetch(payments(mixed_records())).await;
    let gate = api.gate_request().await;
    let dashboard = Arc::new(PaymentsDashboard::mount(api.clone()).await);
    dashboard.open_request().await.expect("open");
    dashboard
        .select_candidate(Some(PaymentId::new("e2")))
        .await
        .expect("select");

    let task = {
        let dashboard = dashboard.clone();
        tokio::spawn(async move { dashboard.submit_request().await })
    };
    wait_until(|| {
        let dashboard = dashboard.clone();
        async move { dashboard.workflow().await.is_submitting() }
    })
    .await;

    assert_eq!(
        dashboard.submit_request().await,
        Err(TransitionError::SubmissionInFlight)
    );
    assert_eq!(
        dashboard.cancel_request().await,
        Err(TransitionError::SubmissionInFlight)
    );
    dashboard.set_filter("pending").await;
    assert_eq!(row_ids(&dashboard.view().await), vec!["wait"]);

    gate.send(Ok(())).expect("release");
    let outcome = task.await.expect("join").expect("submit");
    assert!(matches!(outcome, RequestOutcome::Requested { .. }));
    assert_eq!(api.requested().await, vec![PaymentId::new("e2")]);
}

#[tokio::test]
async fn failed_resync_still_closes_and_keeps_stale_list() {
    let api = FakeApi::default();
    api.push_fetch(payments(mixed_records())).await;
    api.push_fetch(Err(server_error("list payments"))).await;
    api.push_request(Ok(())).await;

    let dashboard = PaymentsDashboard::mount(api).await;
    dashboard.open_request().await.expect("open");
    dashboard
        .select_candidate(Some(PaymentId::new("e1")))
        .await
        .expect("select");

    let outcome = dashboard.submit_request().await.expect("submit");
    assert!(matches!(
        outcome,
        RequestOutcome::Requested {
            resync: Some(FetchOutcome::KeptStale { .. }),
            ..
        }
    ));
    assert_eq!(dashboard.workflow().await, WorkflowState::Closed);
    assert_eq!(dashboard.records().await, mixed_records());
}

#[tokio::test]
async fn stale_fetch_cannot_overwrite_newer_collection() {
    let api = FakeApi::default();
    let slow = api.gate_fetch().await;
    api.push_fetch(payments(vec![record(
        "fresh",
        PaymentStatus::Ongoing,
        "2024-06-01",
    )]))
    .await;
    let dashboard = Arc::new(PaymentsDashboard::new(api.clone()));

    let first = {
        let dashboard = dashboard.clone();
        tokio::spawn(async move { dashboard.load().await })
    };
    wait_until(|| {
        let api = api.clone();
        async move { api.fetch_calls() == 1 }
    })
    .await;

    dashboard.load().await;
    slow.send(payments(vec![record(
        "stale",
        PaymentStatus::Completed,
        "2023-01-01",
    )]))
    .expect("release");

    assert_eq!(first.await.expect("join"), FetchOutcome::Superseded);
    let ids: Vec<_> = dashboard
        .records()
        .await
        .into_iter()
        .map(|r| r.id.to_string())
        .collect();
    assert_eq!(ids, vec!["fresh"]);
    assert!(!dashboard.is_loading().await);
}

#[tokio::test]
async fn cancel_and_dismissals() {
    let api = FakeApi::default();
    api.push_fetch(payments(mixed_records())).await;
    let dashboard = PaymentsDashboard::mount(api.clone()).await;
    let mut events = dashboard.subscribe();

    dashboard.open_request().await.expect("open");
    dashboard
        .select_candidate(Some(PaymentId::new("e2")))
        .await
        .expect("select");
    dashboard.cancel_request().await.expect("cancel");
    assert_eq!(dashboard.workflow().await, WorkflowState::Closed);
    assert!(api.requested().await.is_empty());

    assert_eq!(
        events.recv().await.expect("event"),
        DashboardEvent::WorkflowChanged(WorkflowState::Open { selection: None })
    );
    assert_eq!(
        events.recv().await.expect("event"),
        DashboardEvent::WorkflowChanged(WorkflowState::Open {
            selection: Some(PaymentId::new("e2"))
        })
    );
    assert_eq!(
        events.recv().await.expect("event"),
        DashboardEvent::WorkflowChanged(WorkflowState::Closed)
    );

    dashboard.open_request().await.expect("reopen");
    assert_eq!(
        dashboard.workflow().await,
        WorkflowState::Open { selection: None },
        "selection is discarded on cancel"
    );

    dashboard.dismiss_bank_notice().await;
    dashboard.dismiss_notice().await;
    let view = dashboard.view().await;
    assert!(!view.bank_notice_visible);
    assert_eq!(view.notice, None);
}
