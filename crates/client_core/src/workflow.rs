//! Request-payment workflow as an explicit state machine.
//!
//! [`transition`] is pure: it maps the current state and one event to the
//! next state plus the effects the caller must run. Rejected events leave
//! the state untouched and report why.

use shared::domain::PaymentId;
use thiserror::Error;

pub const REQUEST_FAILED_NOTICE: &str = "Failed to request payment. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Closed,
    Open {
        selection: Option<PaymentId>,
    },
    Submitting {
        selection: PaymentId,
    },
}

impl WorkflowState {
    /// Whether the request dialog is visible.
    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    pub fn selection(&self) -> Option<&PaymentId> {
        match self {
            Self::Closed => None,
            Self::Open { selection } => selection.as_ref(),
            Self::Submitting { selection } => Some(selection),
        }
    }

    pub fn can_submit(&self) -> bool {
        matches!(self, Self::Open { selection: Some(_) })
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    Open,
    Select(Option<PaymentId>),
    Submit,
    Cancel,
    /// The service accepted the request; the dialog stays in flight until
    /// the follow-up fetch settles.
    SubmitSucceeded,
    SubmitFailed { reason: String },
    /// The post-request fetch finished, successfully or not.
    ResyncSettled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEffect {
    SendRequest(PaymentId),
    /// Re-fetch the collection; only ever emitted after a confirmed request.
    Resync,
    Notify(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: WorkflowState,
    pub effects: Vec<WorkflowEffect>,
}

impl Transition {
    fn to(state: WorkflowState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn with(mut self, effect: WorkflowEffect) -> Self {
        self.effects.push(effect);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("request workflow is not open")]
    NotOpen,
    #[error("no payment selected")]
    NothingSelected,
    #[error("a payment request is already in flight")]
    SubmissionInFlight,
    #[error("no payment request is in flight")]
    NoSubmissionInFlight,
    #[error("payment {0} is not eligible for a request")]
    NotACandidate(PaymentId),
}

/// `candidates` are the ids currently eligible for a request (status
/// `Ongoing`); selections and submissions outside that set are rejected.
pub fn transition(
    state: &WorkflowState,
    event: WorkflowEvent,
    candidates: &[PaymentId],
) -> Result<Transition, TransitionError> {
    use WorkflowEvent as E;
    use WorkflowState as S;

    match (state, event) {
        (S::Closed, E::Open) => Ok(Transition::to(S::Open { selection: None })),
        (S::Open { .. } | S::Submitting { .. }, E::Open) => Ok(Transition::to(state.clone())),

        (S::Closed, E::Select(_) | E::Submit) => Err(TransitionError::NotOpen),
        (S::Submitting { .. }, E::Select(_) | E::Submit | E::Cancel) => {
            Err(TransitionError::SubmissionInFlight)
        }

        (S::Open { .. }, E::Select(None)) => Ok(Transition::to(S::Open { selection: None })),
        (S::Open { .. }, E::Select(Some(id))) => {
            if candidates.contains(&id) {
                Ok(Transition::to(S::Open {
                    selection: Some(id),
                }))
            } else {
                Err(TransitionError::NotACandidate(id))
            }
        }

        (S::Open { selection: None }, E::Submit) => Err(TransitionError::NothingSelected),
        (S::Open { selection: Some(id) }, E::Submit) => {
            if !candidates.contains(id) {
                return Err(TransitionError::NotACandidate(id.clone()));
            }
            Ok(Transition::to(S::Submitting {
                selection: id.clone(),
            })
            .with(WorkflowEffect::SendRequest(id.clone())))
        }

        (S::Open { .. } | S::Closed, E::Cancel) => Ok(Transition::to(S::Closed)),

        (S::Submitting { .. }, E::SubmitSucceeded) => {
            Ok(Transition::to(state.clone()).with(WorkflowEffect::Resync))
        }
        (S::Submitting { .. }, E::ResyncSettled) => Ok(Transition::to(S::Closed)),
        (S::Submitting { selection }, E::SubmitFailed { .. }) => Ok(Transition::to(S::Open {
            selection: Some(selection.clone()),
        })
        .with(WorkflowEffect::Notify(REQUEST_FAILED_NOTICE.to_string()))),
        (
            S::Closed | S::Open { .. },
            E::SubmitSucceeded | E::SubmitFailed { .. } | E::ResyncSettled,
        ) => {
            Err(TransitionError::NoSubmissionInFlight)
        }
    }
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
