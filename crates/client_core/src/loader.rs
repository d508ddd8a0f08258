//! Fetch/load bookkeeping for the payment collection.
//!
//! The loader never performs I/O itself. Callers take a [`FetchTicket`] with
//! [`PaymentsLoader::begin`], run the request without holding any lock, and
//! hand the result back through [`PaymentsLoader::settle`]. Only the most
//! recently issued ticket may change the collection, so a slow response can
//! never overwrite a newer one.

use shared::{domain::PaymentRecord, protocol::DecodedPayments};
use tracing::{debug, info, warn};

use crate::error::PaymentsApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPurpose {
    /// Mount or manual reload. A failure empties the collection.
    Load,
    /// Follows a successful payment request. A failure keeps the previous
    /// collection until the next load.
    Resync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    purpose: FetchPurpose,
}

impl FetchTicket {
    pub fn purpose(&self) -> FetchPurpose {
        self.purpose
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Replaced { count: usize, skipped: usize },
    Cleared { reason: String },
    KeptStale { reason: String },
    /// A newer fetch was issued after this one; its result was dropped.
    Superseded,
}

#[derive(Debug, Default)]
pub struct PaymentsLoader {
    records: Vec<PaymentRecord>,
    issued: u64,
    settled: u64,
}

impl PaymentsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[PaymentRecord] {
        &self.records
    }

    /// True while the latest issued fetch has not settled.
    pub fn is_loading(&self) -> bool {
        self.settled < self.issued
    }

    pub fn begin(&mut self, purpose: FetchPurpose) -> FetchTicket {
        self.issued += 1;
        debug!(generation = self.issued, ?purpose, "payments fetch started");
        FetchTicket {
            generation: self.issued,
            purpose,
        }
    }

    pub fn settle(
        &mut self,
        ticket: FetchTicket,
        result: Result<DecodedPayments, PaymentsApiError>,
    ) -> FetchOutcome {
        if ticket.generation != self.issued {
            debug!(
                generation = ticket.generation,
                latest = self.issued,
                "dropping superseded payments response"
            );
            return FetchOutcome::Superseded;
        }
        self.settled = ticket.generation;

        match result {
            Ok(decoded) => {
                let count = decoded.records.len();
                self.records = decoded.records;
                info!(count, skipped = decoded.skipped, "payments loaded");
                FetchOutcome::Replaced {
                    count,
                    skipped: decoded.skipped,
                }
            }
            Err(err) => {
                let reason = err.to_string();
                match ticket.purpose {
                    FetchPurpose::Load => {
                        warn!(error = %err, "error fetching payments; showing empty list");
                        self.records.clear();
                        FetchOutcome::Cleared { reason }
                    }
                    FetchPurpose::Resync => {
                        warn!(error = %err, "payments resync failed; keeping previous list");
                        FetchOutcome::KeptStale { reason }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/loader_tests.rs"]
mod tests;
