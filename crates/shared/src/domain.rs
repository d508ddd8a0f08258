use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RecordError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(PaymentId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Completed,
    Pending,
    Ongoing,
}

impl PaymentStatus {
    /// Wire name, as stored by the payments service.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Pending => "Pending",
            Self::Ongoing => "Ongoing",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One event's payment status as the organizer currently knows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub event_name: String,
    pub participant_count: u64,
    pub ticket_price: Decimal,
    pub payment_status: PaymentStatus,
    pub created_at: String,
    #[serde(default)]
    pub images: Vec<String>,
}

impl PaymentRecord {
    /// `ticket_price * participant_count`, never stored. `None` when the
    /// product does not fit a `Decimal`.
    pub fn checked_total(&self) -> Option<Decimal> {
        self.ticket_price
            .checked_mul(Decimal::from(self.participant_count))
    }

    /// Saturates on overflow; records that passed [`Self::validate`] never do.
    pub fn total_amount(&self) -> Decimal {
        self.ticket_price
            .saturating_mul(Decimal::from(self.participant_count))
    }

    pub fn is_candidate(&self) -> bool {
        self.payment_status == PaymentStatus::Ongoing
    }

    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }

    pub fn validate(&self) -> Result<(), RecordError> {
        if self.id.as_str().trim().is_empty() {
            return Err(RecordError::MissingId);
        }
        if self.event_name.trim().is_empty() {
            return Err(RecordError::EmptyEventName {
                id: self.id.0.clone(),
            });
        }
        if self.ticket_price < Decimal::ZERO {
            return Err(RecordError::NegativeTicketPrice {
                id: self.id.0.clone(),
                price: self.ticket_price,
            });
        }
        if self.checked_total().is_none() {
            return Err(RecordError::TotalOverflow {
                id: self.id.0.clone(),
                count: self.participant_count,
                price: self.ticket_price,
            });
        }
        Ok(())
    }
}

/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.fff]` (read as UTC) and a
/// bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
