use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::domain::{PaymentId, PaymentRecord};

/// Read (`GET`) and request (`PATCH`) share one path on the payments service.
pub const PAYMENTS_ENDPOINT: &str = "/api/organizer/payments";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPaymentBody {
    pub event_id: PaymentId,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedPayments {
    pub records: Vec<PaymentRecord>,
    /// Entries dropped because they failed to decode, failed validation or
    /// repeated an id already seen in the same envelope.
    pub skipped: usize,
}

/// Normalizes a `{ "payments": [...] }` body.
///
/// A missing or non-array `payments` field yields an empty collection rather
/// than an error. Entries are decoded one by one so a single bad record does
/// not hide the rest of the page.
pub fn decode_payments_envelope(body: Value) -> DecodedPayments {
    let entries = match body {
        Value::Object(mut map) => match map.remove("payments") {
            Some(Value::Array(entries)) => entries,
            Some(other) => {
                warn!(
                    kind = json_kind(&other),
                    "payments envelope field is not an array; treating as empty"
                );
                return DecodedPayments::default();
            }
            None => return DecodedPayments::default(),
        },
        other => {
            warn!(
                kind = json_kind(&other),
                "payments envelope is not an object; treating as empty"
            );
            return DecodedPayments::default();
        }
    };

    let mut decoded = DecodedPayments::default();
    let mut seen = HashSet::new();
    for (index, entry) in entries.into_iter().enumerate() {
        let record = match serde_json::from_value::<PaymentRecord>(entry) {
            Ok(record) => record,
            Err(err) => {
                warn!(index, error = %err, "skipping undecodable payment record");
                decoded.skipped += 1;
                continue;
            }
        };
        if let Err(err) = record.validate() {
            warn!(index, error = %err, "skipping invalid payment record");
            decoded.skipped += 1;
            continue;
        }
        if !seen.insert(record.id.clone()) {
            warn!(index, id = %record.id, "skipping duplicate payment id");
            decoded.skipped += 1;
            continue;
        }
        decoded.records.push(record);
    }
    decoded
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
