use rust_decimal::Decimal;
use thiserror::Error;

/// A payment record that decoded but breaks the record invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("payment record has an empty id")]
    MissingId,
    #[error("payment record {id} has an empty event name")]
    EmptyEventName { id: String },
    #[error("payment record {id} has a negative ticket price {price}")]
    NegativeTicketPrice { id: String, price: Decimal },
    #[error("payment record {id} total of {count} x {price} is out of range")]
    TotalOverflow { id: String, count: u64, price: Decimal },
}
