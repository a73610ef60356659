use rail_core::StoreError;
use rail_inventory::InventoryError;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::ledger::LedgerError;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Not enough available seats: requested {requested}, available {available}")]
    InsufficientSeats { requested: usize, available: usize },

    #[error("Insufficient balance for user {user_id}: available {available}, requested {requested}")]
    InsufficientBalance {
        user_id: Uuid,
        available: Decimal,
        requested: Decimal,
    },

    #[error("{entity} {id} was modified concurrently, retry the request")]
    ConcurrentModification { entity: &'static str, id: Uuid },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl BookingError {
    /// True for failures caused by the request or current data rather than
    /// by the backend.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, BookingError::Storage(_))
    }

    pub(crate) fn transition(from: impl ToString, to: impl ToString) -> Self {
        BookingError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => BookingError::NotFound { entity, id },
            StoreError::Conflict { entity, id } => BookingError::ConcurrentModification { entity, id },
            other => BookingError::Storage(other.to_string()),
        }
    }
}

impl From<InventoryError> for BookingError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::InsufficientSeats { requested, available } => {
                BookingError::InsufficientSeats { requested, available }
            }
            InventoryError::InsufficientRemovable { .. }
            | InventoryError::InvalidSeatCount(_)
            | InventoryError::SeatUnavailable(_) => BookingError::Validation(err.to_string()),
            InventoryError::InvalidSeatNumber(_) | InventoryError::SeatNotFound(_) => {
                BookingError::Storage(err.to_string())
            }
        }
    }
}

impl From<LedgerError> for BookingError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientBalance { user_id, available, requested } => {
                BookingError::InsufficientBalance { user_id, available, requested }
            }
            LedgerError::InvalidAmount(_) => BookingError::Validation(err.to_string()),
        }
    }
}
