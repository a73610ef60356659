pub mod account;
pub mod notification;
pub mod policy;
pub mod railway;
pub mod repository;
pub mod ticket;

pub use account::User;
pub use policy::{BookingPolicy, SeatOrdering};
pub use railway::{Route, Seat, SeatStatus, Station, Train};
pub use ticket::{Gender, Passenger, PaymentStatus, Ticket, TicketStatus};

use uuid::Uuid;

/// Failures reported by persistence backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("{entity} {id} was modified by another process")]
    Conflict { entity: &'static str, id: Uuid },
    #[error("Corrupt {entity} record: {detail}")]
    Corrupt { entity: &'static str, detail: String },
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(err))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Raised when a stored status string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
