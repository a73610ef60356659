use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Which step of the ticket lifecycle produced an event.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketEventKind {
    Created,
    Approved,
    Cancelled,
    Updated,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct TicketEvent {
    pub ticket_id: Uuid,
    pub train_id: Uuid,
    pub user_id: Uuid,
    pub kind: TicketEventKind,
    pub ticket_status: String,
    pub payment_status: String,
    pub total_amount: Decimal,
    pub timestamp: DateTime<Utc>,
}
