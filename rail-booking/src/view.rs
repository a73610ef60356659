use chrono::{DateTime, NaiveDate, Utc};
use rail_core::{Gender, PaymentStatus, Ticket, TicketStatus, Train};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PassengerView {
    pub id: Uuid,
    pub name: String,
    pub age: i32,
    pub gender: Option<Gender>,
    pub seat_id: Option<Uuid>,
    pub seat_number: Option<String>,
}

/// Ticket as returned to callers, with seat numbers resolved.
#[derive(Debug, Clone, Serialize)]
pub struct TicketView {
    pub ticket_id: Uuid,
    pub train_id: Uuid,
    pub user_id: Uuid,
    pub source_station_id: Uuid,
    pub destination_station_id: Uuid,
    pub journey_date: NaiveDate,
    pub booking_date: DateTime<Utc>,
    pub passengers: Vec<PassengerView>,
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub status: TicketStatus,
}

impl TicketView {
    /// Build a view. Without the train, seat numbers stay unresolved.
    pub fn build(ticket: &Ticket, train: Option<&Train>) -> Self {
        let passengers = ticket
            .passengers
            .iter()
            .map(|p| PassengerView {
                id: p.id,
                name: p.name.clone(),
                age: p.age,
                gender: p.gender,
                seat_id: p.seat_id,
                seat_number: p
                    .seat_id
                    .and_then(|id| train.and_then(|t| t.seat(id)))
                    .map(|s| s.seat_number.clone()),
            })
            .collect();

        Self {
            ticket_id: ticket.id,
            train_id: ticket.train_id,
            user_id: ticket.user_id,
            source_station_id: ticket.source_station_id,
            destination_station_id: ticket.destination_station_id,
            journey_date: ticket.journey_date,
            booking_date: ticket.booking_date,
            passengers,
            total_amount: ticket.total_amount,
            payment_status: ticket.payment_status,
            status: ticket.status,
        }
    }

    pub fn seat_numbers(&self) -> Vec<&str> {
        self.passengers
            .iter()
            .filter_map(|p| p.seat_number.as_deref())
            .collect()
    }
}
