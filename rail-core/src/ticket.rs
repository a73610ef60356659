use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::UnknownVariant;

/// Ticket status in the lifecycle
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    #[default]
    Pending,
    Booked,
    Cancelled,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Pending => "PENDING",
            TicketStatus::Booked => "BOOKED",
            TicketStatus::Cancelled => "CANCELLED",
        }
    }

    /// Pending and Booked tickets still hold seats.
    pub fn is_active(&self) -> bool {
        !matches!(self, TicketStatus::Cancelled)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TicketStatus::Pending),
            "BOOKED" => Ok(TicketStatus::Booked),
            "CANCELLED" => Ok(TicketStatus::Cancelled),
            other => Err(UnknownVariant {
                kind: "ticket status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "UNPAID",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNPAID" => Ok(PaymentStatus::Unpaid),
            "PAID" => Ok(PaymentStatus::Paid),
            "REFUNDED" => Ok(PaymentStatus::Refunded),
            other => Err(UnknownVariant {
                kind: "payment status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
            Gender::Other => "OTHER",
        }
    }
}

impl FromStr for Gender {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MALE" => Ok(Gender::Male),
            "FEMALE" => Ok(Gender::Female),
            "OTHER" => Ok(Gender::Other),
            other => Err(UnknownVariant {
                kind: "gender",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Passenger {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub name: String,
    pub age: i32,
    pub gender: Option<Gender>,
    pub seat_id: Option<Uuid>,
}

/// A reservation for one or more passengers on a single journey. The ticket
/// id doubles as the PNR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub train_id: Uuid,
    pub user_id: Uuid,
    pub source_station_id: Uuid,
    pub destination_station_id: Uuid,
    pub journey_date: NaiveDate,
    pub booking_date: DateTime<Utc>,
    pub passengers: Vec<Passenger>,
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub status: TicketStatus,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn passenger_ids(&self) -> Vec<Uuid> {
        self.passengers.iter().map(|p| p.id).collect()
    }

    /// Update ticket status
    pub fn update_status(&mut self, new_status: TicketStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }

    pub fn update_payment(&mut self, payment_status: PaymentStatus) {
        self.payment_status = payment_status;
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPassenger {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    pub age: i32,
    #[serde(default)]
    pub gender: Option<Gender>,
}

/// Booking request for a new ticket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTicket {
    pub train_id: Uuid,
    pub user_id: Uuid,
    pub source_station_id: Uuid,
    pub destination_station_id: Uuid,
    pub journey_date: NaiveDate,
    pub passengers: Vec<NewPassenger>,
}

/// Changes allowed on a ticket that is still Pending.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JourneyChange {
    pub journey_date: Option<NaiveDate>,
    pub source_station_id: Option<Uuid>,
    pub destination_station_id: Option<Uuid>,
}

impl JourneyChange {
    pub fn is_empty(&self) -> bool {
        self.journey_date.is_none()
            && self.source_station_id.is_none()
            && self.destination_station_id.is_none()
    }
}
