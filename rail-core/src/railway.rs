use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::UnknownVariant;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Station {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub pincode: String,
}

impl Station {
    pub fn new(name: impl Into<String>, code: impl Into<String>, pincode: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            code: code.into(),
            pincode: pincode.into(),
        }
    }
}

/// Stations a train runs through, end to end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Route {
    pub source_station_id: Uuid,
    pub destination_station_id: Uuid,
    pub intermediate_station_ids: Vec<Uuid>,
    pub distance_km: i32,
    pub duration_minutes: i32,
}

impl Route {
    /// Every station on the route in travel order.
    pub fn station_ids(&self) -> Vec<Uuid> {
        let mut ids = Vec::with_capacity(self.intermediate_station_ids.len() + 2);
        ids.push(self.source_station_id);
        ids.extend(self.intermediate_station_ids.iter().copied());
        ids.push(self.destination_station_id);
        ids
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Available,
    Reserved,
    Booked,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatStatus::Available => "AVAILABLE",
            SeatStatus::Reserved => "RESERVED",
            SeatStatus::Booked => "BOOKED",
        }
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeatStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(SeatStatus::Available),
            "RESERVED" => Ok(SeatStatus::Reserved),
            "BOOKED" => Ok(SeatStatus::Booked),
            other => Err(UnknownVariant {
                kind: "seat status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Seat {
    pub id: Uuid,
    pub train_id: Uuid,
    pub seat_number: String,
    pub status: SeatStatus,
    pub passenger_id: Option<Uuid>,
}

impl Seat {
    pub fn new(train_id: Uuid, seat_number: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            train_id,
            seat_number: seat_number.into(),
            status: SeatStatus::Available,
            passenger_id: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == SeatStatus::Available
    }

    pub fn hold(&mut self, status: SeatStatus, passenger_id: Uuid) {
        self.status = status;
        self.passenger_id = Some(passenger_id);
    }

    pub fn free(&mut self) {
        self.status = SeatStatus::Available;
        self.passenger_id = None;
    }
}

/// A train and the seat map it owns.
///
/// `available_seats` is a denormalized count of `Available` seats. Call
/// [`Train::sync_available_seats`] after touching `seats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Train {
    pub id: Uuid,
    pub name: String,
    pub number: String,
    pub total_seats: i32,
    pub available_seats: i32,
    pub fare: Decimal,
    pub route: Route,
    pub seats: Vec<Seat>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl Train {
    /// A train with an empty seat map. Seats are generated by the inventory.
    pub fn new(name: impl Into<String>, number: impl Into<String>, fare: Decimal, route: Route) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            number: number.into(),
            total_seats: 0,
            available_seats: 0,
            fare,
            route,
            seats: Vec::new(),
            version: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn count_available(&self) -> i32 {
        self.seats.iter().filter(|s| s.is_available()).count() as i32
    }

    /// Recompute the seat counters from the seat map. Returns true when the
    /// stored counters had drifted.
    pub fn sync_available_seats(&mut self) -> bool {
        let available = self.count_available();
        let total = self.seats.len() as i32;
        let drifted = available != self.available_seats || total != self.total_seats;
        self.available_seats = available;
        self.total_seats = total;
        self.updated_at = Utc::now();
        drifted
    }

    pub fn seat(&self, seat_id: Uuid) -> Option<&Seat> {
        self.seats.iter().find(|s| s.id == seat_id)
    }

    pub fn seat_held_by(&self, passenger_id: Uuid) -> Option<&Seat> {
        self.seats
            .iter()
            .find(|s| s.passenger_id == Some(passenger_id))
    }
}
