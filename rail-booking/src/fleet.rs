use std::sync::Arc;

use rail_core::repository::{Persistence, TicketFilter};
use rail_core::{Route, SeatOrdering, Train};
use rail_inventory::SeatInventory;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{BookingError, BookingResult};
use crate::load;
use crate::locks::BookingLocks;

#[derive(Debug, Clone, Deserialize)]
pub struct NewTrain {
    pub name: String,
    pub number: String,
    pub total_seats: i32,
    pub fare: Decimal,
    pub route: Route,
}

/// Partial update of a train. `total_seats` resizes the seat map.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrainChange {
    pub name: Option<String>,
    pub number: Option<String>,
    pub fare: Option<Decimal>,
    pub route: Option<Route>,
    pub total_seats: Option<i32>,
}

/// Train administration and seat map maintenance
pub struct TrainService {
    store: Persistence,
    locks: Arc<BookingLocks>,
    inventory: SeatInventory,
}

impl TrainService {
    pub fn new(store: Persistence, locks: Arc<BookingLocks>, ordering: SeatOrdering) -> Self {
        Self {
            store,
            locks,
            inventory: SeatInventory::new(ordering),
        }
    }

    pub async fn add_train(&self, request: NewTrain) -> BookingResult<Train> {
        validate_details(&request.name, &request.number, request.fare)?;
        self.validate_route(&request.route).await?;

        let mut train = Train::new(request.name, request.number, request.fare, request.route);
        self.inventory.generate(&mut train, request.total_seats)?;
        self.store.trains.add(&train).await?;

        info!(train_id = %train.id, number = %train.number, seats = train.total_seats, "Train added");
        Ok(train)
    }

    pub async fn update_train(&self, id: Uuid, change: TrainChange) -> BookingResult<Train> {
        let _guard = self.locks.trains.acquire(id).await;
        let mut train = load::train(&self.store, id).await?;

        if let Some(name) = change.name {
            train.name = name;
        }
        if let Some(number) = change.number {
            train.number = number;
        }
        if let Some(fare) = change.fare {
            train.fare = fare;
        }
        validate_details(&train.name, &train.number, train.fare)?;

        if let Some(route) = change.route {
            self.validate_route(&route).await?;
            train.route = route;
        }
        if let Some(total) = change.total_seats {
            self.inventory.resize(&mut train, total)?;
        }
        train.sync_available_seats();

        let stored = self.store.trains.update(&train).await?;
        info!(
            train_id = %stored.id,
            version = stored.version,
            total_seats = stored.total_seats,
            "Train updated"
        );
        Ok(stored)
    }

    pub async fn get_train(&self, id: Uuid) -> BookingResult<Train> {
        load::train(&self.store, id).await
    }

    pub async fn list_trains(&self) -> BookingResult<Vec<Train>> {
        Ok(self.store.trains.list().await?)
    }

    /// Refused while the train still has Pending or Booked tickets.
    pub async fn delete_train(&self, id: Uuid) -> BookingResult<()> {
        let guard = self.locks.trains.acquire(id).await;
        load::train(&self.store, id).await?;

        let tickets = self.store.tickets.list(TicketFilter::default().for_train(id)).await?;
        let active = tickets.iter().filter(|t| t.status.is_active()).count();
        if active > 0 {
            return Err(BookingError::Validation(format!(
                "Train {} still has {} active tickets",
                id, active
            )));
        }

        self.store.trains.delete(id).await?;
        drop(guard);
        self.locks.trains.prune();

        info!(train_id = %id, "Train deleted");
        Ok(())
    }

    /// Recompute `available_seats` for trains whose stored count drifted from
    /// their seat map. Returns the ids that were corrected.
    pub async fn reconcile_seat_counts(&self) -> BookingResult<Vec<Uuid>> {
        let mut corrected = Vec::new();
        for listed in self.store.trains.list().await? {
            if listed.count_available() == listed.available_seats
                && listed.seats.len() as i32 == listed.total_seats
            {
                continue;
            }

            let _guard = self.locks.trains.acquire(listed.id).await;
            let mut train = load::train(&self.store, listed.id).await?;
            let stored_available = train.available_seats;
            if train.sync_available_seats() {
                warn!(
                    train_id = %train.id,
                    stored = stored_available,
                    actual = train.available_seats,
                    "Seat count drift corrected"
                );
                self.store.trains.update(&train).await?;
                corrected.push(train.id);
            }
        }
        Ok(corrected)
    }

    async fn validate_route(&self, route: &Route) -> BookingResult<()> {
        if route.source_station_id == route.destination_station_id {
            return Err(BookingError::Validation(
                "Route source and destination must differ".to_string(),
            ));
        }
        if route.distance_km < 0 || route.duration_minutes < 0 {
            return Err(BookingError::Validation(
                "Route distance and duration cannot be negative".to_string(),
            ));
        }
        for station_id in route.station_ids() {
            load::station(&self.store, station_id).await?;
        }
        Ok(())
    }
}

fn validate_details(name: &str, number: &str, fare: Decimal) -> BookingResult<()> {
    if name.trim().is_empty() || number.trim().is_empty() {
        return Err(BookingError::Validation("Train name and number are required".to_string()));
    }
    if fare.is_sign_negative() {
        return Err(BookingError::Validation(format!("Invalid fare: {}", fare)));
    }
    Ok(())
}
