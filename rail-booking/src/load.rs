use rail_core::repository::Persistence;
use rail_core::{Station, Ticket, Train, User};
use uuid::Uuid;

use crate::error::{BookingError, BookingResult};

pub(crate) async fn train(store: &Persistence, id: Uuid) -> BookingResult<Train> {
    store
        .trains
        .get(id)
        .await?
        .ok_or(BookingError::NotFound { entity: "train", id })
}

pub(crate) async fn ticket(store: &Persistence, id: Uuid) -> BookingResult<Ticket> {
    store
        .tickets
        .get(id)
        .await?
        .ok_or(BookingError::NotFound { entity: "ticket", id })
}

pub(crate) async fn user(store: &Persistence, id: Uuid) -> BookingResult<User> {
    store
        .users
        .get(id)
        .await?
        .ok_or(BookingError::NotFound { entity: "user", id })
}

pub(crate) async fn station(store: &Persistence, id: Uuid) -> BookingResult<Station> {
    store
        .stations
        .get(id)
        .await?
        .ok_or(BookingError::NotFound { entity: "station", id })
}
