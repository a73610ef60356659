use std::collections::HashSet;

use rail_core::{Seat, SeatOrdering, SeatStatus, Train};
use uuid::Uuid;

use crate::layout::{self, SeatNumber};

/// Seat allocation over a train's seat map.
///
/// Pure logic: the caller loads the train, applies changes here, and persists
/// the result. Every mutating call re-synchronizes `available_seats`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeatInventory {
    ordering: SeatOrdering,
}

impl SeatInventory {
    pub fn new(ordering: SeatOrdering) -> Self {
        Self { ordering }
    }

    pub fn ordering(&self) -> SeatOrdering {
        self.ordering
    }

    /// Available seats in seat order.
    pub fn available_seats<'a>(&self, train: &'a Train) -> Vec<&'a Seat> {
        let mut seats: Vec<&Seat> = train.seats.iter().filter(|s| s.is_available()).collect();
        seats.sort_by(|a, b| layout::compare(self.ordering, &a.seat_number, &b.seat_number));
        seats
    }

    pub fn available_count(&self, train: &Train) -> usize {
        train.seats.iter().filter(|s| s.is_available()).count()
    }

    /// Pick the first `count` Available seats. Does not change the train.
    pub fn allocate(&self, train: &Train, count: usize) -> Result<Vec<Uuid>, InventoryError> {
        let available = self.available_seats(train);
        if available.len() < count {
            return Err(InventoryError::InsufficientSeats {
                requested: count,
                available: available.len(),
            });
        }

        let picked: Vec<Uuid> = available.iter().take(count).map(|s| s.id).collect();
        tracing::debug!(train_id = %train.id, requested = count, "Seats allocated");
        Ok(picked)
    }

    /// Soft-lock seats for a Pending ticket. `holds` pairs seat id with
    /// passenger id.
    pub fn mark_reserved(&self, train: &mut Train, holds: &[(Uuid, Uuid)]) -> Result<(), InventoryError> {
        self.hold(train, holds, SeatStatus::Reserved)
    }

    /// Confirm seats. A seat already Reserved for the same passenger is
    /// upgraded in place.
    pub fn mark_booked(&self, train: &mut Train, holds: &[(Uuid, Uuid)]) -> Result<(), InventoryError> {
        self.hold(train, holds, SeatStatus::Booked)
    }

    fn hold(&self, train: &mut Train, holds: &[(Uuid, Uuid)], status: SeatStatus) -> Result<(), InventoryError> {
        // Validate everything first so a failure leaves the seat map untouched
        let mut seen = HashSet::new();
        for (seat_id, passenger_id) in holds {
            let seat = train
                .seat(*seat_id)
                .ok_or(InventoryError::SeatNotFound(*seat_id))?;
            let free_or_own = seat.is_available() || seat.passenger_id == Some(*passenger_id);
            if !free_or_own || !seen.insert(*seat_id) {
                return Err(InventoryError::SeatUnavailable(seat.seat_number.clone()));
            }
        }

        for (seat_id, passenger_id) in holds {
            if let Some(seat) = train.seats.iter_mut().find(|s| s.id == *seat_id) {
                seat.hold(status, *passenger_id);
            }
        }
        train.sync_available_seats();
        Ok(())
    }

    /// Free every seat held by one of `passenger_ids`. Returns the freed seat
    /// ids.
    pub fn release(&self, train: &mut Train, passenger_ids: &[Uuid]) -> Vec<Uuid> {
        let mut freed = Vec::new();
        for seat in train.seats.iter_mut() {
            if seat.passenger_id.is_some_and(|p| passenger_ids.contains(&p)) {
                seat.free();
                freed.push(seat.id);
            }
        }
        train.sync_available_seats();
        freed
    }

    pub fn mark_available(&self, train: &mut Train, seat_ids: &[Uuid]) -> Result<(), InventoryError> {
        if let Some(missing) = seat_ids.iter().find(|id| train.seat(**id).is_none()) {
            return Err(InventoryError::SeatNotFound(*missing));
        }
        for seat in train.seats.iter_mut().filter(|s| seat_ids.contains(&s.id)) {
            seat.free();
        }
        train.sync_available_seats();
        Ok(())
    }

    /// Replace the seat map with `total` fresh Available seats.
    pub fn generate(&self, train: &mut Train, total: i32) -> Result<(), InventoryError> {
        let total = u32::try_from(total).map_err(|_| InventoryError::InvalidSeatCount(total))?;
        train.seats = layout::generate_seats(train.id, total);
        train.sync_available_seats();
        Ok(())
    }

    /// Grow or shrink the seat map to `new_total` seats.
    ///
    /// Growth continues the numbering after the highest generated position.
    /// Shrink only removes Available seats, highest position first, and fails
    /// without changes when there are not enough of them.
    pub fn resize(&self, train: &mut Train, new_total: i32) -> Result<(), InventoryError> {
        let target = usize::try_from(new_total).map_err(|_| InventoryError::InvalidSeatCount(new_total))?;
        let current = train.seats.len();

        if target > current {
            let last = train
                .seats
                .iter()
                .map(seat_position)
                .try_fold(0, |max, position| position.map(|p| max.max(p)))?;
            let added = layout::seats_from(train.id, last + 1, (target - current) as u32);
            train.seats.extend(added);
        } else if target < current {
            let excess = current - target;
            let mut candidates = train
                .seats
                .iter()
                .filter(|s| s.is_available())
                .map(|s| seat_position(s).map(|p| (p, s.id)))
                .collect::<Result<Vec<_>, _>>()?;
            if candidates.len() < excess {
                return Err(InventoryError::InsufficientRemovable {
                    requested: excess,
                    removable: candidates.len(),
                });
            }
            candidates.sort_unstable_by(|a, b| b.0.cmp(&a.0));
            let doomed: HashSet<Uuid> = candidates.iter().take(excess).map(|(_, id)| *id).collect();
            train.seats.retain(|s| !doomed.contains(&s.id));
        }

        train.sync_available_seats();
        Ok(())
    }
}

fn seat_position(seat: &Seat) -> Result<u32, InventoryError> {
    Ok(SeatNumber::parse(&seat.seat_number)?.position())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error("Insufficient seats: requested {requested}, available {available}")]
    InsufficientSeats { requested: usize, available: usize },

    #[error("Cannot remove {requested} seats: only {removable} are available")]
    InsufficientRemovable { requested: usize, removable: usize },

    #[error("Invalid seat number: {0}")]
    InvalidSeatNumber(String),

    #[error("Invalid seat count: {0}")]
    InvalidSeatCount(i32),

    #[error("Seat not found: {0}")]
    SeatNotFound(Uuid),

    #[error("Seat {0} is held by another passenger")]
    SeatUnavailable(String),
}
