use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use rail_core::notification::{
    Notification, NotificationSender, SUBJECT_APPROVAL, SUBJECT_BOOKING, SUBJECT_CANCELLATION,
    SUBJECT_UPDATE,
};
use rail_core::repository::{ChangeSet, Persistence, TicketWrite};
use rail_core::ticket::{JourneyChange, NewTicket};
use rail_core::{BookingPolicy, Passenger, PaymentStatus, SeatStatus, Ticket, TicketStatus, Train};
use rail_inventory::{FareCalculator, SeatInventory};
use rail_shared::{TicketEvent, TicketEventKind};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{BookingError, BookingResult};
use crate::ledger::WalletLedger;
use crate::load;
use crate::locks::BookingLocks;
use crate::notice;
use crate::view::TicketView;

/// Ticket lifecycle: creation, approval, cancellation and their seat and
/// wallet side effects.
///
/// Every step loads the aggregates under the train lock (then the user lock
/// when money moves), applies changes in memory, commits them as one
/// [`ChangeSet`] and only then notifies the ticket holder.
pub struct TicketWorkflow {
    pub(crate) store: Persistence,
    notifier: Arc<dyn NotificationSender>,
    locks: Arc<BookingLocks>,
    policy: BookingPolicy,
    inventory: SeatInventory,
    fares: FareCalculator,
    ledger: WalletLedger,
}

impl TicketWorkflow {
    pub fn new(
        store: Persistence,
        notifier: Arc<dyn NotificationSender>,
        locks: Arc<BookingLocks>,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            store,
            notifier,
            locks,
            inventory: SeatInventory::new(policy.seat_ordering),
            policy,
            fares: FareCalculator::new(),
            ledger: WalletLedger::new(),
        }
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    /// Create a Pending ticket.
    pub async fn add(&self, request: NewTicket) -> BookingResult<TicketView> {
        validate_request(&request)?;

        let _train_guard = self.locks.trains.acquire(request.train_id).await;
        let _user_guard = self.locks.users.acquire(request.user_id).await;

        let mut train = load::train(&self.store, request.train_id).await?;
        let mut user = load::user(&self.store, request.user_id).await?;
        load::station(&self.store, request.source_station_id).await?;
        load::station(&self.store, request.destination_station_id).await?;

        if let Some(holder) = request
            .passengers
            .iter()
            .filter_map(|p| p.id)
            .find(|id| train.seat_held_by(*id).is_some())
        {
            return Err(BookingError::Validation(format!(
                "Passenger {} already holds a seat on this train",
                holder
            )));
        }

        let count = request.passengers.len();
        let total_amount = self.fares.total_amount(train.fare, count);
        let seat_ids = self.inventory.allocate(&train, count)?;

        let ticket_id = Uuid::new_v4();
        let reserve = self.policy.reserve_on_add;
        // Without a reservation the seat could be taken before approval, so
        // passengers stay unassigned until then
        let passengers: Vec<Passenger> = request
            .passengers
            .into_iter()
            .zip(seat_ids)
            .map(|(p, seat_id)| Passenger {
                id: p.id.unwrap_or_else(Uuid::new_v4),
                ticket_id,
                name: p.name,
                age: p.age,
                gender: p.gender,
                seat_id: reserve.then_some(seat_id),
            })
            .collect();

        let mut changes = ChangeSet::new();
        if reserve {
            let holds: Vec<(Uuid, Uuid)> = passengers
                .iter()
                .filter_map(|p| p.seat_id.map(|seat_id| (seat_id, p.id)))
                .collect();
            self.inventory.mark_reserved(&mut train, &holds)?;
            changes = changes.train(train.clone());
        }

        let mut payment_status = PaymentStatus::Unpaid;
        if self.policy.charge_at_booking {
            self.ledger.debit(&mut user, total_amount, Some(ticket_id))?;
            payment_status = PaymentStatus::Paid;
            changes = changes.user(user);
        }

        let now = Utc::now();
        let ticket = Ticket {
            id: ticket_id,
            train_id: request.train_id,
            user_id: request.user_id,
            source_station_id: request.source_station_id,
            destination_station_id: request.destination_station_id,
            journey_date: request.journey_date,
            booking_date: now,
            passengers,
            total_amount,
            payment_status,
            status: TicketStatus::Pending,
            updated_at: now,
        };

        self.store
            .committer
            .commit(changes.ticket(TicketWrite::Insert(ticket.clone())))
            .await?;

        info!(
            ticket_id = %ticket.id,
            train_id = %train.id,
            passengers = count,
            total = %total_amount,
            payment = %ticket.payment_status,
            "Ticket created"
        );
        self.notify(&ticket, &train, TicketEventKind::Created, SUBJECT_BOOKING).await;

        Ok(TicketView::build(&ticket, Some(&train)))
    }

    /// Move a Pending ticket to Booked. Pending to Pending is accepted and
    /// changes nothing.
    pub async fn approve_ticket(&self, id: Uuid, status: TicketStatus) -> BookingResult<TicketView> {
        let train_id = load::ticket(&self.store, id).await?.train_id;
        let _train_guard = self.locks.trains.acquire(train_id).await;
        let mut ticket = load::ticket(&self.store, id).await?;

        match (ticket.status, status) {
            (TicketStatus::Pending, TicketStatus::Pending) => {
                let train = self.store.trains.get(ticket.train_id).await?;
                return Ok(TicketView::build(&ticket, train.as_ref()));
            }
            (TicketStatus::Pending, TicketStatus::Booked) => {}
            (from, to) => return Err(BookingError::transition(from, to)),
        }

        let mut train = load::train(&self.store, ticket.train_id).await?;

        // Passengers keep the seat reserved for them; the rest get the first
        // free seats in passenger order
        let mut holds = Vec::with_capacity(ticket.passengers.len());
        let mut unseated = Vec::new();
        for (index, passenger) in ticket.passengers.iter().enumerate() {
            let kept = passenger
                .seat_id
                .and_then(|seat_id| train.seat(seat_id))
                .filter(|seat| seat.status == SeatStatus::Reserved && seat.passenger_id == Some(passenger.id));
            match kept {
                Some(seat) => holds.push((seat.id, passenger.id)),
                None => unseated.push(index),
            }
        }

        let fresh = self.inventory.allocate(&train, unseated.len())?;
        for (index, seat_id) in unseated.into_iter().zip(fresh) {
            let passenger = &mut ticket.passengers[index];
            passenger.seat_id = Some(seat_id);
            holds.push((seat_id, passenger.id));
        }
        self.inventory.mark_booked(&mut train, &holds)?;

        let mut changes = ChangeSet::new();
        let deferred_charge =
            !self.policy.charge_at_booking && ticket.payment_status == PaymentStatus::Unpaid;
        let _user_guard = if deferred_charge {
            Some(self.locks.users.acquire(ticket.user_id).await)
        } else {
            None
        };
        if deferred_charge {
            let mut user = load::user(&self.store, ticket.user_id).await?;
            self.ledger.debit(&mut user, ticket.total_amount, Some(ticket.id))?;
            ticket.update_payment(PaymentStatus::Paid);
            changes = changes.user(user);
        }

        ticket.update_status(TicketStatus::Booked);
        self.store
            .committer
            .commit(
                changes
                    .train(train.clone())
                    .ticket(TicketWrite::Update(ticket.clone())),
            )
            .await?;

        info!(ticket_id = %ticket.id, train_id = %train.id, seats = holds.len(), "Ticket approved");
        self.notify(&ticket, &train, TicketEventKind::Approved, SUBJECT_APPROVAL).await;

        Ok(TicketView::build(&ticket, Some(&train)))
    }

    /// Cancel a Pending or Booked ticket, refunding it when paid and freeing
    /// its seats.
    pub async fn cancel_ticket(&self, id: Uuid, status: TicketStatus) -> BookingResult<TicketView> {
        let peek = load::ticket(&self.store, id).await?;
        let _train_guard = self.locks.trains.acquire(peek.train_id).await;
        let _user_guard = self.locks.users.acquire(peek.user_id).await;
        let mut ticket = load::ticket(&self.store, id).await?;

        if status != TicketStatus::Cancelled || ticket.status == TicketStatus::Cancelled {
            return Err(BookingError::transition(ticket.status, status));
        }

        let mut train = load::train(&self.store, ticket.train_id).await?;
        let mut changes = ChangeSet::new();

        let refunded = ticket.payment_status == PaymentStatus::Paid;
        if refunded {
            let mut user = load::user(&self.store, ticket.user_id).await?;
            self.ledger.credit(&mut user, ticket.total_amount, Some(ticket.id))?;
            ticket.update_payment(PaymentStatus::Refunded);
            changes = changes.user(user);
        }

        // Passenger seat ids are kept as a record of what was held
        let freed = self.inventory.release(&mut train, &ticket.passenger_ids());
        ticket.update_status(TicketStatus::Cancelled);

        self.store
            .committer
            .commit(
                changes
                    .train(train.clone())
                    .ticket(TicketWrite::Update(ticket.clone())),
            )
            .await?;

        info!(
            ticket_id = %ticket.id,
            freed_seats = freed.len(),
            refunded,
            "Ticket cancelled"
        );
        self.notify(&ticket, &train, TicketEventKind::Cancelled, SUBJECT_CANCELLATION).await;

        Ok(TicketView::build(&ticket, Some(&train)))
    }

    /// Change the journey date or stations of a Pending ticket.
    pub async fn update_journey(&self, id: Uuid, change: JourneyChange) -> BookingResult<TicketView> {
        if change.is_empty() {
            return Err(BookingError::Validation("No journey fields to update".to_string()));
        }

        let train_id = load::ticket(&self.store, id).await?.train_id;
        let _train_guard = self.locks.trains.acquire(train_id).await;
        let mut ticket = load::ticket(&self.store, id).await?;

        if ticket.status != TicketStatus::Pending {
            return Err(BookingError::Validation(format!(
                "Only pending tickets can be updated, ticket {} is {}",
                ticket.id, ticket.status
            )));
        }

        if let Some(source) = change.source_station_id {
            load::station(&self.store, source).await?;
            ticket.source_station_id = source;
        }
        if let Some(destination) = change.destination_station_id {
            load::station(&self.store, destination).await?;
            ticket.destination_station_id = destination;
        }
        if ticket.source_station_id == ticket.destination_station_id {
            return Err(BookingError::Validation(
                "Source and destination stations must differ".to_string(),
            ));
        }
        if let Some(journey_date) = change.journey_date {
            ticket.journey_date = journey_date;
        }
        ticket.updated_at = Utc::now();

        self.store
            .committer
            .commit(ChangeSet::new().ticket(TicketWrite::Update(ticket.clone())))
            .await?;

        info!(ticket_id = %ticket.id, journey_date = %ticket.journey_date, "Ticket journey updated");
        let train = load::train(&self.store, ticket.train_id).await?;
        self.notify(&ticket, &train, TicketEventKind::Updated, SUBJECT_UPDATE).await;

        Ok(TicketView::build(&ticket, Some(&train)))
    }

    /// Remove a ticket outright. Held seats are freed; no refund is made.
    pub async fn delete(&self, id: Uuid) -> BookingResult<TicketView> {
        let train_id = load::ticket(&self.store, id).await?.train_id;
        let _train_guard = self.locks.trains.acquire(train_id).await;
        let ticket = load::ticket(&self.store, id).await?;

        let train = self.store.trains.get(ticket.train_id).await?;
        let view = TicketView::build(&ticket, train.as_ref());

        let mut changes = ChangeSet::new().ticket(TicketWrite::Delete(ticket.id));
        if let Some(mut train) = train {
            let freed = self.inventory.release(&mut train, &ticket.passenger_ids());
            if !freed.is_empty() {
                changes = changes.train(train);
            }
        }
        self.store.committer.commit(changes).await?;

        info!(ticket_id = %ticket.id, status = %ticket.status, "Ticket deleted");
        Ok(view)
    }

    async fn notify(&self, ticket: &Ticket, train: &Train, kind: TicketEventKind, subject: &str) {
        if let Err(err) = self.try_notify(ticket, train, kind, subject).await {
            warn!(
                ticket_id = %ticket.id,
                subject,
                error = %err,
                "Notification failed after commit"
            );
        }
    }

    async fn try_notify(
        &self,
        ticket: &Ticket,
        train: &Train,
        kind: TicketEventKind,
        subject: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let user = load::user(&self.store, ticket.user_id).await?;
        let source = load::station(&self.store, ticket.source_station_id).await?;
        let destination = load::station(&self.store, ticket.destination_station_id).await?;

        let notification = Notification {
            recipient: user.email.clone(),
            subject: subject.to_string(),
            body: notice::render(ticket, train, &source, &destination),
            event: TicketEvent {
                ticket_id: ticket.id,
                train_id: ticket.train_id,
                user_id: ticket.user_id,
                kind,
                ticket_status: ticket.status.to_string(),
                payment_status: ticket.payment_status.to_string(),
                total_amount: ticket.total_amount,
                timestamp: Utc::now(),
            },
        };
        self.notifier.send(&notification).await
    }
}

fn validate_request(request: &NewTicket) -> BookingResult<()> {
    if request.passengers.is_empty() {
        return Err(BookingError::Validation(
            "A ticket needs at least one passenger".to_string(),
        ));
    }
    if request.source_station_id == request.destination_station_id {
        return Err(BookingError::Validation(
            "Source and destination stations must differ".to_string(),
        ));
    }

    let mut ids = HashSet::new();
    for passenger in &request.passengers {
        if passenger.name.trim().is_empty() {
            return Err(BookingError::Validation("Passenger name is required".to_string()));
        }
        if passenger.age < 0 {
            return Err(BookingError::Validation(format!(
                "Invalid passenger age: {}",
                passenger.age
            )));
        }
        if let Some(id) = passenger.id {
            if !ids.insert(id) {
                return Err(BookingError::Validation(format!("Duplicate passenger id: {}", id)));
            }
        }
    }
    Ok(())
}
