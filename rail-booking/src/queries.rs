use std::collections::HashMap;

use rail_core::repository::TicketFilter;
use rail_core::{TicketStatus, Train};
use uuid::Uuid;

use crate::error::BookingResult;
use crate::load;
use crate::view::TicketView;
use crate::workflow::TicketWorkflow;

impl TicketWorkflow {
    pub async fn get_by_id(&self, id: Uuid) -> BookingResult<TicketView> {
        let ticket = load::ticket(&self.store, id).await?;
        let train = self.store.trains.get(ticket.train_id).await?;
        Ok(TicketView::build(&ticket, train.as_ref()))
    }

    pub async fn get_all(&self) -> BookingResult<Vec<TicketView>> {
        self.views(TicketFilter::default()).await
    }

    pub async fn pending_tickets(&self) -> BookingResult<Vec<TicketView>> {
        self.views(TicketFilter::default().with_status(TicketStatus::Pending))
            .await
    }

    pub async fn booked_tickets(&self, train_id: Uuid) -> BookingResult<Vec<TicketView>> {
        load::train(&self.store, train_id).await?;
        self.views(
            TicketFilter::default()
                .with_status(TicketStatus::Booked)
                .for_train(train_id),
        )
        .await
    }

    pub async fn booked_tickets_by_user(&self, user_id: Uuid) -> BookingResult<Vec<TicketView>> {
        load::user(&self.store, user_id).await?;
        self.views(
            TicketFilter::default()
                .with_status(TicketStatus::Booked)
                .for_user(user_id),
        )
        .await
    }

    pub async fn cancelled_tickets_by_user(&self, user_id: Uuid) -> BookingResult<Vec<TicketView>> {
        load::user(&self.store, user_id).await?;
        self.views(
            TicketFilter::default()
                .with_status(TicketStatus::Cancelled)
                .for_user(user_id),
        )
        .await
    }

    async fn views(&self, filter: TicketFilter) -> BookingResult<Vec<TicketView>> {
        let tickets = self.store.tickets.list(filter).await?;

        // Each train is loaded once for seat number lookups
        let mut trains: HashMap<Uuid, Option<Train>> = HashMap::new();
        let mut views = Vec::with_capacity(tickets.len());
        for ticket in &tickets {
            if !trains.contains_key(&ticket.train_id) {
                let train = self.store.trains.get(ticket.train_id).await?;
                trains.insert(ticket.train_id, train);
            }
            let train = trains.get(&ticket.train_id).and_then(Option::as_ref);
            views.push(TicketView::build(ticket, train));
        }
        Ok(views)
    }
}
