use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::account::User;
use crate::railway::{Station, Train};
use crate::ticket::{Ticket, TicketStatus};
use crate::StoreResult;

/// Repository trait for train and seat map access.
///
/// `update` is conditional on `train.version` and returns the stored train
/// with its bumped version. A stale version yields `StoreError::Conflict`.
#[async_trait]
pub trait TrainRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Train>>;

    async fn list(&self) -> StoreResult<Vec<Train>>;

    async fn add(&self, train: &Train) -> StoreResult<()>;

    async fn update(&self, train: &Train) -> StoreResult<Train>;

    async fn delete(&self, id: Uuid) -> StoreResult<()>;
}

/// Query filter for ticket listings. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub train_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

impl TicketFilter {
    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn for_train(mut self, train_id: Uuid) -> Self {
        self.train_id = Some(train_id);
        self
    }

    pub fn for_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.status.map_or(true, |s| ticket.status == s)
            && self.train_id.map_or(true, |id| ticket.train_id == id)
            && self.user_id.map_or(true, |id| ticket.user_id == id)
    }
}

#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Ticket>>;

    /// Tickets matching `filter`, oldest booking first.
    async fn list(&self, filter: TicketFilter) -> StoreResult<Vec<Ticket>>;

    async fn add(&self, ticket: &Ticket) -> StoreResult<()>;

    async fn update(&self, ticket: &Ticket) -> StoreResult<()>;

    async fn delete(&self, id: Uuid) -> StoreResult<()>;
}

/// Users are created by the identity service; this side only reads them and
/// moves wallet balances. `update` is version-checked like trains.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn list(&self) -> StoreResult<Vec<User>>;

    async fn update(&self, user: &User) -> StoreResult<User>;
}

#[async_trait]
pub trait StationRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Station>>;

    async fn list(&self) -> StoreResult<Vec<Station>>;

    async fn add(&self, station: &Station) -> StoreResult<()>;

    async fn update(&self, station: &Station) -> StoreResult<()>;

    async fn delete(&self, id: Uuid) -> StoreResult<()>;
}

/// The ticket row touched by a booking step.
#[derive(Debug, Clone)]
pub enum TicketWrite {
    Insert(Ticket),
    Update(Ticket),
    Delete(Uuid),
}

/// Everything a single booking step changes. Trains and users are written
/// with the same version check as their repositories.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub trains: Vec<Train>,
    pub users: Vec<User>,
    pub ticket: Option<TicketWrite>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn train(mut self, train: Train) -> Self {
        self.trains.push(train);
        self
    }

    pub fn user(mut self, user: User) -> Self {
        self.users.push(user);
        self
    }

    pub fn ticket(mut self, write: TicketWrite) -> Self {
        self.ticket = Some(write);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.trains.is_empty() && self.users.is_empty() && self.ticket.is_none()
    }
}

/// Applies a [`ChangeSet`] atomically: every write lands or none does.
#[async_trait]
pub trait BookingCommitter: Send + Sync {
    async fn commit(&self, changes: ChangeSet) -> StoreResult<()>;
}

/// The storage ports the booking services depend on.
#[derive(Clone)]
pub struct Persistence {
    pub trains: Arc<dyn TrainRepository>,
    pub tickets: Arc<dyn TicketRepository>,
    pub users: Arc<dyn UserRepository>,
    pub stations: Arc<dyn StationRepository>,
    pub committer: Arc<dyn BookingCommitter>,
}
