use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rail_core::repository::{
    BookingCommitter, ChangeSet, Persistence, StationRepository, TicketFilter, TicketRepository,
    TicketWrite, TrainRepository, UserRepository,
};
use rail_core::{Station, StoreError, StoreResult, Ticket, Train, User};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    trains: HashMap<Uuid, Train>,
    tickets: HashMap<Uuid, Ticket>,
    users: HashMap<Uuid, User>,
    stations: HashMap<Uuid, Station>,
}

impl Tables {
    fn check_train(&self, train: &Train) -> StoreResult<()> {
        match self.trains.get(&train.id) {
            None => Err(StoreError::NotFound { entity: "train", id: train.id }),
            Some(stored) if stored.version != train.version => {
                Err(StoreError::Conflict { entity: "train", id: train.id })
            }
            Some(_) => Ok(()),
        }
    }

    fn check_user(&self, user: &User) -> StoreResult<()> {
        match self.users.get(&user.id) {
            None => Err(StoreError::NotFound { entity: "user", id: user.id }),
            Some(stored) if stored.version != user.version => {
                Err(StoreError::Conflict { entity: "user", id: user.id })
            }
            Some(_) => Ok(()),
        }
    }

    fn check_ticket(&self, write: &TicketWrite) -> StoreResult<()> {
        let missing = |id: Uuid| StoreError::NotFound { entity: "ticket", id };
        match write {
            TicketWrite::Insert(_) => Ok(()),
            TicketWrite::Update(ticket) if !self.tickets.contains_key(&ticket.id) => Err(missing(ticket.id)),
            TicketWrite::Delete(id) if !self.tickets.contains_key(id) => Err(missing(*id)),
            _ => Ok(()),
        }
    }

    fn put_train(&mut self, train: &Train) -> Train {
        let mut stored = train.clone();
        stored.version += 1;
        self.trains.insert(stored.id, stored.clone());
        stored
    }

    fn put_user(&mut self, user: &User) -> User {
        let mut stored = user.clone();
        stored.version += 1;
        self.users.insert(stored.id, stored.clone());
        stored
    }
}

/// Process-local store implementing every repository port. Used by tests and
/// by `database.backend = "memory"`.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire one shared store into every port.
    pub fn persistence(self: &Arc<Self>) -> Persistence {
        Persistence {
            trains: self.clone(),
            tickets: self.clone(),
            users: self.clone(),
            stations: self.clone(),
            committer: self.clone(),
        }
    }

    /// Seed or overwrite a user account as-is.
    pub async fn insert_user(&self, user: User) {
        self.tables.write().await.users.insert(user.id, user);
    }
}

#[async_trait]
impl TrainRepository for MemoryStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Train>> {
        Ok(self.tables.read().await.trains.get(&id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Train>> {
        let tables = self.tables.read().await;
        let mut trains: Vec<Train> = tables.trains.values().cloned().collect();
        trains.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(trains)
    }

    async fn add(&self, train: &Train) -> StoreResult<()> {
        self.tables.write().await.trains.insert(train.id, train.clone());
        Ok(())
    }

    async fn update(&self, train: &Train) -> StoreResult<Train> {
        let mut tables = self.tables.write().await;
        tables.check_train(train)?;
        Ok(tables.put_train(train))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        match self.tables.write().await.trains.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound { entity: "train", id }),
        }
    }
}

#[async_trait]
impl TicketRepository for MemoryStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Ticket>> {
        Ok(self.tables.read().await.tickets.get(&id).cloned())
    }

    async fn list(&self, filter: TicketFilter) -> StoreResult<Vec<Ticket>> {
        let tables = self.tables.read().await;
        let mut tickets: Vec<Ticket> = tables
            .tickets
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        tickets.sort_by_key(|t| t.booking_date);
        Ok(tickets)
    }

    async fn add(&self, ticket: &Ticket) -> StoreResult<()> {
        self.tables.write().await.tickets.insert(ticket.id, ticket.clone());
        Ok(())
    }

    async fn update(&self, ticket: &Ticket) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.check_ticket(&TicketWrite::Update(ticket.clone()))?;
        tables.tickets.insert(ticket.id, ticket.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        match self.tables.write().await.tickets.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound { entity: "ticket", id }),
        }
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| a.user_name.cmp(&b.user_name));
        Ok(users)
    }

    async fn update(&self, user: &User) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        tables.check_user(user)?;
        Ok(tables.put_user(user))
    }
}

#[async_trait]
impl StationRepository for MemoryStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Station>> {
        Ok(self.tables.read().await.stations.get(&id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Station>> {
        let tables = self.tables.read().await;
        let mut stations: Vec<Station> = tables.stations.values().cloned().collect();
        stations.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(stations)
    }

    async fn add(&self, station: &Station) -> StoreResult<()> {
        self.tables.write().await.stations.insert(station.id, station.clone());
        Ok(())
    }

    async fn update(&self, station: &Station) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        match tables.stations.get_mut(&station.id) {
            Some(stored) => {
                *stored = station.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound { entity: "station", id: station.id }),
        }
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        match self.tables.write().await.stations.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound { entity: "station", id }),
        }
    }
}

#[async_trait]
impl BookingCommitter for MemoryStore {
    async fn commit(&self, changes: ChangeSet) -> StoreResult<()> {
        let mut tables = self.tables.write().await;

        // Check every precondition before the first write
        for train in &changes.trains {
            tables.check_train(train)?;
        }
        for user in &changes.users {
            tables.check_user(user)?;
        }
        if let Some(write) = &changes.ticket {
            tables.check_ticket(write)?;
        }

        for train in &changes.trains {
            tables.put_train(train);
        }
        for user in &changes.users {
            tables.put_user(user);
        }
        match changes.ticket {
            Some(TicketWrite::Insert(ticket)) | Some(TicketWrite::Update(ticket)) => {
                tables.tickets.insert(ticket.id, ticket);
            }
            Some(TicketWrite::Delete(id)) => {
                tables.tickets.remove(&id);
            }
            None => {}
        }
        Ok(())
    }
}
