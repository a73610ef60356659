use async_trait::async_trait;
use rail_core::repository::{BookingCommitter, ChangeSet, TicketWrite};
use rail_core::StoreResult;
use sqlx::PgPool;
use tracing::debug;

use crate::db_err;
use crate::ticket_repo::{delete_ticket, insert_ticket, update_ticket};
use crate::train_repo::update_train;
use crate::user_repo::update_user;

/// Writes a booking step's trains, users and ticket in one transaction.
pub struct StoreBookingCommitter {
    pool: PgPool,
}

impl StoreBookingCommitter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingCommitter for StoreBookingCommitter {
    async fn commit(&self, changes: ChangeSet) -> StoreResult<()> {
        if changes.is_empty() {
            return Ok(());
        }

        // Any early return drops the transaction and rolls back
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        for train in &changes.trains {
            update_train(&mut tx, train).await?;
        }
        for user in &changes.users {
            update_user(&mut tx, user).await?;
        }
        match &changes.ticket {
            Some(TicketWrite::Insert(ticket)) => insert_ticket(&mut tx, ticket).await?,
            Some(TicketWrite::Update(ticket)) => update_ticket(&mut tx, ticket).await?,
            Some(TicketWrite::Delete(id)) => delete_ticket(&mut tx, *id).await?,
            None => {}
        }

        tx.commit().await.map_err(db_err)?;
        debug!(
            trains = changes.trains.len(),
            users = changes.users.len(),
            "Change set committed"
        );
        Ok(())
    }
}
