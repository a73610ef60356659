use std::sync::Arc;

use rail_core::repository::Persistence;
use rail_core::User;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{BookingError, BookingResult};
use crate::ledger::{LedgerEntry, WalletLedger};
use crate::load;
use crate::locks::BookingLocks;

/// Wallet top-ups and account lookups
pub struct AccountService {
    store: Persistence,
    locks: Arc<BookingLocks>,
    ledger: WalletLedger,
}

impl AccountService {
    pub fn new(store: Persistence, locks: Arc<BookingLocks>) -> Self {
        Self {
            store,
            locks,
            ledger: WalletLedger::new(),
        }
    }

    pub async fn get_user(&self, id: Uuid) -> BookingResult<User> {
        load::user(&self.store, id).await
    }

    pub async fn list_users(&self) -> BookingResult<Vec<User>> {
        Ok(self.store.users.list().await?)
    }

    pub async fn add_money(&self, user_id: Uuid, amount: Decimal) -> BookingResult<(User, LedgerEntry)> {
        if amount <= Decimal::ZERO {
            return Err(BookingError::Validation(format!(
                "Top-up amount must be positive, got {}",
                amount
            )));
        }

        let _guard = self.locks.users.acquire(user_id).await;
        let mut user = load::user(&self.store, user_id).await?;
        let entry = self.ledger.credit(&mut user, amount, None)?;
        let stored = self.store.users.update(&user).await?;
        Ok((stored, entry))
    }
}
