use chrono::{DateTime, Utc};
use rail_core::User;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    Debit,
    Credit,
}

/// Record of one wallet movement
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: EntryKind,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub reference: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Insufficient balance for user {user_id}: available {available}, requested {requested}")]
    InsufficientBalance {
        user_id: Uuid,
        available: Decimal,
        requested: Decimal,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),
}

/// Moves money in and out of a user's wallet.
///
/// Works on a loaded `User`; persisting the new balance is the caller's job.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalletLedger;

impl WalletLedger {
    pub fn new() -> Self {
        Self
    }

    pub fn debit(&self, user: &mut User, amount: Decimal, reference: Option<Uuid>) -> Result<LedgerEntry, LedgerError> {
        if amount.is_sign_negative() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        if user.wallet_balance < amount {
            return Err(LedgerError::InsufficientBalance {
                user_id: user.id,
                available: user.wallet_balance,
                requested: amount,
            });
        }

        user.wallet_balance -= amount;
        Ok(self.record(user, EntryKind::Debit, amount, reference))
    }

    pub fn credit(&self, user: &mut User, amount: Decimal, reference: Option<Uuid>) -> Result<LedgerEntry, LedgerError> {
        if amount.is_sign_negative() {
            return Err(LedgerError::InvalidAmount(amount));
        }

        user.wallet_balance += amount;
        Ok(self.record(user, EntryKind::Credit, amount, reference))
    }

    fn record(&self, user: &User, kind: EntryKind, amount: Decimal, reference: Option<Uuid>) -> LedgerEntry {
        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            user_id: user.id,
            kind,
            amount,
            balance_after: user.wallet_balance,
            reference,
            created_at: Utc::now(),
        };
        info!(
            entry_id = %entry.id,
            user_id = %entry.user_id,
            kind = ?entry.kind,
            amount = %entry.amount,
            balance_after = %entry.balance_after,
            "Wallet ledger entry"
        );
        entry
    }
}
