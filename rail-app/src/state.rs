use std::sync::Arc;

use anyhow::Context;
use rail_booking::{AccountService, BookingLocks, StationService, TicketWorkflow, TrainService};
use rail_core::notification::{LogNotificationSender, NoopNotificationSender, NotificationSender};
use rail_core::repository::Persistence;
use rail_core::BookingPolicy;
use rail_store::app_config::{SenderKind, StorageBackend};
use rail_store::{Config, DbClient, MemoryStore};
use tracing::info;

/// Services wired over one persistence backend and one set of locks.
#[derive(Clone)]
pub struct AppState {
    pub persistence: Persistence,
    pub workflow: Arc<TicketWorkflow>,
    pub trains: Arc<TrainService>,
    pub stations: Arc<StationService>,
    pub accounts: Arc<AccountService>,
    pub locks: Arc<BookingLocks>,
}

impl AppState {
    pub fn build(
        persistence: Persistence,
        notifier: Arc<dyn NotificationSender>,
        policy: BookingPolicy,
    ) -> Self {
        let locks = Arc::new(BookingLocks::new());
        let ordering = policy.seat_ordering;

        Self {
            workflow: Arc::new(TicketWorkflow::new(
                persistence.clone(),
                notifier,
                locks.clone(),
                policy,
            )),
            trains: Arc::new(TrainService::new(persistence.clone(), locks.clone(), ordering)),
            stations: Arc::new(StationService::new(persistence.clone())),
            accounts: Arc::new(AccountService::new(persistence.clone(), locks.clone())),
            persistence,
            locks,
        }
    }

    /// Process-local state with log notifications.
    pub fn in_memory(policy: BookingPolicy) -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let state = Self::build(store.persistence(), Arc::new(LogNotificationSender), policy);
        (state, store)
    }

    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let persistence = match config.database.backend {
            StorageBackend::Postgres => {
                let db = DbClient::new(&config.database)
                    .await
                    .context("Failed to connect to Postgres")?;
                db.ping().await.context("Postgres health check failed")?;
                rail_store::postgres_persistence(db.pool)
            }
            StorageBackend::Memory => {
                info!("Using in-memory storage; data is lost on exit");
                Arc::new(MemoryStore::new()).persistence()
            }
        };

        let notifier: Arc<dyn NotificationSender> = match config.notification.sender {
            SenderKind::Log => Arc::new(LogNotificationSender),
            SenderKind::Noop => Arc::new(NoopNotificationSender),
        };

        Ok(Self::build(persistence, notifier, config.booking.clone()))
    }
}
