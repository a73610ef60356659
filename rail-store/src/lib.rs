pub mod app_config;
pub mod commit;
pub mod database;
pub mod memory_repo;
pub mod station_repo;
pub mod ticket_repo;
pub mod train_repo;
pub mod user_repo;

use std::sync::Arc;

use rail_core::repository::Persistence;
use rail_core::StoreError;
use sqlx::PgPool;

pub use app_config::Config;
pub use commit::StoreBookingCommitter;
pub use database::DbClient;
pub use memory_repo::MemoryStore;
pub use station_repo::StoreStationRepository;
pub use ticket_repo::StoreTicketRepository;
pub use train_repo::StoreTrainRepository;
pub use user_repo::StoreUserRepository;

pub(crate) fn db_err(err: sqlx::Error) -> StoreError {
    StoreError::backend(err)
}

/// Postgres-backed repositories sharing one pool.
pub fn postgres_persistence(pool: PgPool) -> Persistence {
    Persistence {
        trains: Arc::new(StoreTrainRepository::new(pool.clone())),
        tickets: Arc::new(StoreTicketRepository::new(pool.clone())),
        users: Arc::new(StoreUserRepository::new(pool.clone())),
        stations: Arc::new(StoreStationRepository::new(pool.clone())),
        committer: Arc::new(StoreBookingCommitter::new(pool)),
    }
}
