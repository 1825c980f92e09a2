pub mod app_config;
pub mod database;
pub mod memory_repo;

mod booking_repo;
mod fleet_repo;
mod flight_repo;
mod passenger_repo;
mod reference_repo;
mod sequence_repo;

use std::sync::Arc;

use skydesk_core::Repositories;

pub use database::{DbClient, PgStore};
pub use memory_repo::MemoryStore;

/// Repositories backed by Postgres.
pub fn postgres_repositories(db: &DbClient) -> Repositories {
    Repositories::from_backend(Arc::new(PgStore::new(db.pool.clone())))
}

/// Repositories kept in process memory; nothing survives a restart.
pub fn memory_repositories() -> Repositories {
    Repositories::from_backend(Arc::new(MemoryStore::new()))
}
