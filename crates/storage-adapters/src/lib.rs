//! # storage-adapters
//!
//! `ReviewRepo` implementations. The in-memory store is always compiled
//! and is the default backend; Postgres is behind the `db-postgres`
//! feature. Both must order and paginate identically — the shared rules
//! live in `domains::query`.

pub mod memory;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::MemoryReviewRepo;

#[cfg(feature = "db-postgres")]
pub use postgres::PostgresReviewRepo;
