//! External concerns: database, in-memory store, crypto.

pub mod crypto;
pub mod database;
pub mod storage;

pub use database::{init_database, DatabaseConfig};
pub use database::repositories::SeaOrmRepositoryProvider;
pub use storage::MemoryRepositoryProvider;
