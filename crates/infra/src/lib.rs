//! Infrastructure layer: record storage and configuration.

pub mod config;
pub mod store;

pub use config::{AppConfig, ConfigError, PaginationConfig, Persistence};
pub use store::{InMemoryStore, PostgresStore, Store, StoreError};
