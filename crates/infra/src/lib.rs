//! Infrastructure layer: persistence adapters, application services, config.

pub mod accounts;
pub mod catalog;
pub mod config;
pub mod error;
pub mod ledger;
pub mod store;

pub use accounts::{AccountService, Authenticated, SignedIn};
pub use catalog::{CatalogService, ProductView};
pub use config::{AppConfig, ConfigError, LogFormat, StoreConfig};
pub use error::ServiceError;
pub use ledger::{AppliedTransaction, StockLedger};
pub use store::{Backend, InMemoryStore, SqliteStore, StoreError, TransactionQuery};
