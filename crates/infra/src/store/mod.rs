//! Persistence ports and their adapters.
//!
//! Three narrow traits cover the three kinds of records the service keeps:
//!
//! - [`CatalogStore`]: categories and products (plain CRUD plus the
//!   referential rules between them)
//! - [`LedgerStore`]: the append-only stock ledger and the atomic
//!   compare-and-set that keeps `products.quantity` in step with it
//! - [`AccountStore`]: users and sign-in sessions
//!
//! [`Backend`] bundles them so the application can hold a single
//! `Arc<dyn Backend>` regardless of which adapter is configured.
//!
//! ## Atomicity
//!
//! Every method is a single unit of work: either all of its writes land or none
//! do. In particular [`LedgerStore::commit_movement`] updates the product row
//! and appends the ledger row together, guarded by the product's version.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use stockroom_auth::{Session, UserAccount};
use stockroom_catalog::{Category, CategoryDraft, Product, ProductDraft};
use stockroom_core::{CategoryId, ProductId, SessionId, UserId};
use stockroom_inventory::{InventoryTransaction, PlannedMovement, StockSnapshot};

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryStore;
pub use sqlite::SqliteStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed record does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Compare-and-set lost against a concurrent writer.
    #[error("concurrent modification: {0}")]
    Conflict(String),

    /// The write would orphan dependent records.
    #[error("{0}")]
    Restricted(String),

    /// A uniqueness rule was violated.
    #[error("{0} already exists")]
    Duplicate(String),

    /// The database rejected a row (CHECK / NOT NULL / foreign key).
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// A stored row could not be decoded into a domain value.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Ledger query: newest first, optionally for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionQuery {
    pub product_id: Option<ProductId>,
    pub limit: usize,
}

impl TransactionQuery {
    pub const DEFAULT_LIMIT: usize = 50;
    pub const MAX_LIMIT: usize = 200;

    /// Build a query, clamping `limit` to `1..=MAX_LIMIT` (absent means the default).
    pub fn new(product_id: Option<ProductId>, limit: Option<usize>) -> Self {
        let limit = limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT);
        Self { product_id, limit }
    }
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;

    async fn get_category(&self, id: CategoryId) -> StoreResult<Option<Category>>;

    async fn insert_category(&self, draft: &CategoryDraft, at: DateTime<Utc>) -> StoreResult<Category>;

    /// Fails with `NotFound` when the category does not exist.
    async fn rename_category(&self, id: CategoryId, draft: &CategoryDraft) -> StoreResult<Category>;

    /// Fails with `Restricted` while any product still references the category.
    async fn delete_category(&self, id: CategoryId) -> StoreResult<()>;

    async fn list_products(&self) -> StoreResult<Vec<Product>>;

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>>;

    /// Fails with `NotFound` when the draft's category does not exist.
    async fn insert_product(&self, draft: &ProductDraft, at: DateTime<Utc>) -> StoreResult<Product>;

    /// Overwrite all editable fields and bump the version.
    async fn update_product(
        &self,
        id: ProductId,
        draft: &ProductDraft,
        at: DateTime<Utc>,
    ) -> StoreResult<Product>;

    /// Fails with `Restricted` once the product has ledger history.
    async fn delete_product(&self, id: ProductId) -> StoreResult<()>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Current on-hand quantity and version of a product.
    async fn stock_snapshot(&self, product_id: ProductId) -> StoreResult<Option<StockSnapshot>>;

    /// Atomically set the product's quantity to `plan.new_quantity`, bump its
    /// version and append the ledger row, provided the product is still at
    /// `plan.expected_version`.
    ///
    /// Fails with `Conflict` when the version moved and `NotFound` when the
    /// product is gone. Nothing is written in either case.
    async fn commit_movement(&self, plan: &PlannedMovement) -> StoreResult<InventoryTransaction>;

    async fn list_transactions(&self, query: TransactionQuery) -> StoreResult<Vec<InventoryTransaction>>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fails with `Duplicate` when the e-mail is taken.
    async fn insert_user(&self, account: &UserAccount) -> StoreResult<()>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>>;

    async fn get_user(&self, id: UserId) -> StoreResult<Option<UserAccount>>;

    async fn insert_session(&self, session: &Session) -> StoreResult<()>;

    async fn get_session(&self, id: SessionId) -> StoreResult<Option<Session>>;

    /// Idempotent; an already revoked session keeps its original timestamp.
    async fn revoke_session(&self, id: SessionId, at: DateTime<Utc>) -> StoreResult<()>;
}

/// Everything the application needs from persistence.
pub trait Backend: CatalogStore + LedgerStore + AccountStore {}

impl<T> Backend for T where T: CatalogStore + LedgerStore + AccountStore {}
