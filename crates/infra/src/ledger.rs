//! Stock ledger service: `applyInventoryTransaction` and history.
//!
//! ```text
//! ApplyInventoryTransaction
//!   ↓
//! 1. Validate input (no storage access on failure)
//!   ↓
//! 2. Load stock snapshot (quantity + version)
//!   ↓
//! 3. Plan (pure: new quantity or InsufficientStock)
//!   ↓
//! 4. Commit (CAS on version + ledger append, one unit of work)
//!   ↓ Conflict?
//! 5. Back to 2, at most `max_attempts` times in total
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn, Span};

use stockroom_core::{DomainError, ProductId};
use stockroom_inventory::{ApplyInventoryTransaction, InventoryTransaction};

use crate::error::ServiceError;
use crate::store::{LedgerStore, StoreError, TransactionQuery};

/// Default number of attempts (first try included) before a conflict is surfaced.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Outcome of a successful movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedTransaction {
    pub transaction: InventoryTransaction,
    pub new_quantity: i64,
}

pub struct StockLedger<S: ?Sized> {
    store: Arc<S>,
    max_attempts: u32,
}

impl<S: ?Sized> Clone for StockLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            max_attempts: self.max_attempts,
        }
    }
}

impl<S> StockLedger<S>
where
    S: LedgerStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_max_attempts(store, DEFAULT_MAX_ATTEMPTS)
    }

    pub fn with_max_attempts(store: Arc<S>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Apply one stock movement atomically.
    ///
    /// On success the product's quantity and the ledger moved together. On any
    /// error nothing was written.
    #[instrument(
        skip(self, command),
        fields(
            product_id = %command.product_id,
            direction = %command.direction,
            quantity = command.quantity,
            attempts = tracing::field::Empty
        ),
        err
    )]
    pub async fn apply(
        &self,
        command: ApplyInventoryTransaction,
    ) -> Result<AppliedTransaction, ServiceError> {
        let movement = command.validate()?;
        let product_id = movement.product_id;

        let mut attempt = 0;
        loop {
            attempt += 1;
            Span::current().record("attempts", attempt);

            let snapshot = self
                .store
                .stock_snapshot(product_id)
                .await?
                .ok_or_else(|| DomainError::not_found(format!("product {product_id}")))?;

            let plan = movement.plan(&snapshot, Utc::now())?;

            match self.store.commit_movement(&plan).await {
                Ok(transaction) => {
                    debug!(
                        transaction_id = %transaction.id,
                        previous_quantity = plan.previous_quantity,
                        new_quantity = plan.new_quantity,
                        "stock movement committed"
                    );
                    return Ok(AppliedTransaction {
                        transaction,
                        new_quantity: plan.new_quantity,
                    });
                }
                Err(StoreError::Conflict(reason)) if attempt < self.max_attempts => {
                    debug!(attempt, %reason, "version conflict, retrying");
                }
                Err(StoreError::Conflict(reason)) => {
                    warn!(attempt, %reason, "giving up after repeated version conflicts");
                    return Err(ServiceError::Conflict(format!(
                        "product {product_id} is being modified concurrently; retry the request"
                    )));
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    /// Ledger rows, newest first.
    #[instrument(skip(self), err)]
    pub async fn history(
        &self,
        product_id: Option<ProductId>,
        limit: Option<usize>,
    ) -> Result<Vec<InventoryTransaction>, ServiceError> {
        let query = TransactionQuery::new(product_id, limit);
        Ok(self.store.list_transactions(query).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;

    use stockroom_catalog::{CategoryDraft, ProductDraft};
    use stockroom_inventory::{Direction, PlannedMovement, StockSnapshot};

    use super::*;
    use crate::store::{CatalogStore, InMemoryStore, SqliteStore, StoreResult};

    async fn seed<S: CatalogStore + ?Sized>(store: &S, quantity: i64) -> ProductId {
        let category = store
            .insert_category(&CategoryDraft::new("Tools"), Utc::now())
            .await
            .unwrap();
        let draft = ProductDraft {
            name: "Hammer".into(),
            category_id: category.id,
            unit_price: 1299,
            quantity,
        };
        store.insert_product(&draft, Utc::now()).await.unwrap().id
    }

    fn cmd(product_id: ProductId, direction: Direction, quantity: i64) -> ApplyInventoryTransaction {
        ApplyInventoryTransaction::new(product_id, direction, quantity)
    }

    async fn out_out_in_scenario<S>(store: Arc<S>)
    where
        S: LedgerStore + CatalogStore + ?Sized,
    {
        let product_id = seed(&*store, 10).await;
        let ledger = StockLedger::new(Arc::clone(&store));

        let first = ledger.apply(cmd(product_id, Direction::Out, 4)).await.unwrap();
        assert_eq!(first.new_quantity, 6);

        let err = ledger.apply(cmd(product_id, Direction::Out, 10)).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InsufficientStock {
                requested: 10,
                available: 6
            }
        ));

        let third = ledger.apply(cmd(product_id, Direction::In, 5)).await.unwrap();
        assert_eq!(third.new_quantity, 11);

        let product = store.get_product(product_id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 11);

        let history = ledger.history(Some(product_id), None).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].direction, Direction::In);
        assert_eq!(history[1].direction, Direction::Out);
        assert_eq!(stockroom_inventory::replay(10, history.iter().rev()), 11);
    }

    #[tokio::test]
    async fn scenario_in_memory() {
        out_out_in_scenario(Arc::new(InMemoryStore::new())).await;
    }

    #[tokio::test]
    async fn scenario_sqlite() {
        out_out_in_scenario(Arc::new(SqliteStore::in_memory().await.unwrap())).await;
    }

    async fn resubmission_applies_twice<S>(store: Arc<S>)
    where
        S: LedgerStore + CatalogStore + ?Sized,
    {
        let product_id = seed(&*store, 0).await;
        let ledger = StockLedger::new(Arc::clone(&store));
        let same = cmd(product_id, Direction::In, 3);

        let first = ledger.apply(same.clone()).await.unwrap();
        let second = ledger.apply(same).await.unwrap();
        assert_eq!(first.new_quantity, 3);
        assert_eq!(second.new_quantity, 6);
        assert_ne!(first.transaction.id, second.transaction.id);

        let history = ledger.history(Some(product_id), None).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(store.get_product(product_id).await.unwrap().unwrap().quantity, 6);
    }

    #[tokio::test]
    async fn resubmission_in_memory() {
        resubmission_applies_twice(Arc::new(InMemoryStore::new())).await;
    }

    #[tokio::test]
    async fn resubmission_sqlite() {
        resubmission_applies_twice(Arc::new(SqliteStore::in_memory().await.unwrap())).await;
    }

    #[tokio::test]
    async fn invalid_quantity_never_touches_the_store() {
        let store = Arc::new(InMemoryStore::new());
        let ledger = StockLedger::new(Arc::clone(&store));
        // Product 42 does not exist: validation must fail first.
        let err = ledger.apply(cmd(ProductId::new(42), Direction::In, 0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let ledger = StockLedger::new(Arc::new(InMemoryStore::new()));
        let err = ledger.apply(cmd(ProductId::new(42), Direction::In, 3)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    /// Lets a competing movement land between snapshot and commit, a fixed
    /// number of times.
    struct Interfering {
        inner: InMemoryStore,
        interferences: AtomicUsize,
    }

    #[async_trait]
    impl LedgerStore for Interfering {
        async fn stock_snapshot(&self, product_id: ProductId) -> StoreResult<Option<StockSnapshot>> {
            self.inner.stock_snapshot(product_id).await
        }

        async fn commit_movement(&self, plan: &PlannedMovement) -> StoreResult<InventoryTransaction> {
            let remaining = self.interferences.load(Ordering::SeqCst);
            if remaining > 0 {
                self.interferences.store(remaining - 1, Ordering::SeqCst);
                let current = self.inner.stock_snapshot(plan.product_id()).await?.unwrap();
                let competing = ApplyInventoryTransaction::new(plan.product_id(), Direction::Out, 1)
                    .validate()
                    .unwrap()
                    .plan(&current, Utc::now())
                    .unwrap();
                self.inner.commit_movement(&competing).await?;
            }
            self.inner.commit_movement(plan).await
        }

        async fn list_transactions(&self, query: TransactionQuery) -> StoreResult<Vec<InventoryTransaction>> {
            self.inner.list_transactions(query).await
        }
    }

    async fn interfering(quantity: i64, interferences: usize) -> (Arc<Interfering>, ProductId) {
        let inner = InMemoryStore::new();
        let product_id = seed(&inner, quantity).await;
        let store = Arc::new(Interfering {
            inner,
            interferences: AtomicUsize::new(interferences),
        });
        (store, product_id)
    }

    #[tokio::test]
    async fn conflict_is_retried_against_fresh_stock() {
        let (store, product_id) = interfering(10, 1).await;
        let ledger = StockLedger::with_max_attempts(Arc::clone(&store), 3);

        let applied = ledger.apply(cmd(product_id, Direction::Out, 4)).await.unwrap();
        // 10 - 1 (competitor) - 4
        assert_eq!(applied.new_quantity, 5);
        assert_eq!(store.inner.get_product(product_id).await.unwrap().unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn retry_re_evaluates_sufficiency() {
        let (store, product_id) = interfering(5, 1).await;
        let ledger = StockLedger::with_max_attempts(Arc::clone(&store), 3);

        // Fits against the first snapshot (5) but not the refreshed one (4).
        let err = ledger.apply(cmd(product_id, Direction::Out, 5)).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InsufficientStock {
                requested: 5,
                available: 4
            }
        ));
    }

    #[tokio::test]
    async fn conflict_surfaces_when_attempts_run_out() {
        let (store, product_id) = interfering(10, 5).await;
        let ledger = StockLedger::with_max_attempts(Arc::clone(&store), 2);

        let err = ledger.apply(cmd(product_id, Direction::In, 1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        // Only the two competing movements landed.
        let product = store.inner.get_product(product_id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 8);
        let history = store.inner.list_transactions(TransactionQuery::default()).await.unwrap();
        assert_eq!(history.len(), 2);
    }

    async fn concurrent_outs_never_oversell<S>(store: Arc<S>)
    where
        S: LedgerStore + CatalogStore + 'static,
    {
        let product_id = seed(&*store, 10).await;
        let ledger = StockLedger::with_max_attempts(Arc::clone(&store), 50);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.apply(cmd(product_id, Direction::Out, 3)).await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(ServiceError::InsufficientStock { .. }) | Err(ServiceError::Conflict(_)) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        // 10 units cover at most three OUT 3 movements.
        assert_eq!(succeeded, 3);
        let product = store.get_product(product_id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 1);
        let history = ledger.history(Some(product_id), None).await.unwrap();
        assert_eq!(stockroom_inventory::replay(10, history.iter()), product.quantity);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_outs_in_memory() {
        concurrent_outs_never_oversell(Arc::new(InMemoryStore::new())).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_outs_sqlite() {
        concurrent_outs_never_oversell(Arc::new(SqliteStore::in_memory().await.unwrap())).await;
    }

    /// File-backed WAL database with several pooled connections, so writers
    /// really race on the version check and on SQLite's write lock.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_outs_sqlite_file_pool() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("stock.db").display());
        let store = Arc::new(SqliteStore::connect(&url, 5).await.unwrap());
        let product_id = seed(&*store, 10).await;
        let ledger = StockLedger::with_max_attempts(Arc::clone(&store), 3);

        let mut handles = Vec::new();
        for _ in 0..20 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.apply(cmd(product_id, Direction::Out, 1)).await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(ServiceError::InsufficientStock { .. }) | Err(ServiceError::Conflict(_)) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        let product = store.get_product(product_id).await.unwrap().unwrap();
        assert!(product.quantity >= 0);
        assert_eq!(product.quantity, 10 - succeeded);
        let history = ledger.history(Some(product_id), None).await.unwrap();
        assert_eq!(history.len() as i64, succeeded);
        assert_eq!(stockroom_inventory::replay(10, history.iter()), product.quantity);
    }
}
