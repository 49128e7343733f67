use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stockroom_auth::{Session, UserAccount};
use stockroom_catalog::{Category, CategoryDraft, Product, ProductDraft};
use stockroom_core::{CategoryId, ProductId, SessionId, TransactionId, UserId};
use stockroom_inventory::{InventoryTransaction, PlannedMovement, StockSnapshot};

use super::{
    AccountStore, CatalogStore, LedgerStore, StoreError, StoreResult, TransactionQuery,
};

#[derive(Debug, Default)]
struct State {
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, Product>,
    transactions: Vec<InventoryTransaction>,
    users: HashMap<UserId, UserAccount>,
    sessions: HashMap<SessionId, Session>,
    last_category_id: i64,
    last_product_id: i64,
    last_transaction_id: i64,
}

impl State {
    fn next_category_id(&mut self) -> CategoryId {
        self.last_category_id += 1;
        CategoryId::new(self.last_category_id)
    }

    fn next_product_id(&mut self) -> ProductId {
        self.last_product_id += 1;
        ProductId::new(self.last_product_id)
    }

    fn next_transaction_id(&mut self) -> TransactionId {
        self.last_transaction_id += 1;
        TransactionId::new(self.last_transaction_id)
    }

    fn require_category(&self, id: CategoryId) -> StoreResult<()> {
        if self.categories.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("category {id}")))
        }
    }
}

/// In-memory store.
///
/// Intended for tests/dev. Every operation runs under one lock, which gives the
/// same all-or-nothing behaviour the SQL adapter gets from transactions.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        Ok(self.read()?.categories.values().cloned().collect())
    }

    async fn get_category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        Ok(self.read()?.categories.get(&id).cloned())
    }

    async fn insert_category(&self, draft: &CategoryDraft, at: DateTime<Utc>) -> StoreResult<Category> {
        let mut state = self.write()?;
        let category = Category {
            id: state.next_category_id(),
            name: draft.name.clone(),
            created_at: at,
        };
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn rename_category(&self, id: CategoryId, draft: &CategoryDraft) -> StoreResult<Category> {
        let mut state = self.write()?;
        let category = state
            .categories
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("category {id}")))?;
        category.name = draft.name.clone();
        Ok(category.clone())
    }

    async fn delete_category(&self, id: CategoryId) -> StoreResult<()> {
        let mut state = self.write()?;
        state.require_category(id)?;
        let in_use = state.products.values().filter(|p| p.category_id == id).count();
        if in_use > 0 {
            return Err(StoreError::Restricted(format!(
                "category {id} is still used by {in_use} product(s)"
            )));
        }
        state.categories.remove(&id);
        Ok(())
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        Ok(self.read()?.products.values().cloned().collect())
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn insert_product(&self, draft: &ProductDraft, at: DateTime<Utc>) -> StoreResult<Product> {
        let mut state = self.write()?;
        state.require_category(draft.category_id)?;
        let product = Product {
            id: state.next_product_id(),
            name: draft.name.clone(),
            category_id: draft.category_id,
            unit_price: draft.unit_price,
            quantity: draft.quantity,
            version: 1,
            created_at: at,
            updated_at: at,
        };
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        draft: &ProductDraft,
        at: DateTime<Utc>,
    ) -> StoreResult<Product> {
        let mut state = self.write()?;
        if !state.products.contains_key(&id) {
            return Err(StoreError::NotFound(format!("product {id}")));
        }
        state.require_category(draft.category_id)?;
        let product = state
            .products
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("product {id}")))?;
        product.name = draft.name.clone();
        product.category_id = draft.category_id;
        product.unit_price = draft.unit_price;
        product.quantity = draft.quantity;
        product.version += 1;
        product.updated_at = at;
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.products.contains_key(&id) {
            return Err(StoreError::NotFound(format!("product {id}")));
        }
        if state.transactions.iter().any(|t| t.product_id == id) {
            return Err(StoreError::Restricted(format!(
                "product {id} has stock history and cannot be deleted"
            )));
        }
        state.products.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn stock_snapshot(&self, product_id: ProductId) -> StoreResult<Option<StockSnapshot>> {
        Ok(self
            .read()?
            .products
            .get(&product_id)
            .map(|p| StockSnapshot::new(p.id, p.quantity, p.version)))
    }

    async fn commit_movement(&self, plan: &PlannedMovement) -> StoreResult<InventoryTransaction> {
        let mut state = self.write()?;
        let product_id = plan.product_id();
        let current = state
            .products
            .get(&product_id)
            .map(|p| p.version)
            .ok_or_else(|| StoreError::NotFound(format!("product {product_id}")))?;

        if !plan.expected().matches(current) {
            return Err(StoreError::Conflict(format!(
                "product {product_id}: expected version {}, found {current}",
                plan.expected_version
            )));
        }
        if plan.new_quantity < 0 {
            return Err(StoreError::Constraint(format!(
                "product {product_id}: quantity cannot go below zero"
            )));
        }

        let transaction = InventoryTransaction {
            id: state.next_transaction_id(),
            product_id,
            direction: plan.movement.direction,
            quantity: plan.movement.quantity,
            created_at: plan.occurred_at,
        };

        if let Some(product) = state.products.get_mut(&product_id) {
            product.quantity = plan.new_quantity;
            product.version += 1;
            product.updated_at = plan.occurred_at;
        }
        state.transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn list_transactions(&self, query: TransactionQuery) -> StoreResult<Vec<InventoryTransaction>> {
        let state = self.read()?;
        Ok(state
            .transactions
            .iter()
            .rev()
            .filter(|t| query.product_id.is_none_or(|id| t.product_id == id))
            .take(query.limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn insert_user(&self, account: &UserAccount) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.users.values().any(|u| u.email == account.email) {
            return Err(StoreError::Duplicate(format!("account for {}", account.email)));
        }
        state.users.insert(account.id, account.clone());
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>> {
        Ok(self.read()?.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user(&self, id: UserId) -> StoreResult<Option<UserAccount>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn insert_session(&self, session: &Session) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.users.contains_key(&session.user_id) {
            return Err(StoreError::NotFound(format!("user {}", session.user_id)));
        }
        state.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn get_session(&self, id: SessionId) -> StoreResult<Option<Session>> {
        Ok(self.read()?.sessions.get(&id).cloned())
    }

    async fn revoke_session(&self, id: SessionId, at: DateTime<Utc>) -> StoreResult<()> {
        let mut state = self.write()?;
        let session = state
            .sessions
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("session {id}")))?;
        session.revoked_at.get_or_insert(at);
        Ok(())
    }
}
