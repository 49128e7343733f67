//! SQLite-backed store.
//!
//! ## Error Mapping
//!
//! | SQLx error | SQLite condition | `StoreError` |
//! |------------|------------------|--------------|
//! | Database (unique) | `SQLITE_CONSTRAINT_UNIQUE` | `Duplicate` |
//! | Database (check / not null / foreign key) | `SQLITE_CONSTRAINT_*` | `Constraint` |
//! | Database (busy / locked) | `SQLITE_BUSY`, `SQLITE_LOCKED` | `Conflict` |
//! | Database (other) | any other | `Backend` |
//! | RowNotFound | n/a | `NotFound` |
//! | anything else | n/a | `Backend` |
//!
//! Busy and locked map to `Conflict` so the ledger treats a writer that lost the
//! database lock the same as one that lost the version race.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::{instrument, Span};

use stockroom_auth::{Role, Session, UserAccount};
use stockroom_catalog::{Category, CategoryDraft, Product, ProductDraft};
use stockroom_core::{CategoryId, ProductId, SessionId, TransactionId, UserId};
use stockroom_inventory::{Direction, InventoryTransaction, PlannedMovement, Quantity, StockSnapshot};

use super::{
    AccountStore, CatalogStore, LedgerStore, StoreError, StoreResult, TransactionQuery,
};

const PRODUCT_COLUMNS: &str =
    "id, name, category_id, unit_price, quantity, version, created_at, updated_at";

const TRANSACTION_COLUMNS: &str = "id, product_id, direction, quantity, created_at";

const USER_COLUMNS: &str = "id, email, password_hash, roles, created_at";

const SESSION_COLUMNS: &str = "id, user_id, created_at, expires_at, revoked_at";

/// SQLite store over a connection pool.
///
/// `products.version` is the compare-and-set token for stock changes; see
/// [`LedgerStore::commit_movement`].
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `url` and run migrations.
    ///
    /// `sqlite::memory:` databases live only as long as their connection, so
    /// they get a single connection that is never recycled.
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");

        let mut options = SqliteConnectOptions::from_str(url)
            .map_err(|e| map_sqlx_error("parse_url", e))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Private in-memory database, migrated. Used by tests and benches.
    pub async fn in_memory() -> StoreResult<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn begin(&self, operation: &str) -> StoreResult<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error(operation, e))
    }
}

async fn rollback(tx: Transaction<'_, Sqlite>) -> StoreResult<()> {
    tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))
}

async fn commit(tx: Transaction<'_, Sqlite>) -> StoreResult<()> {
    tx.commit()
        .await
        .map_err(|e| map_sqlx_error("commit_transaction", e))
}

async fn row_exists(
    tx: &mut Transaction<'_, Sqlite>,
    sql: &str,
    id: i64,
    operation: &str,
) -> StoreResult<bool> {
    let row = sqlx::query(sql)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error(operation, e))?;
    Ok(row.is_some())
}

async fn count_rows(
    tx: &mut Transaction<'_, Sqlite>,
    sql: &str,
    id: i64,
    operation: &str,
) -> StoreResult<i64> {
    let row = sqlx::query(sql)
        .bind(id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error(operation, e))?;
    row.try_get::<i64, _>(0).map_err(corrupt)
}

#[async_trait]
impl CatalogStore for SqliteStore {
    #[instrument(skip(self), err)]
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name, created_at FROM categories")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_categories", e))?;
        rows.iter().map(category_from_row).collect()
    }

    #[instrument(skip(self), fields(category_id = %id), err)]
    async fn get_category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        let row = sqlx::query("SELECT id, name, created_at FROM categories WHERE id = ?")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_category", e))?;
        row.as_ref().map(category_from_row).transpose()
    }

    #[instrument(skip(self, draft), err)]
    async fn insert_category(&self, draft: &CategoryDraft, at: DateTime<Utc>) -> StoreResult<Category> {
        let row = sqlx::query(
            "INSERT INTO categories (name, created_at) VALUES (?, ?) RETURNING id, name, created_at",
        )
        .bind(&draft.name)
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_category", e))?;
        category_from_row(&row)
    }

    #[instrument(skip(self, draft), fields(category_id = %id), err)]
    async fn rename_category(&self, id: CategoryId, draft: &CategoryDraft) -> StoreResult<Category> {
        let row = sqlx::query(
            "UPDATE categories SET name = ? WHERE id = ? RETURNING id, name, created_at",
        )
        .bind(&draft.name)
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("rename_category", e))?;
        match row {
            Some(row) => category_from_row(&row),
            None => Err(StoreError::NotFound(format!("category {id}"))),
        }
    }

    #[instrument(skip(self), fields(category_id = %id), err)]
    async fn delete_category(&self, id: CategoryId) -> StoreResult<()> {
        let mut tx = self.begin("delete_category").await?;

        if !row_exists(&mut tx, "SELECT 1 FROM categories WHERE id = ?", id.get(), "delete_category").await? {
            rollback(tx).await?;
            return Err(StoreError::NotFound(format!("category {id}")));
        }

        let in_use = count_rows(
            &mut tx,
            "SELECT COUNT(*) FROM products WHERE category_id = ?",
            id.get(),
            "delete_category",
        )
        .await?;
        if in_use > 0 {
            rollback(tx).await?;
            return Err(StoreError::Restricted(format!(
                "category {id} is still used by {in_use} product(s)"
            )));
        }

        sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_category", e))?;

        commit(tx).await
    }

    #[instrument(skip(self), fields(product_count = tracing::field::Empty), err)]
    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;
        let products = rows.iter().map(product_from_row).collect::<StoreResult<Vec<_>>>()?;
        Span::current().record("product_count", products.len());
        Ok(products)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;
        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self, draft), fields(category_id = %draft.category_id), err)]
    async fn insert_product(&self, draft: &ProductDraft, at: DateTime<Utc>) -> StoreResult<Product> {
        let mut tx = self.begin("insert_product").await?;

        let category_id = draft.category_id;
        if !row_exists(&mut tx, "SELECT 1 FROM categories WHERE id = ?", category_id.get(), "insert_product").await? {
            rollback(tx).await?;
            return Err(StoreError::NotFound(format!("category {category_id}")));
        }

        let sql = format!(
            "INSERT INTO products (name, category_id, unit_price, quantity, version, created_at, updated_at) \
             VALUES (?, ?, ?, ?, 1, ?, ?) RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&draft.name)
            .bind(category_id.get())
            .bind(draft.unit_price)
            .bind(draft.quantity)
            .bind(at)
            .bind(at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_product", e))?;
        let product = product_from_row(&row)?;

        commit(tx).await?;
        Ok(product)
    }

    #[instrument(skip(self, draft), fields(product_id = %id), err)]
    async fn update_product(
        &self,
        id: ProductId,
        draft: &ProductDraft,
        at: DateTime<Utc>,
    ) -> StoreResult<Product> {
        let mut tx = self.begin("update_product").await?;

        if !row_exists(&mut tx, "SELECT 1 FROM products WHERE id = ?", id.get(), "update_product").await? {
            rollback(tx).await?;
            return Err(StoreError::NotFound(format!("product {id}")));
        }
        let category_id = draft.category_id;
        if !row_exists(&mut tx, "SELECT 1 FROM categories WHERE id = ?", category_id.get(), "update_product").await? {
            rollback(tx).await?;
            return Err(StoreError::NotFound(format!("category {category_id}")));
        }

        let sql = format!(
            "UPDATE products \
             SET name = ?, category_id = ?, unit_price = ?, quantity = ?, version = version + 1, updated_at = ? \
             WHERE id = ? RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&draft.name)
            .bind(category_id.get())
            .bind(draft.unit_price)
            .bind(draft.quantity)
            .bind(at)
            .bind(id.get())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_product", e))?;
        let product = product_from_row(&row)?;

        commit(tx).await?;
        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let mut tx = self.begin("delete_product").await?;

        if !row_exists(&mut tx, "SELECT 1 FROM products WHERE id = ?", id.get(), "delete_product").await? {
            rollback(tx).await?;
            return Err(StoreError::NotFound(format!("product {id}")));
        }

        let history = count_rows(
            &mut tx,
            "SELECT COUNT(*) FROM inventory_transactions WHERE product_id = ?",
            id.get(),
            "delete_product",
        )
        .await?;
        if history > 0 {
            rollback(tx).await?;
            return Err(StoreError::Restricted(format!(
                "product {id} has stock history and cannot be deleted"
            )));
        }

        sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;

        commit(tx).await
    }
}

#[async_trait]
impl LedgerStore for SqliteStore {
    #[instrument(skip(self), fields(product_id = %product_id), err)]
    async fn stock_snapshot(&self, product_id: ProductId) -> StoreResult<Option<StockSnapshot>> {
        let row = sqlx::query("SELECT quantity, version FROM products WHERE id = ?")
            .bind(product_id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("stock_snapshot", e))?;

        row.map(|row| {
            let quantity: i64 = row.try_get("quantity").map_err(corrupt)?;
            let version = version_from_row(&row)?;
            Ok(StockSnapshot::new(product_id, quantity, version))
        })
        .transpose()
    }

    /// Compare-and-set on `products.version`, then append the ledger row, in
    /// one transaction.
    ///
    /// The guarded `UPDATE` is the first statement, so the transaction takes
    /// the write lock before reading anything; a concurrent writer either waits
    /// and then finds the version moved, or gives up with busy. Both surface as
    /// `Conflict`.
    #[instrument(
        skip(self, plan),
        fields(
            product_id = %plan.product_id(),
            direction = %plan.movement.direction,
            quantity = plan.movement.quantity.get(),
            expected_version = plan.expected_version
        ),
        err
    )]
    async fn commit_movement(&self, plan: &PlannedMovement) -> StoreResult<InventoryTransaction> {
        let product_id = plan.product_id();
        let expected_version = i64::try_from(plan.expected_version)
            .map_err(|_| StoreError::Conflict(format!("product {product_id}: version out of range")))?;

        let mut tx = self.begin("commit_movement").await?;

        let updated = sqlx::query(
            "UPDATE products SET quantity = ?, version = version + 1, updated_at = ? \
             WHERE id = ? AND version = ?",
        )
        .bind(plan.new_quantity)
        .bind(plan.occurred_at)
        .bind(product_id.get())
        .bind(expected_version)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("commit_movement", e))?;

        if updated.rows_affected() == 0 {
            let exists = row_exists(&mut tx, "SELECT 1 FROM products WHERE id = ?", product_id.get(), "commit_movement").await?;
            rollback(tx).await?;
            return Err(if exists {
                StoreError::Conflict(format!(
                    "product {product_id} changed since version {}",
                    plan.expected_version
                ))
            } else {
                StoreError::NotFound(format!("product {product_id}"))
            });
        }

        let sql = format!(
            "INSERT INTO inventory_transactions (product_id, direction, quantity, created_at) \
             VALUES (?, ?, ?, ?) RETURNING {TRANSACTION_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(product_id.get())
            .bind(plan.movement.direction.as_str())
            .bind(plan.movement.quantity.get())
            .bind(plan.occurred_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_transaction", e))?;
        let transaction = transaction_from_row(&row)?;

        commit(tx).await?;
        Ok(transaction)
    }

    #[instrument(skip(self), err)]
    async fn list_transactions(&self, query: TransactionQuery) -> StoreResult<Vec<InventoryTransaction>> {
        let product_id = query.product_id.map(ProductId::get);
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);

        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM inventory_transactions \
             WHERE (? IS NULL OR product_id = ?) ORDER BY id DESC LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(product_id)
            .bind(product_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_transactions", e))?;
        rows.iter().map(transaction_from_row).collect()
    }
}

#[async_trait]
impl AccountStore for SqliteStore {
    #[instrument(skip(self, account), fields(user_id = %account.id), err)]
    async fn insert_user(&self, account: &UserAccount) -> StoreResult<()> {
        let roles = serde_json::to_string(&account.roles)
            .map_err(|e| StoreError::Backend(format!("failed to encode roles: {e}")))?;

        sqlx::query(
            "INSERT INTO users (id, email, password_hash, roles, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(account.id.to_string())
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(roles)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Duplicate(format!("account for {}", account.email))
            } else {
                map_sqlx_error("insert_user", e)
            }
        })?;
        Ok(())
    }

    #[instrument(skip(self, email), err)]
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn get_user(&self, id: UserId) -> StoreResult<Option<UserAccount>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self, session), fields(session_id = %session.id), err)]
    async fn insert_session(&self, session: &Session) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, created_at, expires_at, revoked_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(session.id.to_string())
        .bind(session.user_id.to_string())
        .bind(session.created_at)
        .bind(session.expires_at)
        .bind(session.revoked_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_session", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(session_id = %id), err)]
    async fn get_session(&self, id: SessionId) -> StoreResult<Option<Session>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_session", e))?;
        row.as_ref().map(session_from_row).transpose()
    }

    #[instrument(skip(self), fields(session_id = %id), err)]
    async fn revoke_session(&self, id: SessionId, at: DateTime<Utc>) -> StoreResult<()> {
        let updated = sqlx::query("UPDATE sessions SET revoked_at = COALESCE(revoked_at, ?) WHERE id = ?")
            .bind(at)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("revoke_session", e))?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("session {id}")));
        }
        Ok(())
    }
}

// Row decoding

fn corrupt(err: sqlx::Error) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

fn version_from_row(row: &SqliteRow) -> StoreResult<u64> {
    let version: i64 = row.try_get("version").map_err(corrupt)?;
    u64::try_from(version).map_err(|_| StoreError::Corrupt(format!("negative version {version}")))
}

fn category_from_row(row: &SqliteRow) -> StoreResult<Category> {
    Ok(Category {
        id: CategoryId::new(row.try_get("id").map_err(corrupt)?),
        name: row.try_get("name").map_err(corrupt)?,
        created_at: row.try_get("created_at").map_err(corrupt)?,
    })
}

fn product_from_row(row: &SqliteRow) -> StoreResult<Product> {
    Ok(Product {
        id: ProductId::new(row.try_get("id").map_err(corrupt)?),
        name: row.try_get("name").map_err(corrupt)?,
        category_id: CategoryId::new(row.try_get("category_id").map_err(corrupt)?),
        unit_price: row.try_get("unit_price").map_err(corrupt)?,
        quantity: row.try_get("quantity").map_err(corrupt)?,
        version: version_from_row(row)?,
        created_at: row.try_get("created_at").map_err(corrupt)?,
        updated_at: row.try_get("updated_at").map_err(corrupt)?,
    })
}

fn transaction_from_row(row: &SqliteRow) -> StoreResult<InventoryTransaction> {
    let direction: String = row.try_get("direction").map_err(corrupt)?;
    let quantity: i64 = row.try_get("quantity").map_err(corrupt)?;
    Ok(InventoryTransaction {
        id: TransactionId::new(row.try_get("id").map_err(corrupt)?),
        product_id: ProductId::new(row.try_get("product_id").map_err(corrupt)?),
        direction: Direction::from_str(&direction)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        quantity: Quantity::new(quantity).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        created_at: row.try_get("created_at").map_err(corrupt)?,
    })
}

fn user_from_row(row: &SqliteRow) -> StoreResult<UserAccount> {
    let id: String = row.try_get("id").map_err(corrupt)?;
    let roles: String = row.try_get("roles").map_err(corrupt)?;
    let roles: Vec<Role> = serde_json::from_str(&roles)
        .map_err(|e| StoreError::Corrupt(format!("roles column: {e}")))?;
    Ok(UserAccount {
        id: UserId::from_str(&id).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        email: row.try_get("email").map_err(corrupt)?,
        password_hash: row.try_get("password_hash").map_err(corrupt)?,
        roles,
        created_at: row.try_get("created_at").map_err(corrupt)?,
    })
}

fn session_from_row(row: &SqliteRow) -> StoreResult<Session> {
    let id: String = row.try_get("id").map_err(corrupt)?;
    let user_id: String = row.try_get("user_id").map_err(corrupt)?;
    Ok(Session {
        id: SessionId::from_str(&id).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        user_id: UserId::from_str(&user_id).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        created_at: row.try_get("created_at").map_err(corrupt)?,
        expires_at: row.try_get("expires_at").map_err(corrupt)?,
        revoked_at: row.try_get("revoked_at").map_err(corrupt)?,
    })
}

/// Map SQLx errors to `StoreError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());

            if is_busy_code(db_err.code().as_deref()) {
                return StoreError::Conflict(msg);
            }

            match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation => StoreError::Duplicate(msg),
                sqlx::error::ErrorKind::ForeignKeyViolation
                | sqlx::error::ErrorKind::CheckViolation
                | sqlx::error::ErrorKind::NotNullViolation => StoreError::Constraint(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::RowNotFound => StoreError::NotFound(format!("row in {operation}")),
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}

/// SQLITE_BUSY (5), SQLITE_LOCKED (6) and their extended codes.
fn is_busy_code(code: Option<&str>) -> bool {
    matches!(code, Some("5" | "6" | "261" | "262" | "517"))
}

/// Check if an error is a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation)
        }
        _ => false,
    }
}
