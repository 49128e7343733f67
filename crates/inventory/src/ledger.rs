use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, ExpectedVersion, ProductId, TransactionId};

use crate::movement::{Direction, Quantity};

/// A committed ledger row. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryTransaction {
    pub id: TransactionId,
    pub product_id: ProductId,
    pub direction: Direction,
    pub quantity: Quantity,
    pub created_at: DateTime<Utc>,
}

impl InventoryTransaction {
    pub fn delta(&self) -> i64 {
        self.direction.signed(self.quantity)
    }
}

/// Command: apply one stock movement (raw caller input).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyInventoryTransaction {
    pub product_id: ProductId,
    pub direction: Direction,
    pub quantity: i64,
}

impl ApplyInventoryTransaction {
    pub fn new(product_id: ProductId, direction: Direction, quantity: i64) -> Self {
        Self {
            product_id,
            direction,
            quantity,
        }
    }

    /// Validate the input. Fails with `InvalidArgument` before any storage access.
    pub fn validate(&self) -> DomainResult<StockMovement> {
        Ok(StockMovement {
            product_id: self.product_id,
            direction: self.direction,
            quantity: Quantity::new(self.quantity)?,
        })
    }
}

/// A validated stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub product_id: ProductId,
    pub direction: Direction,
    pub quantity: Quantity,
}

impl StockMovement {
    pub fn delta(&self) -> i64 {
        self.direction.signed(self.quantity)
    }

    /// Decide the outcome of this movement against a product snapshot.
    ///
    /// Pure: the returned plan carries the version it was decided against, and
    /// the store commits it only if the product is still at that version.
    pub fn plan(
        &self,
        snapshot: &StockSnapshot,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<PlannedMovement> {
        if snapshot.product_id != self.product_id {
            return Err(DomainError::invalid("snapshot belongs to a different product"));
        }
        let on_hand = snapshot.quantity;
        let new_quantity = on_hand
            .checked_add(self.delta())
            .ok_or_else(|| DomainError::invalid("quantity overflows on-hand stock"))?;

        if new_quantity < 0 {
            return Err(DomainError::insufficient_stock(self.quantity.get(), on_hand));
        }

        Ok(PlannedMovement {
            movement: *self,
            expected_version: snapshot.version,
            previous_quantity: on_hand,
            new_quantity,
            occurred_at,
        })
    }
}

/// On-hand stock of one product at one version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub product_id: ProductId,
    pub quantity: i64,
    pub version: u64,
}

impl StockSnapshot {
    pub fn new(product_id: ProductId, quantity: i64, version: u64) -> Self {
        Self {
            product_id,
            quantity,
            version,
        }
    }
}

/// A movement decided against a specific product version, ready to commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedMovement {
    pub movement: StockMovement,
    pub expected_version: u64,
    pub previous_quantity: i64,
    pub new_quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

impl PlannedMovement {
    pub fn product_id(&self) -> ProductId {
        self.movement.product_id
    }

    /// Version the product must still be at for this plan to commit.
    pub fn expected(&self) -> ExpectedVersion {
        ExpectedVersion::Exact(self.expected_version)
    }
}

/// Reconstruct on-hand stock from a baseline and the ledger recorded since.
pub fn replay<'a>(baseline: i64, ledger: impl IntoIterator<Item = &'a InventoryTransaction>) -> i64 {
    ledger.into_iter().fold(baseline, |acc, t| acc + t.delta())
}
