//! Inventory domain module: the stock ledger.
//!
//! Business rules for stock movements, implemented purely as deterministic
//! domain logic (no IO, no HTTP, no storage). Atomicity and isolation are the
//! storage layer's job; this crate decides *what* a movement does.

pub mod ledger;
pub mod movement;

pub use ledger::{
    replay, ApplyInventoryTransaction, InventoryTransaction, PlannedMovement, StockMovement,
    StockSnapshot,
};
pub use movement::{Direction, Quantity};
