//! Catalog domain module: categories and products.
//!
//! This crate contains business rules for the catalog, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod category;
pub mod product;
pub mod summary;

pub use category::{Category, CategoryDraft, CategorySort, MAX_CATEGORY_NAME_LEN};
pub use product::{Product, ProductDraft, ProductFilter, StockLevel, LOW_STOCK_THRESHOLD};
pub use summary::{CategoryStock, InventorySummary, UNCATEGORIZED};
