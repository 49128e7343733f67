use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{AggregateRoot, CategoryId, DomainError, DomainResult, ProductId};

/// Products at or below this on-hand quantity (but above zero) are "low".
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// Aggregate root: Product.
///
/// `quantity` is only changed by a direct edit or by the stock ledger; both
/// paths bump `version` so a concurrent writer holding a stale snapshot fails
/// its compare-and-set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category_id: CategoryId,
    /// Price in the smallest currency unit (e.g. cents).
    pub unit_price: i64,
    pub quantity: i64,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn stock_level(&self) -> StockLevel {
        StockLevel::classify(self.quantity)
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Coarse stock indicator shown next to each product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    InStock,
    Low,
    OutOfStock,
}

impl StockLevel {
    pub fn classify(quantity: i64) -> Self {
        if quantity > LOW_STOCK_THRESHOLD {
            StockLevel::InStock
        } else if quantity > 0 {
            StockLevel::Low
        } else {
            StockLevel::OutOfStock
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StockLevel::InStock => "in_stock",
            StockLevel::Low => "low",
            StockLevel::OutOfStock => "out_of_stock",
        }
    }
}

/// Unvalidated input for creating or directly editing a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub category_id: CategoryId,
    pub unit_price: i64,
    pub quantity: i64,
}

impl ProductDraft {
    /// Normalize and validate field-level rules.
    ///
    /// Category existence is a storage concern and is checked by the store
    /// inside the same write.
    pub fn validate(self) -> DomainResult<Self> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::invalid("product name cannot be empty"));
        }
        if self.unit_price < 0 {
            return Err(DomainError::invalid("price cannot be negative"));
        }
        if self.quantity < 0 {
            return Err(DomainError::invalid("quantity cannot be negative"));
        }
        Ok(Self {
            name: name.to_string(),
            ..self
        })
    }
}

/// Product list filter (search box + category picker).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category_id: Option<CategoryId>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => product
                .name
                .to_lowercase()
                .contains(&term.to_lowercase()),
        };
        let matches_category = self
            .category_id
            .is_none_or(|category_id| product.category_id == category_id);
        matches_search && matches_category
    }

    /// Filter and order newest first.
    pub fn apply(&self, products: impl IntoIterator<Item = Product>) -> Vec<Product> {
        let mut out: Vec<Product> = products.into_iter().filter(|p| self.matches(p)).collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        out
    }
}
