//! Dashboard aggregation over the catalog.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use stockroom_core::CategoryId;

use crate::{Category, Product, StockLevel};

/// Label used when a product's category cannot be resolved.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStock {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySummary {
    pub products: usize,
    pub categories: usize,
    pub total_stock: i64,
    /// Products that are low or out of stock.
    pub low_stock: usize,
    /// On-hand quantity grouped by category name, sorted by name.
    pub stock_by_category: Vec<CategoryStock>,
}

impl InventorySummary {
    pub fn compute(products: &[Product], categories: &[Category]) -> Self {
        let names: HashMap<CategoryId, &str> =
            categories.iter().map(|c| (c.id, c.name.as_str())).collect();

        let mut by_category: BTreeMap<String, i64> = BTreeMap::new();
        for p in products {
            let name = names.get(&p.category_id).copied().unwrap_or(UNCATEGORIZED);
            *by_category.entry(name.to_string()).or_default() += p.quantity;
        }

        Self {
            products: products.len(),
            categories: categories.len(),
            total_stock: products.iter().map(|p| p.quantity).sum(),
            low_stock: products
                .iter()
                .filter(|p| p.stock_level() != StockLevel::InStock)
                .count(),
            stock_by_category: by_category
                .into_iter()
                .map(|(name, value)| CategoryStock { name, value })
                .collect(),
        }
    }
}
