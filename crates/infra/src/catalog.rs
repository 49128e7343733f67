//! Category and product management plus the dashboard summary.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use stockroom_catalog::{
    Category, CategoryDraft, CategorySort, InventorySummary, Product, ProductDraft, ProductFilter,
    StockLevel, UNCATEGORIZED,
};
use stockroom_core::{CategoryId, DomainError, ProductId};

use crate::error::ServiceError;
use crate::store::CatalogStore;

/// A product as listed: the record plus its resolved category name and stock badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub category_name: String,
    pub stock_level: StockLevel,
}

impl ProductView {
    fn new(product: Product, names: &HashMap<CategoryId, String>) -> Self {
        let category_name = names
            .get(&product.category_id)
            .cloned()
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        let stock_level = product.stock_level();
        Self {
            product,
            category_name,
            stock_level,
        }
    }
}

pub struct CatalogService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for CatalogService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> CatalogService<S>
where
    S: CatalogStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn list_categories(&self, sort: CategorySort) -> Result<Vec<Category>, ServiceError> {
        let mut categories = self.store.list_categories().await?;
        sort.sort(&mut categories);
        Ok(categories)
    }

    pub async fn get_category(&self, id: CategoryId) -> Result<Category, ServiceError> {
        self.store
            .get_category(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("category {id}")).into())
    }

    #[instrument(skip(self, draft), err)]
    pub async fn create_category(&self, draft: CategoryDraft) -> Result<Category, ServiceError> {
        let draft = draft.validate()?;
        let category = self.store.insert_category(&draft, Utc::now()).await?;
        info!(category_id = %category.id, "category created");
        Ok(category)
    }

    #[instrument(skip(self, draft), fields(category_id = %id), err)]
    pub async fn rename_category(
        &self,
        id: CategoryId,
        draft: CategoryDraft,
    ) -> Result<Category, ServiceError> {
        let draft = draft.validate()?;
        Ok(self.store.rename_category(id, &draft).await?)
    }

    #[instrument(skip(self), fields(category_id = %id), err)]
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), ServiceError> {
        self.store.delete_category(id).await?;
        info!("category deleted");
        Ok(())
    }

    async fn category_names(&self) -> Result<HashMap<CategoryId, String>, ServiceError> {
        Ok(self
            .store
            .list_categories()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect())
    }

    /// Filtered product list, newest first.
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<ProductView>, ServiceError> {
        let names = self.category_names().await?;
        let products = self.store.list_products().await?;
        Ok(filter
            .apply(products)
            .into_iter()
            .map(|p| ProductView::new(p, &names))
            .collect())
    }

    pub async fn get_product(&self, id: ProductId) -> Result<ProductView, ServiceError> {
        let product = self
            .store
            .get_product(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("product {id}")))?;
        let names = self.category_names().await?;
        Ok(ProductView::new(product, &names))
    }

    /// Product names by id, for labelling ledger rows.
    pub async fn product_names(&self) -> Result<HashMap<ProductId, String>, ServiceError> {
        Ok(self
            .store
            .list_products()
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect())
    }

    #[instrument(skip(self, draft), fields(category_id = %draft.category_id), err)]
    pub async fn create_product(&self, draft: ProductDraft) -> Result<ProductView, ServiceError> {
        let draft = draft.validate()?;
        let product = self.store.insert_product(&draft, Utc::now()).await?;
        info!(product_id = %product.id, quantity = product.quantity, "product created");
        let names = self.category_names().await?;
        Ok(ProductView::new(product, &names))
    }

    /// Direct edit. Overwrites the quantity baseline and bumps the version, so
    /// any ledger movement planned against the old version will retry.
    #[instrument(skip(self, draft), fields(product_id = %id), err)]
    pub async fn update_product(
        &self,
        id: ProductId,
        draft: ProductDraft,
    ) -> Result<ProductView, ServiceError> {
        let draft = draft.validate()?;
        let product = self.store.update_product(id, &draft, Utc::now()).await?;
        let names = self.category_names().await?;
        Ok(ProductView::new(product, &names))
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), ServiceError> {
        self.store.delete_product(id).await?;
        info!("product deleted");
        Ok(())
    }

    pub async fn summary(&self) -> Result<InventorySummary, ServiceError> {
        let categories = self.store.list_categories().await?;
        let products = self.store.list_products().await?;
        Ok(InventorySummary::compute(&products, &categories))
    }
}
