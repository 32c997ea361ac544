use async_trait::async_trait;
use bazaar_core::{Repository, StoreError, StoreResult};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::product::{NewProduct, Product, ProductFilter, ProductUpdate, StockSnapshot};
use crate::repository::{ProductRepository, StockPolicy};

/// In-process product store. Every delta runs under the write lock, so the
/// read-modify-write is atomic with respect to other callers.
#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<Uuid, Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository<Product> for InMemoryProductRepository {
    async fn insert(&self, draft: NewProduct) -> StoreResult<Product> {
        let product = Product::from_draft(draft);
        self.products.write().await.insert(product.id, product.clone());
        Ok(product)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>> {
        let mut products: Vec<Product> = self
            .products
            .read()
            .await
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn update(&self, id: Uuid, changes: &ProductUpdate) -> StoreResult<Option<Product>> {
        let mut products = self.products.write().await;
        Ok(products.get_mut(&id).map(|product| {
            product.apply(changes);
            product.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.products.write().await.remove(&id).is_some())
    }

    async fn adjust_quantity(
        &self,
        id: Uuid,
        delta: i32,
        policy: StockPolicy,
    ) -> StoreResult<Product> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "Product", id })?;

        if !policy.permits(product.quantity, delta) {
            return Err(StoreError::InsufficientStock {
                product_id: id,
                requested: delta.saturating_neg(),
                available: product.quantity,
            });
        }

        product.quantity = product
            .quantity
            .checked_add(delta)
            .ok_or(StoreError::QuantityOverflow { product_id: id })?;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn stock_snapshot(&self, id: Uuid) -> StoreResult<Option<StockSnapshot>> {
        Ok(self.products.read().await.get(&id).map(|p| StockSnapshot {
            id: p.id,
            name: p.name.clone(),
            quantity: p.quantity,
        }))
    }
}
