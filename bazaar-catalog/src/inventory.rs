use bazaar_core::{fetch_existing, CoreError, CoreResult};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::product::{NewProduct, Product, ProductFilter, ProductUpdate, StockLevel};
use crate::repository::{ProductRepository, StockPolicy};

pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

#[derive(Debug, Clone, Copy)]
pub struct LedgerSettings {
    pub policy: StockPolicy,
    pub low_stock_threshold: i32,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            policy: StockPolicy::RejectNegative,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

/// Owns product quantities. Restock and consumption both funnel into one
/// atomic delta on the repository.
#[derive(Clone)]
pub struct StockLedger {
    repo: Arc<dyn ProductRepository>,
    settings: LedgerSettings,
}

impl StockLedger {
    pub fn new(repo: Arc<dyn ProductRepository>, settings: LedgerSettings) -> Self {
        Self { repo, settings }
    }

    pub fn settings(&self) -> LedgerSettings {
        self.settings
    }

    pub async fn register(&self, draft: NewProduct) -> CoreResult<Product> {
        draft.validate()?;
        let product = self.repo.insert(draft).await?;
        info!(product_id = %product.id, retailer_id = %product.retailer_id, quantity = product.quantity, "product registered");
        Ok(product)
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<Product> {
        fetch_existing(self.repo.as_ref(), id).await
    }

    pub async fn list(&self, filter: &ProductFilter) -> CoreResult<Vec<Product>> {
        Ok(self.repo.list(filter).await?)
    }

    pub async fn update(&self, id: Uuid, changes: &ProductUpdate) -> CoreResult<Product> {
        changes.validate()?;
        self.repo
            .update(id, changes)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", id))
    }

    pub async fn remove(&self, id: Uuid) -> CoreResult<()> {
        if !self.repo.delete(id).await? {
            return Err(CoreError::not_found("Product", id));
        }
        info!(product_id = %id, "product deleted");
        Ok(())
    }

    /// Restock by a strictly positive quantity.
    pub async fn add_stock(&self, id: Uuid, quantity: i32) -> CoreResult<Product> {
        require_positive(quantity)?;
        self.adjust_quantity(id, quantity).await
    }

    /// Consume a strictly positive quantity.
    pub async fn deduct_stock(&self, id: Uuid, quantity: i32) -> CoreResult<Product> {
        require_positive(quantity)?;
        self.adjust_quantity(id, -quantity).await
    }

    /// Apply a signed, non-zero delta atomically.
    ///
    /// With the default `RejectNegative` policy a deduction that would leave
    /// the quantity below zero fails with `InsufficientStock` and changes
    /// nothing. Restocks always apply.
    pub async fn adjust_quantity(&self, id: Uuid, delta: i32) -> CoreResult<Product> {
        if delta == 0 {
            return Err(CoreError::invalid_input("delta must be non-zero"));
        }

        match self.repo.adjust_quantity(id, delta, self.settings.policy).await {
            Ok(product) => {
                info!(product_id = %id, delta, quantity = product.quantity, "stock adjusted");
                Ok(product)
            }
            Err(err) => {
                warn!(product_id = %id, delta, error = %err, "stock adjustment rejected");
                Err(err.into())
            }
        }
    }

    pub async fn stock_level(&self, id: Uuid) -> CoreResult<StockLevel> {
        let snapshot = self
            .repo
            .stock_snapshot(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", id))?;
        Ok(StockLevel::from_snapshot(snapshot, self.settings.low_stock_threshold))
    }
}

fn require_positive(quantity: i32) -> CoreResult<()> {
    if quantity <= 0 {
        return Err(CoreError::invalid_input("quantity must be a positive integer"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryProductRepository;
    use rust_decimal::Decimal;

    fn ledger_with(policy: StockPolicy) -> StockLedger {
        StockLedger::new(
            Arc::new(InMemoryProductRepository::new()),
            LedgerSettings {
                policy,
                ..LedgerSettings::default()
            },
        )
    }

    async fn seed(ledger: &StockLedger, quantity: i32) -> Product {
        ledger
            .register(NewProduct {
                retailer_id: Uuid::new_v4(),
                supplier_id: None,
                name: "Masala Chai 250g".to_string(),
                description: None,
                category: Some("beverages".to_string()),
                price: Decimal::new(18000, 2),
                quantity,
                unit: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_and_deduct() {
        let ledger = ledger_with(StockPolicy::RejectNegative);
        let product = seed(&ledger, 20).await;

        let after_add = ledger.add_stock(product.id, 5).await.unwrap();
        assert_eq!(after_add.quantity, 25);

        let after_deduct = ledger.deduct_stock(product.id, 7).await.unwrap();
        assert_eq!(after_deduct.quantity, 18);

        let level = ledger.stock_level(product.id).await.unwrap();
        assert_eq!(level.current_stock, 18);
        assert_eq!(level.product_name, "Masala Chai 250g");
        assert!(!level.is_low_stock);
    }

    #[tokio::test]
    async fn test_non_positive_quantities_are_rejected() {
        let ledger = ledger_with(StockPolicy::RejectNegative);
        // No product exists: validation must fail before storage is consulted.
        let missing = Uuid::new_v4();

        for quantity in [0, -3] {
            let err = ledger.deduct_stock(missing, quantity).await.unwrap_err();
            assert!(matches!(err, CoreError::InvalidInput(_)));
            let err = ledger.add_stock(missing, quantity).await.unwrap_err();
            assert!(matches!(err, CoreError::InvalidInput(_)));
        }

        let err = ledger.adjust_quantity(missing, 0).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let ledger = ledger_with(StockPolicy::RejectNegative);
        let missing = Uuid::new_v4();

        assert!(matches!(ledger.stock_level(missing).await, Err(CoreError::NotFound(_))));
        assert!(matches!(ledger.add_stock(missing, 1).await, Err(CoreError::NotFound(_))));
        assert!(matches!(ledger.remove(missing).await, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_overdraw_is_rejected_by_default() {
        let ledger = ledger_with(StockPolicy::RejectNegative);
        let product = seed(&ledger, 3).await;

        let err = ledger.deduct_stock(product.id, 4).await.unwrap_err();
        match err {
            CoreError::InsufficientStock { requested, available, .. } => {
                assert_eq!(requested, 4);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(ledger.get(product.id).await.unwrap().quantity, 3);

        // Draining to exactly zero is fine.
        assert_eq!(ledger.deduct_stock(product.id, 3).await.unwrap().quantity, 0);
    }

    #[tokio::test]
    async fn test_permissive_policy_allows_negative_stock() {
        let ledger = ledger_with(StockPolicy::AllowNegative);
        let product = seed(&ledger, 1).await;

        let updated = ledger.deduct_stock(product.id, 4).await.unwrap();
        assert_eq!(updated.quantity, -3);
    }

    #[tokio::test]
    async fn test_restock_recovers_negative_stock() {
        let repo: Arc<dyn ProductRepository> = Arc::new(InMemoryProductRepository::new());
        let permissive = StockLedger::new(
            repo.clone(),
            LedgerSettings { policy: StockPolicy::AllowNegative, ..LedgerSettings::default() },
        );
        let strict = StockLedger::new(repo, LedgerSettings::default());

        let product = seed(&permissive, 0).await;
        assert_eq!(permissive.deduct_stock(product.id, 5).await.unwrap().quantity, -5);

        assert_eq!(strict.add_stock(product.id, 2).await.unwrap().quantity, -3);
        let err = strict.deduct_stock(product.id, 1).await.unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { requested: 1, available: -3, .. }));
    }

    #[tokio::test]
    async fn test_quantity_overflow_is_invalid_input() {
        let ledger = ledger_with(StockPolicy::RejectNegative);
        let product = seed(&ledger, i32::MAX - 1).await;

        let err = ledger.add_stock(product.id, 2).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
        assert_eq!(ledger.get(product.id).await.unwrap().quantity, i32::MAX - 1);
    }

    #[tokio::test]
    async fn test_concurrent_deltas_are_not_lost() {
        let ledger = ledger_with(StockPolicy::AllowNegative);
        let product = seed(&ledger, 100).await;

        let deltas: Vec<i32> = (1..=64).map(|i| if i % 3 == 0 { -i } else { i }).collect();
        let expected = 100 + deltas.iter().sum::<i32>();

        let mut handles = Vec::new();
        for delta in deltas {
            let ledger = ledger.clone();
            let id = product.id;
            handles.push(tokio::spawn(async move {
                ledger.adjust_quantity(id, delta).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(ledger.stock_level(product.id).await.unwrap().current_stock, expected);
    }

    #[tokio::test]
    async fn test_update_and_remove() {
        let ledger = ledger_with(StockPolicy::RejectNegative);
        let product = seed(&ledger, 5).await;

        let changes = ProductUpdate {
            price: Some(Decimal::new(19900, 2)),
            ..ProductUpdate::default()
        };
        let updated = ledger.update(product.id, &changes).await.unwrap();
        assert_eq!(updated.price, Decimal::new(19900, 2));
        assert_eq!(updated.quantity, 5);

        ledger.remove(product.id).await.unwrap();
        assert!(matches!(ledger.get(product.id).await, Err(CoreError::NotFound(_))));
    }
}
