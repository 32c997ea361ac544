use async_trait::async_trait;
use bazaar_core::{Repository, StoreResult};
use serde::Deserialize;
use uuid::Uuid;

use crate::product::{Product, ProductFilter, ProductUpdate, StockSnapshot};

/// What the ledger does with a deduction that would take quantity below zero.
/// Restocks are always applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockPolicy {
    /// Fail with `InsufficientStock` and leave the quantity untouched.
    RejectNegative,
    /// Apply the delta anyway.
    AllowNegative,
}

impl StockPolicy {
    pub fn permits(self, current: i32, delta: i32) -> bool {
        match self {
            StockPolicy::AllowNegative => true,
            StockPolicy::RejectNegative => {
                delta > 0 || i64::from(current) + i64::from(delta) >= 0
            }
        }
    }
}

/// Ledger store access for product records.
#[async_trait]
pub trait ProductRepository: Repository<Product> {
    /// Newest first.
    async fn list(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>>;

    async fn update(&self, id: Uuid, changes: &ProductUpdate) -> StoreResult<Option<Product>>;

    /// Hard delete. Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;

    /// Apply `quantity := quantity + delta` as one atomic read-modify-write.
    ///
    /// Fails with `StoreError::NotFound` when the product is absent, with
    /// `StoreError::InsufficientStock` when `policy` refuses the result and
    /// with `StoreError::QuantityOverflow` when the sum leaves `i32`.
    async fn adjust_quantity(&self, id: Uuid, delta: i32, policy: StockPolicy)
        -> StoreResult<Product>;

    async fn stock_snapshot(&self, id: Uuid) -> StoreResult<Option<StockSnapshot>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_permits() {
        assert!(StockPolicy::RejectNegative.permits(5, -5));
        assert!(!StockPolicy::RejectNegative.permits(5, -6));
        assert!(StockPolicy::AllowNegative.permits(0, -6));
        assert!(StockPolicy::RejectNegative.permits(i32::MIN + 1, i32::MAX));
    }

    #[test]
    fn test_restock_allowed_below_zero() {
        assert!(StockPolicy::RejectNegative.permits(-5, 2));
        assert!(!StockPolicy::RejectNegative.permits(-5, -1));
        assert!(!StockPolicy::RejectNegative.permits(-5, 0));
    }
}
