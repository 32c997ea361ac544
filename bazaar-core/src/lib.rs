pub mod repository;

pub use repository::{fetch_existing, Entity, Repository, StoreError, StoreResult};

use uuid::Uuid;

/// Failure taxonomy shared by every operation in the ledger, order and credit
/// components. The HTTP boundary maps each variant onto a status code.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    InvalidInput(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Order is already {0} and cannot change status")]
    TerminalState(String),

    #[error("Conflicting update: {0}")]
    Conflict(String),

    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        requested: i32,
        available: i32,
    },

    #[error("Storage failure: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CoreError {
    pub fn not_found(entity: &str, id: Uuid) -> Self {
        CoreError::NotFound(format!("{} not found: {}", entity, id))
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        CoreError::InvalidInput(msg.into())
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => CoreError::not_found(entity, id),
            StoreError::Conflict { entity, id } => {
                CoreError::Conflict(format!("{} {} was modified concurrently", entity, id))
            }
            StoreError::InsufficientStock {
                product_id,
                requested,
                available,
            } => CoreError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            StoreError::QuantityOverflow { .. } => CoreError::InvalidInput(err.to_string()),
            StoreError::InvalidData(_) => CoreError::Storage(Box::new(err)),
            StoreError::Backend(source) => CoreError::Storage(source),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_keep_their_category() {
        let id = Uuid::new_v4();

        let err: CoreError = StoreError::NotFound { entity: "Product", id }.into();
        assert!(matches!(err, CoreError::NotFound(ref m) if m == &format!("Product not found: {}", id)));

        let err: CoreError = StoreError::Conflict { entity: "Order", id }.into();
        assert!(matches!(err, CoreError::Conflict(_)));

        let err: CoreError = StoreError::QuantityOverflow { product_id: id }.into();
        assert!(matches!(err, CoreError::InvalidInput(_)));

        let err: CoreError = StoreError::InvalidData("unknown order status: lost".into()).into();
        assert!(matches!(err, CoreError::Storage(_)));

        let err: CoreError = StoreError::Backend("connection reset".into()).into();
        assert!(matches!(err, CoreError::Storage(_)));
        assert_eq!(err.to_string(), "Storage failure: connection reset");
    }
}
