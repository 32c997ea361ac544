use async_trait::async_trait;
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// Persistence-side failures. Backends translate their driver errors into
/// `Backend`; the remaining variants are raised by conditional writes.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("{entity} {id} was modified concurrently")]
    Conflict { entity: &'static str, id: Uuid },

    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        requested: i32,
        available: i32,
    },

    #[error("Quantity overflow for product {product_id}")]
    QuantityOverflow { product_id: Uuid },

    /// A stored value that no longer parses into its domain type.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Database error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A stored record type. `Draft` is what callers hand to `insert`; the
/// backend assigns identity and timestamps.
pub trait Entity: Clone + Send + Sync + 'static {
    const NAME: &'static str;
    type Draft: Send + Sync;
}

/// Generic storage access shared by every component. Domain repositories
/// extend this with their own conditional writes.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    async fn insert(&self, draft: E::Draft) -> StoreResult<E>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<E>>;
}

/// Load an entity or fail with `CoreError::NotFound`.
pub async fn fetch_existing<E, R>(repo: &R, id: Uuid) -> CoreResult<E>
where
    E: Entity,
    R: Repository<E> + ?Sized,
{
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| CoreError::not_found(E::NAME, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    struct Widget {
        id: Uuid,
        label: String,
    }

    impl Entity for Widget {
        const NAME: &'static str = "Widget";
        type Draft = String;
    }

    #[derive(Default)]
    struct Widgets(Mutex<HashMap<Uuid, Widget>>);

    #[async_trait]
    impl Repository<Widget> for Widgets {
        async fn insert(&self, label: String) -> StoreResult<Widget> {
            let widget = Widget { id: Uuid::new_v4(), label };
            self.0.lock().unwrap().insert(widget.id, widget.clone());
            Ok(widget)
        }

        async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Widget>> {
            Ok(self.0.lock().unwrap().get(&id).cloned())
        }
    }

    #[tokio::test]
    async fn test_fetch_existing() {
        let repo = Widgets::default();
        let widget = repo.insert("bolt".to_string()).await.unwrap();

        let found = fetch_existing(&repo, widget.id).await.unwrap();
        assert_eq!(found, widget);

        let missing = Uuid::new_v4();
        let err = fetch_existing::<Widget, _>(&repo, missing).await.unwrap_err();
        assert_eq!(err.to_string(), format!("Widget not found: {}", missing));
    }
}
