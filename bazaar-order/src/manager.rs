use bazaar_core::{fetch_existing, CoreResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{NewOrder, Order, OrderDraft};
use crate::repository::OrderRepository;
use crate::status::OrderStatus;
use crate::tracking::{NewTrackingEvent, TrackingEvent};

pub const CANCELLATION_NOTE: &str = "Order cancelled by user";

/// Result of an accepted status transition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub order: Order,
    pub tracking_event: TrackingEvent,
}

/// Manages order lifecycle and state transitions.
#[derive(Clone)]
pub struct OrderManager {
    repo: Arc<dyn OrderRepository>,
}

impl OrderManager {
    pub fn new(repo: Arc<dyn OrderRepository>) -> Self {
        Self { repo }
    }

    /// Create an order in `pending` with its items. Stock is not touched;
    /// callers adjust the ledger explicitly.
    pub async fn place(&self, request: NewOrder) -> CoreResult<Order> {
        let draft = OrderDraft::try_from(request)?;
        let order = self.repo.insert(draft).await?;
        info!(
            order_id = %order.id,
            retailer_id = %order.retailer_id,
            items = order.items.len(),
            total = %order.total_amount,
            "order placed"
        );
        Ok(order)
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<Order> {
        fetch_existing(self.repo.as_ref(), id).await
    }

    pub async fn list_for_retailer(&self, retailer_id: Uuid) -> CoreResult<Vec<Order>> {
        Ok(self.repo.list_by_retailer(retailer_id).await?)
    }

    /// Validate the edge against the transition table, then persist it as a
    /// conditional write together with its tracking event.
    ///
    /// A concurrent transition that lands between the read and the write
    /// surfaces as `CoreError::Conflict`.
    pub async fn update_status(
        &self,
        id: Uuid,
        new_status: OrderStatus,
        location: Option<String>,
        notes: Option<String>,
    ) -> CoreResult<StatusChange> {
        let current = self.get(id).await?;
        if let Err(err) = current.status.validate_transition(new_status) {
            warn!(order_id = %id, from = %current.status, to = %new_status, "transition refused");
            return Err(err.into());
        }

        let event = NewTrackingEvent::new(new_status, location, notes);
        let (order, tracking_event) = self.repo.transition(id, current.status, event).await?;

        info!(
            order_id = %id,
            from = %current.status,
            to = %order.status,
            sequence = tracking_event.sequence,
            "order status updated"
        );
        Ok(StatusChange { order, tracking_event })
    }

    pub async fn cancel(&self, id: Uuid) -> CoreResult<StatusChange> {
        self.update_status(id, OrderStatus::Cancelled, None, Some(CANCELLATION_NOTE.to_string()))
            .await
    }

    /// Full tracking history, oldest first.
    pub async fn tracking(&self, id: Uuid) -> CoreResult<Vec<TrackingEvent>> {
        self.get(id).await?;
        Ok(self.repo.tracking_events(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryOrderRepository;
    use crate::models::NewOrderItem;
    use bazaar_core::{CoreError, StoreError};
    use rust_decimal::Decimal;

    fn manager() -> (OrderManager, Arc<InMemoryOrderRepository>) {
        let repo = Arc::new(InMemoryOrderRepository::new());
        (OrderManager::new(repo.clone()), repo)
    }

    fn new_order(retailer_id: Uuid) -> NewOrder {
        NewOrder {
            retailer_id,
            customer_name: "Ravi Kumar".to_string(),
            customer_phone: None,
            shipping_address: "4 Park Street, Kolkata".to_string(),
            total_amount: None,
            estimated_delivery: None,
            items: vec![NewOrderItem {
                product_id: Uuid::new_v4(),
                quantity: 3,
                unit_price: Decimal::new(120, 0),
            }],
        }
    }

    #[tokio::test]
    async fn test_order_lifecycle() {
        let (manager, _) = manager();
        let order = manager.place(new_order(Uuid::new_v4())).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, Decimal::new(360, 0));

        // Pending → Confirmed → Shipped → Delivered
        manager.update_status(order.id, OrderStatus::Confirmed, None, None).await.unwrap();
        manager
            .update_status(order.id, OrderStatus::Shipped, Some("Howrah depot".into()), None)
            .await
            .unwrap();
        let change = manager
            .update_status(order.id, OrderStatus::Delivered, None, Some("Left with guard".into()))
            .await
            .unwrap();
        assert_eq!(change.order.status, OrderStatus::Delivered);
        assert_eq!(change.tracking_event.notes.as_deref(), Some("Left with guard"));

        let history = manager.tracking(order.id).await.unwrap();
        let statuses: Vec<OrderStatus> = history.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![OrderStatus::Confirmed, OrderStatus::Shipped, OrderStatus::Delivered]
        );
        assert_eq!(history[1].location.as_deref(), Some("Howrah depot"));
        assert!(history.windows(2).all(|w| w[0].created_at <= w[1].created_at
            && w[0].sequence < w[1].sequence));

        let err = manager.cancel(order.id).await.unwrap_err();
        assert!(matches!(err, CoreError::TerminalState(ref s) if s == "delivered"));
    }

    #[tokio::test]
    async fn test_invalid_transition() {
        let (manager, _) = manager();
        let order = manager.place(new_order(Uuid::new_v4())).await.unwrap();

        // Cannot go directly from Pending to Shipped
        let err = manager
            .update_status(order.id, OrderStatus::Shipped, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
        assert!(manager.tracking(order.id).await.unwrap().is_empty());
        assert_eq!(manager.get(order.id).await.unwrap().status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_cancel_writes_fixed_note() {
        let (manager, _) = manager();
        let order = manager.place(new_order(Uuid::new_v4())).await.unwrap();
        manager.update_status(order.id, OrderStatus::Confirmed, None, None).await.unwrap();

        let change = manager.cancel(order.id).await.unwrap();
        assert_eq!(change.order.status, OrderStatus::Cancelled);
        assert_eq!(change.tracking_event.notes.as_deref(), Some(CANCELLATION_NOTE));

        let err = manager
            .update_status(order.id, OrderStatus::Confirmed, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::TerminalState(_)));
        assert_eq!(manager.tracking(order.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let (manager, _) = manager();
        let missing = Uuid::new_v4();
        assert!(matches!(manager.get(missing).await, Err(CoreError::NotFound(_))));
        assert!(matches!(manager.cancel(missing).await, Err(CoreError::NotFound(_))));
        assert!(matches!(manager.tracking(missing).await, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_stale_expected_status_conflicts() {
        let (manager, repo) = manager();
        let order = manager.place(new_order(Uuid::new_v4())).await.unwrap();

        repo.transition(
            order.id,
            OrderStatus::Pending,
            NewTrackingEvent::new(OrderStatus::Confirmed, None, None),
        )
        .await
        .unwrap();

        let err = repo
            .transition(
                order.id,
                OrderStatus::Pending,
                NewTrackingEvent::new(OrderStatus::Cancelled, None, None),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(repo.tracking_events(order.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_confirmations_accept_exactly_one() {
        let (manager, _) = manager();
        let order = manager.place(new_order(Uuid::new_v4())).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let manager = manager.clone();
            let id = order.id;
            handles.push(tokio::spawn(async move {
                manager.update_status(id, OrderStatus::Confirmed, None, None).await
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(CoreError::Conflict(_)) | Err(CoreError::InvalidTransition { .. }) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(manager.tracking(order.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_for_retailer() {
        let (manager, _) = manager();
        let retailer = Uuid::new_v4();
        manager.place(new_order(retailer)).await.unwrap();
        manager.place(new_order(retailer)).await.unwrap();
        manager.place(new_order(Uuid::new_v4())).await.unwrap();

        let orders = manager.list_for_retailer(retailer).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders[0].created_at >= orders[1].created_at);
    }
}
