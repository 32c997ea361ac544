use async_trait::async_trait;
use bazaar_core::{Repository, StoreError, StoreResult};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Order, OrderDraft};
use crate::repository::OrderRepository;
use crate::status::OrderStatus;
use crate::tracking::{NewTrackingEvent, TrackingEvent};

#[derive(Default)]
struct Tables {
    orders: HashMap<Uuid, Order>,
    tracking: HashMap<Uuid, Vec<TrackingEvent>>,
    next_sequence: i64,
}

/// In-process order store. Orders and their tracking log sit behind one lock
/// so a transition and its event land together.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    tables: RwLock<Tables>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository<Order> for InMemoryOrderRepository {
    async fn insert(&self, draft: OrderDraft) -> StoreResult<Order> {
        let order = Order::from_draft(draft);
        self.tables.write().await.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Order>> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn list_by_retailer(&self, retailer_id: Uuid) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .tables
            .read()
            .await
            .orders
            .values()
            .filter(|o| o.retailer_id == retailer_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn transition(
        &self,
        id: Uuid,
        expected: OrderStatus,
        event: NewTrackingEvent,
    ) -> StoreResult<(Order, TrackingEvent)> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;

        let order = tables
            .orders
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "Order", id })?;
        if order.status != expected {
            return Err(StoreError::Conflict { entity: "Order", id });
        }
        order.update_status(event.status);
        let order = order.clone();

        tables.next_sequence += 1;
        let log = tables.tracking.entry(id).or_default();
        let previous = log.last().map(|e| e.created_at);
        let event = event.into_event(id, tables.next_sequence, previous);
        log.push(event.clone());

        Ok((order, event))
    }

    async fn tracking_events(&self, order_id: Uuid) -> StoreResult<Vec<TrackingEvent>> {
        Ok(self
            .tables
            .read()
            .await
            .tracking
            .get(&order_id)
            .cloned()
            .unwrap_or_default())
    }
}
