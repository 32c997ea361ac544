use async_trait::async_trait;
use bazaar_core::{Repository, StoreResult};
use uuid::Uuid;

use crate::models::Order;
use crate::status::OrderStatus;
use crate::tracking::{NewTrackingEvent, TrackingEvent};

/// Order storage plus its tracking log.
#[async_trait]
pub trait OrderRepository: Repository<Order> {
    /// Newest first.
    async fn list_by_retailer(&self, retailer_id: Uuid) -> StoreResult<Vec<Order>>;

    /// Compare-and-swap the status from `expected` to `event.status` and
    /// append `event` to the tracking log, both or neither.
    ///
    /// Fails with `StoreError::NotFound` for an unknown order and with
    /// `StoreError::Conflict` when the stored status is no longer `expected`.
    async fn transition(
        &self,
        id: Uuid,
        expected: OrderStatus,
        event: NewTrackingEvent,
    ) -> StoreResult<(Order, TrackingEvent)>;

    /// Oldest first.
    async fn tracking_events(&self, order_id: Uuid) -> StoreResult<Vec<TrackingEvent>>;
}
