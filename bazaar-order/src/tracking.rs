use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::OrderStatus;

/// One entry in an order's delivery history. Append-only.
///
/// `sequence` is assigned by the store and breaks ties between events that
/// share a timestamp, so `(created_at, sequence)` is strictly increasing per
/// order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    pub id: Uuid,
    pub order_id: Uuid,
    pub sequence: i64,
    pub status: OrderStatus,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTrackingEvent {
    pub status: OrderStatus,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl NewTrackingEvent {
    pub fn new(status: OrderStatus, location: Option<String>, notes: Option<String>) -> Self {
        Self { status, location, notes }
    }

    /// Materialize the event. `after` is the timestamp of the previous event
    /// for the same order, if any; the new event never sorts before it.
    pub fn into_event(
        self,
        order_id: Uuid,
        sequence: i64,
        after: Option<DateTime<Utc>>,
    ) -> TrackingEvent {
        let now = Utc::now();
        let created_at = match after {
            Some(previous) if previous > now => previous,
            _ => now,
        };
        TrackingEvent {
            id: Uuid::new_v4(),
            order_id,
            sequence,
            status: self.status,
            location: self.location,
            notes: self.notes,
            created_at,
        }
    }
}
