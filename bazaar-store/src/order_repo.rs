use async_trait::async_trait;
use bazaar_core::{Repository, StoreError, StoreResult};
use bazaar_order::{
    NewTrackingEvent, Order, OrderDraft, OrderItem, OrderRepository, OrderStatus, TrackingEvent,
};
use bazaar_shared::Masked;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::backend;

const ORDER_COLUMNS: &str = "id, retailer_id, customer_name, customer_phone, shipping_address, total_amount, status, estimated_delivery, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, unit_price, line_total, created_at";

pub struct StoreOrderRepository {
    pool: PgPool,
}

impl StoreOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    retailer_id: Uuid,
    customer_name: String,
    customer_phone: Option<String>,
    shipping_address: String,
    total_amount: Decimal,
    status: String,
    estimated_delivery: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> StoreResult<Order> {
        Ok(Order {
            id: self.id,
            retailer_id: self.retailer_id,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone.map(Masked),
            shipping_address: self.shipping_address,
            total_amount: self.total_amount,
            status: parse_status(&self.status)?,
            estimated_delivery: self.estimated_delivery,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    line_total: Decimal,
    created_at: DateTime<Utc>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            line_total: row.line_total,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TrackingRow {
    id: Uuid,
    order_id: Uuid,
    seq: i64,
    status: String,
    location: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TrackingRow> for TrackingEvent {
    type Error = StoreError;

    fn try_from(row: TrackingRow) -> StoreResult<Self> {
        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            sequence: row.seq,
            status: parse_status(&row.status)?,
            location: row.location,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

fn parse_status(raw: &str) -> StoreResult<OrderStatus> {
    raw.parse()
        .map_err(|_| StoreError::InvalidData(format!("unknown order status in storage: {}", raw)))
}

async fn load_items(conn: &mut PgConnection, order_id: Uuid) -> StoreResult<Vec<OrderItem>> {
    let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
        "SELECT {} FROM order_items WHERE order_id = $1 ORDER BY line_number",
        ITEM_COLUMNS
    ))
    .bind(order_id)
    .fetch_all(conn)
    .await
    .map_err(backend)?;

    Ok(rows.into_iter().map(OrderItem::from).collect())
}

#[async_trait]
impl Repository<Order> for StoreOrderRepository {
    /// Order and items are written in one transaction.
    async fn insert(&self, draft: OrderDraft) -> StoreResult<Order> {
        let order = Order::from_draft(draft);
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, retailer_id, customer_name, customer_phone, shipping_address, total_amount, status, estimated_delivery, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(order.id)
        .bind(order.retailer_id)
        .bind(&order.customer_name)
        .bind(order.customer_phone.as_ref().map(|p| p.inner().as_str()))
        .bind(&order.shipping_address)
        .bind(order.total_amount)
        .bind(order.status.as_str())
        .bind(order.estimated_delivery)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        for (line_number, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, line_number, product_id, quantity, unit_price, line_total, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(item.id)
            .bind(order.id)
            .bind(line_number as i32)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.line_total)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        }

        tx.commit().await.map_err(backend)?;
        Ok(order)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Order>> {
        let mut conn = self.pool.acquire().await.map_err(backend)?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(backend)?;

        match row {
            Some(row) => {
                let items = load_items(&mut conn, id).await?;
                Ok(Some(row.into_order(items)?))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl OrderRepository for StoreOrderRepository {
    async fn list_by_retailer(&self, retailer_id: Uuid) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE retailer_id = $1 ORDER BY created_at DESC",
            ORDER_COLUMNS
        ))
        .bind(retailer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            "SELECT {} FROM order_items WHERE order_id = ANY($1) ORDER BY order_id, line_number",
            ITEM_COLUMNS
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        let mut items_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for item in item_rows {
            items_by_order.entry(item.order_id).or_default().push(item.into());
        }

        rows.into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect()
    }

    /// The conditional UPDATE takes the row lock, so a concurrent transition
    /// re-evaluates `status = expected` after this one commits and matches
    /// nothing. The tracking insert happens under the same lock, which keeps
    /// `clock_timestamp()` monotonic per order.
    async fn transition(
        &self,
        id: Uuid,
        expected: OrderStatus,
        event: NewTrackingEvent,
    ) -> StoreResult<(Order, TrackingEvent)> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE orders SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(id)
        .bind(expected.as_str())
        .bind(event.status.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?;

        let Some(row) = row else {
            let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM orders WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(backend)?;
            return Err(match exists {
                Some(_) => StoreError::Conflict { entity: "Order", id },
                None => StoreError::NotFound { entity: "Order", id },
            });
        };

        let tracking = sqlx::query_as::<_, TrackingRow>(
            r#"
            INSERT INTO delivery_tracking (id, order_id, status, location, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, clock_timestamp())
            RETURNING id, order_id, seq, status, location, notes, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(event.status.as_str())
        .bind(&event.location)
        .bind(&event.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(backend)?;

        let items = load_items(&mut tx, id).await?;
        tx.commit().await.map_err(backend)?;

        Ok((row.into_order(items)?, tracking.try_into()?))
    }

    async fn tracking_events(&self, order_id: Uuid) -> StoreResult<Vec<TrackingEvent>> {
        let rows = sqlx::query_as::<_, TrackingRow>(
            r#"
            SELECT id, order_id, seq, status, location, notes, created_at
            FROM delivery_tracking
            WHERE order_id = $1
            ORDER BY created_at, seq
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(TrackingEvent::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_status_is_invalid_data() {
        assert_eq!(parse_status("shipped").unwrap(), OrderStatus::Shipped);
        assert!(matches!(parse_status("lost"), Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn test_tracking_row_conversion() {
        let row = TrackingRow {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            seq: 7,
            status: "confirmed".to_string(),
            location: Some("Nagpur".to_string()),
            notes: None,
            created_at: Utc::now(),
        };
        let event = TrackingEvent::try_from(row).unwrap();
        assert_eq!(event.sequence, 7);
        assert_eq!(event.status, OrderStatus::Confirmed);
    }
}
