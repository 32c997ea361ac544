use bazaar_core::{CoreError, CoreResult, Entity};
use bazaar_shared::Masked;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::OrderStatus;

/// A retailer's delivery order. Never deleted; cancellation is a status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub retailer_id: Uuid,
    pub customer_name: String,
    pub customer_phone: Option<Masked<String>>,
    pub shipping_address: String,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Order {
    const NAME: &'static str = "Order";
    type Draft = OrderDraft;
}

impl Order {
    /// Assign identity and timestamps to a validated draft. Every order starts
    /// out `pending`.
    pub fn from_draft(draft: OrderDraft) -> Self {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let items = draft
            .items
            .into_iter()
            .map(|item| OrderItem {
                id: Uuid::new_v4(),
                order_id: id,
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
                line_total: item.line_total,
                created_at: now,
            })
            .collect();

        Self {
            id,
            retailer_id: draft.retailer_id,
            customer_name: draft.customer_name,
            customer_phone: draft.customer_phone,
            shipping_address: draft.shipping_address,
            total_amount: draft.total_amount,
            status: OrderStatus::Pending,
            estimated_delivery: draft.estimated_delivery,
            items,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update_status(&mut self, new_status: OrderStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }
}

/// An individual product line within an order. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Order placement payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub retailer_id: Uuid,
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: Option<Masked<String>>,
    pub shipping_address: String,
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl NewOrderItem {
    /// `None` when the product does not fit in a `Decimal`.
    pub fn line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Largest amount the `NUMERIC(12, 2)` money columns hold.
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

/// An item whose line total has been settled.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// A placement that has passed validation and has a settled total.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub retailer_id: Uuid,
    pub customer_name: String,
    pub customer_phone: Option<Masked<String>>,
    pub shipping_address: String,
    pub total_amount: Decimal,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub items: Vec<DraftItem>,
}

fn price_item(item: NewOrderItem) -> CoreResult<DraftItem> {
    if item.quantity <= 0 {
        return Err(CoreError::invalid_input(format!(
            "item quantity for product {} must be positive",
            item.product_id
        )));
    }
    if item.unit_price.is_sign_negative() {
        return Err(CoreError::invalid_input(format!(
            "item price for product {} must not be negative",
            item.product_id
        )));
    }
    if item.unit_price > max_amount() {
        return Err(CoreError::invalid_input(format!(
            "item price for product {} exceeds {}",
            item.product_id,
            max_amount()
        )));
    }

    let line_total = item
        .line_total()
        .filter(|total| *total <= max_amount())
        .ok_or_else(|| {
            CoreError::invalid_input(format!(
                "line total for product {} exceeds {}",
                item.product_id,
                max_amount()
            ))
        })?;

    Ok(DraftItem {
        product_id: item.product_id,
        quantity: item.quantity,
        unit_price: item.unit_price,
        line_total,
    })
}

impl TryFrom<NewOrder> for OrderDraft {
    type Error = CoreError;

    /// With items, the total is the sum of line totals and a supplied total
    /// must agree with it. Without items, the supplied total is taken as is.
    fn try_from(req: NewOrder) -> CoreResult<Self> {
        if req.customer_name.trim().is_empty() {
            return Err(CoreError::invalid_input("customerName is required"));
        }
        if req.shipping_address.trim().is_empty() {
            return Err(CoreError::invalid_input("shippingAddress is required"));
        }

        let items = req
            .items
            .into_iter()
            .map(price_item)
            .collect::<CoreResult<Vec<_>>>()?;

        let total_amount = if items.is_empty() {
            req.total_amount.unwrap_or(Decimal::ZERO)
        } else {
            let computed = items
                .iter()
                .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.line_total))
                .filter(|total| *total <= max_amount())
                .ok_or_else(|| {
                    CoreError::invalid_input(format!("order total exceeds {}", max_amount()))
                })?;
            match req.total_amount {
                Some(supplied) if supplied != computed => {
                    return Err(CoreError::invalid_input(format!(
                        "totalAmount {} does not match item total {}",
                        supplied, computed
                    )));
                }
                _ => computed,
            }
        };
        if total_amount.is_sign_negative() {
            return Err(CoreError::invalid_input("totalAmount must not be negative"));
        }
        if total_amount > max_amount() {
            return Err(CoreError::invalid_input(format!(
                "totalAmount exceeds {}",
                max_amount()
            )));
        }

        Ok(Self {
            retailer_id: req.retailer_id,
            customer_name: req.customer_name,
            customer_phone: req.customer_phone,
            shipping_address: req.shipping_address,
            total_amount,
            estimated_delivery: req.estimated_delivery,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(items: Vec<NewOrderItem>, total_amount: Option<Decimal>) -> NewOrder {
        NewOrder {
            retailer_id: Uuid::new_v4(),
            customer_name: "Asha Verma".to_string(),
            customer_phone: Some(Masked("9876543210".to_string())),
            shipping_address: "12 MG Road, Bengaluru".to_string(),
            total_amount,
            estimated_delivery: None,
            items,
        }
    }

    fn item(quantity: i32, paise: i64) -> NewOrderItem {
        NewOrderItem {
            product_id: Uuid::new_v4(),
            quantity,
            unit_price: Decimal::new(paise, 2),
        }
    }

    #[test]
    fn test_total_is_derived_from_items() {
        let draft = OrderDraft::try_from(request(vec![item(2, 4500), item(1, 1000)], None)).unwrap();
        assert_eq!(draft.total_amount, Decimal::new(10000, 2));

        let order = Order::from_draft(draft);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 2);
        assert!(order.items.iter().all(|i| i.order_id == order.id));
        assert_eq!(order.items[0].line_total, Decimal::new(9000, 2));
    }

    #[test]
    fn test_mismatched_total_is_rejected() {
        let err = OrderDraft::try_from(request(vec![item(2, 4500)], Some(Decimal::new(1, 0)))).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn test_itemless_order_keeps_supplied_total() {
        let draft = OrderDraft::try_from(request(vec![], Some(Decimal::new(2500, 0)))).unwrap();
        assert_eq!(draft.total_amount, Decimal::new(2500, 0));
    }

    #[test]
    fn test_bad_items_are_rejected() {
        assert!(OrderDraft::try_from(request(vec![item(0, 100)], None)).is_err());
        assert!(OrderDraft::try_from(request(vec![item(1, -100)], None)).is_err());
    }

    #[test]
    fn test_oversized_amounts_are_invalid_input() {
        let huge = NewOrderItem {
            product_id: Uuid::new_v4(),
            quantity: 2,
            unit_price: Decimal::from_str_exact("50000000000000000000000000000").unwrap(),
        };
        let err = OrderDraft::try_from(request(vec![huge], None)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));

        // Each price fits, the line total does not.
        let err = OrderDraft::try_from(request(vec![item(i32::MAX, 100_000)], None)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));

        // Each line fits, the sum does not.
        let near_max = item(1, 999_999_999_999);
        let err = OrderDraft::try_from(request(vec![near_max.clone(), near_max], None)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));

        let err = OrderDraft::try_from(request(vec![], Some(Decimal::new(1, 0) + max_amount()))).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn test_line_total_overflow_is_none() {
        let line = NewOrderItem {
            product_id: Uuid::new_v4(),
            quantity: 2,
            unit_price: Decimal::MAX,
        };
        assert_eq!(line.line_total(), None);
    }
}
