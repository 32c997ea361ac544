use bazaar_core::{CoreError, CoreResult, Entity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_UNIT: &str = "pcs";

/// A stocked product owned by a retailer. `quantity` is only ever changed
/// through the ledger's atomic delta, never through `ProductUpdate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub retailer_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    pub unit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Product {
    const NAME: &'static str = "Product";
    type Draft = NewProduct;
}

impl Product {
    /// Build a fresh record from a validated draft.
    pub fn from_draft(draft: NewProduct) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            retailer_id: draft.retailer_id,
            supplier_id: draft.supplier_id,
            name: draft.name,
            description: draft.description,
            category: draft.category,
            price: draft.price,
            quantity: draft.quantity,
            unit: draft.unit.unwrap_or_else(|| DEFAULT_UNIT.to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply the plain field changes of an update.
    pub fn apply(&mut self, changes: &ProductUpdate) {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        if let Some(description) = &changes.description {
            self.description = Some(description.clone());
        }
        if let Some(category) = &changes.category {
            self.category = Some(category.clone());
        }
        if let Some(price) = changes.price {
            self.price = price;
        }
        if let Some(unit) = &changes.unit {
            self.unit = unit.clone();
        }
        if let Some(supplier_id) = changes.supplier_id {
            self.supplier_id = Some(supplier_id);
        }
        self.updated_at = Utc::now();
    }
}

/// Product registration payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub retailer_id: Uuid,
    #[serde(default)]
    pub supplier_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub unit: Option<String>,
}

impl NewProduct {
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::invalid_input("name is required"));
        }
        if self.price.is_sign_negative() {
            return Err(CoreError::invalid_input("price must not be negative"));
        }
        if self.quantity < 0 {
            return Err(CoreError::invalid_input("quantity must not be negative"));
        }
        Ok(())
    }
}

/// Plain field update. Stock moves only through
/// `StockLedger::adjust_quantity`, so there is no quantity field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub unit: Option<String>,
    pub supplier_id: Option<Uuid>,
}

impl ProductUpdate {
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(CoreError::invalid_input("name must not be empty"));
            }
        }
        if let Some(price) = self.price {
            if price.is_sign_negative() {
                return Err(CoreError::invalid_input("price must not be negative"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    #[serde(default, alias = "retailer_id")]
    pub retailer_id: Option<Uuid>,
    #[serde(default, alias = "supplier_id")]
    pub supplier_id: Option<Uuid>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        self.retailer_id.map_or(true, |id| product.retailer_id == id)
            && self.supplier_id.map_or(true, |id| product.supplier_id == Some(id))
    }
}

/// Raw quantity read straight from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct StockSnapshot {
    pub id: Uuid,
    pub name: String,
    pub quantity: i32,
}

/// Stock level as reported to callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub product_id: Uuid,
    pub product_name: String,
    pub current_stock: i32,
    pub low_stock_threshold: i32,
    pub is_low_stock: bool,
}

impl StockLevel {
    pub fn from_snapshot(snapshot: StockSnapshot, low_stock_threshold: i32) -> Self {
        Self {
            product_id: snapshot.id,
            product_name: snapshot.name,
            current_stock: snapshot.quantity,
            low_stock_threshold,
            is_low_stock: snapshot.quantity <= low_stock_threshold,
        }
    }
}
