use async_trait::async_trait;
use bazaar_catalog::{
    NewProduct, Product, ProductFilter, ProductRepository, ProductUpdate, StockPolicy, StockSnapshot,
};
use bazaar_core::{Repository, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::backend;

const PRODUCT_COLUMNS: &str =
    "id, retailer_id, supplier_id, name, description, category, price, quantity, unit, created_at, updated_at";

pub struct StoreProductRepository {
    pool: PgPool,
}

impl StoreProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    retailer_id: Uuid,
    supplier_id: Option<Uuid>,
    name: String,
    description: Option<String>,
    category: Option<String>,
    price: Decimal,
    quantity: i32,
    unit: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            retailer_id: row.retailer_id,
            supplier_id: row.supplier_id,
            name: row.name,
            description: row.description,
            category: row.category,
            price: row.price,
            quantity: row.quantity,
            unit: row.unit,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl Repository<Product> for StoreProductRepository {
    async fn insert(&self, draft: NewProduct) -> StoreResult<Product> {
        let product = Product::from_draft(draft);

        sqlx::query(
            r#"
            INSERT INTO products (id, retailer_id, supplier_id, name, description, category, price, quantity, unit, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(product.id)
        .bind(product.retailer_id)
        .bind(product.supplier_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price)
        .bind(product.quantity)
        .bind(&product.unit)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(product)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(Product::from))
    }
}

#[async_trait]
impl ProductRepository for StoreProductRepository {
    async fn list(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {} FROM products
            WHERE ($1::uuid IS NULL OR retailer_id = $1)
              AND ($2::uuid IS NULL OR supplier_id = $2)
            ORDER BY created_at DESC
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(filter.retailer_id)
        .bind(filter.supplier_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn update(&self, id: Uuid, changes: &ProductUpdate) -> StoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                price = COALESCE($5, price),
                unit = COALESCE($6, unit),
                supplier_id = COALESCE($7, supplier_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(&changes.category)
        .bind(changes.price)
        .bind(&changes.unit)
        .bind(changes.supplier_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(Product::from))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        Ok(result.rows_affected() > 0)
    }

    /// Single conditional UPDATE; the row lock serializes concurrent deltas.
    /// Restocks pass the guard even when stock is already below zero.
    async fn adjust_quantity(
        &self,
        id: Uuid,
        delta: i32,
        policy: StockPolicy,
    ) -> StoreResult<Product> {
        let allow_negative = policy == StockPolicy::AllowNegative;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products
            SET quantity = quantity + $2, updated_at = NOW()
            WHERE id = $1
              AND ($3 OR $2 > 0 OR quantity::BIGINT + $2 >= 0)
              AND quantity::BIGINT + $2 <= 2147483647
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .bind(delta)
        .bind(allow_negative)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        if let Some(row) = row {
            return Ok(row.into());
        }

        match self.stock_snapshot(id).await? {
            None => Err(StoreError::NotFound { entity: "Product", id }),
            Some(snapshot) if snapshot.quantity.checked_add(delta).is_none() => {
                Err(StoreError::QuantityOverflow { product_id: id })
            }
            Some(snapshot) => Err(StoreError::InsufficientStock {
                product_id: id,
                requested: delta.saturating_neg(),
                available: snapshot.quantity,
            }),
        }
    }

    async fn stock_snapshot(&self, id: Uuid) -> StoreResult<Option<StockSnapshot>> {
        let row: Option<(Uuid, String, i32)> =
            sqlx::query_as("SELECT id, name, quantity FROM products WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;

        Ok(row.map(|(id, name, quantity)| StockSnapshot { id, name, quantity }))
    }
}
