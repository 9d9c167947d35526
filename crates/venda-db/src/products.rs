//! Product repository and the inventory capability.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::BigDecimal;
use sqlx::{Pool, Postgres, Row};

use venda_core::{Error, InventoryService, Product, Result};

/// PostgreSQL product store.
pub struct PgProductRepository {
    pool: Pool<Postgres>,
}

impl PgProductRepository {
    /// Create a new PgProductRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a product and return its id.
    pub async fn create(&self, name: &str, price: BigDecimal, stock: i64) -> Result<i64> {
        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO products (name, price, stock, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING id",
        )
        .bind(name)
        .bind(price)
        .bind(stock)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    /// Fetch a product by id.
    pub async fn get(&self, product_id: i64) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, price, stock, created_at, updated_at
             FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|row| Product {
            id: row.get("id"),
            name: row.get("name"),
            price: row.get("price"),
            stock: row.get("stock"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }))
    }
}

#[async_trait]
impl InventoryService for PgProductRepository {
    async fn update_stock(&self, product_id: i64, quantity: i64) -> Result<()> {
        if quantity <= 0 {
            return Err(Error::InvalidInput(format!(
                "stock decrement must be positive, got {quantity}"
            )));
        }

        let now = Utc::now();

        // The guard in the WHERE clause makes the decrement all-or-nothing
        // and safe to repeat: a duplicate dispatch of the same job can
        // over-subtract, but it can never drive stock below zero.
        let result = sqlx::query(
            "UPDATE products
             SET stock = stock - $2, updated_at = $3
             WHERE id = $1 AND stock >= $2",
        )
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Zero rows means either the product is missing or its stock is too
        // low; one more read tells the caller which.
        let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        match stock {
            None => Err(Error::NotFound(format!("product {product_id}"))),
            Some(available) => Err(Error::InsufficientStock {
                product_id,
                available,
                requested: quantity,
            }),
        }
    }
}
