//! # Product Repository
//!
//! Database operations for the catalog: products, their sale units, and
//! read access to the retired item variations.
//!
//! ## Units Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product "SUGAR-1KG"  base_unit = "piece"   price = 180.00             │
//! │     │                                                                   │
//! │     ├── ProductUnit "piece"   factor_milli =  1000   (1 × base)        │
//! │     ├── ProductUnit "bale"    factor_milli = 12000   (12 × base)       │
//! │     └── ProductUnit "half"    factor_milli =   500   (0.5 × base)      │
//! │                                                                         │
//! │  Selling 3 bales consumes 36 base units from a batch.                  │
//! │                                                                         │
//! │  item_variations: legacy rows, listed and counted only                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use harbor_core::validation::{
    validate_price_cents, validate_product_name, validate_sku, validate_tax_rate_bps,
    validate_unit_name,
};
use harbor_core::{ItemVariation, Product, ProductUnit, UnitFactor};

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;

const PRODUCT_COLUMNS: &str = r#"
    id, sku, name, base_unit, price_cents, tax_rate_bps,
    is_active, created_at, updated_at
"#;

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub base_unit: String,
    pub price_cents: i64,
    pub tax_rate_bps: u32,
}

/// Repository for product database operations.
///
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// let product = repo.get_by_sku("SUGAR-1KG").await?;
/// let bale = repo.add_unit(&product.id, "bale", 12_000, None).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Creates a product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn create(&self, input: NewProduct) -> DbResult<Product> {
        validate_sku(&input.sku)?;
        validate_product_name(&input.name)?;
        validate_unit_name(&input.base_unit)?;
        validate_price_cents(input.price_cents)?;
        validate_tax_rate_bps(input.tax_rate_bps)?;

        let now = Utc::now();
        let product = Product {
            id: generate_id(),
            sku: input.sku.trim().to_string(),
            name: input.name.trim().to_string(),
            base_unit: input.base_unit.trim().to_string(),
            price_cents: input.price_cents,
            tax_rate_bps: input.tax_rate_bps,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, base_unit, price_cents, tax_rate_bps,
                is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.base_unit)
        .bind(product.price_cents)
        .bind(product.tax_rate_bps)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = ?",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE sku = ?",
            PRODUCT_COLUMNS
        ))
        .bind(sku.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists active products by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE is_active = 1 ORDER BY name LIMIT ?",
            PRODUCT_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Changes a product's base price and tax rate.
    pub async fn update_price(&self, id: &str, price_cents: i64, tax_rate_bps: u32) -> DbResult<()> {
        validate_price_cents(price_cents)?;
        validate_tax_rate_bps(tax_rate_bps)?;

        debug!(id = %id, price_cents, tax_rate_bps, "Updating product price");

        let result = sqlx::query(
            "UPDATE products SET price_cents = ?, tax_rate_bps = ?, updated_at = ? WHERE id = ?",
        )
        .bind(price_cents)
        .bind(tax_rate_bps)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Sale items snapshot the product, but still reference its row.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result =
            sqlx::query("UPDATE products SET is_active = 0, updated_at = ? WHERE id = ?")
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Product Units
    // =========================================================================

    /// Adds an alternate sale unit to a product.
    ///
    /// ## Arguments
    /// * `factor_milli` - Base units per sale unit, in thousandths (12000 = 12)
    /// * `price_cents` - Explicit unit price; `None` derives it from the base price
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Unit name already defined for the product
    pub async fn add_unit(
        &self,
        product_id: &str,
        unit_name: &str,
        factor_milli: i64,
        price_cents: Option<i64>,
    ) -> DbResult<ProductUnit> {
        validate_unit_name(unit_name)?;
        UnitFactor::from_milli(factor_milli)?;
        if let Some(price) = price_cents {
            validate_price_cents(price)?;
        }

        let unit = ProductUnit {
            id: generate_id(),
            product_id: product_id.to_string(),
            unit_name: unit_name.trim().to_string(),
            factor_milli,
            price_cents,
            created_at: Utc::now(),
        };

        debug!(product_id = %product_id, unit = %unit.unit_name, factor_milli, "Adding product unit");

        sqlx::query(
            r#"
            INSERT INTO product_units (id, product_id, unit_name, factor_milli, price_cents, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&unit.id)
        .bind(&unit.product_id)
        .bind(&unit.unit_name)
        .bind(unit.factor_milli)
        .bind(unit.price_cents)
        .bind(unit.created_at)
        .execute(&self.pool)
        .await?;

        Ok(unit)
    }

    /// Looks up a product's unit by name.
    pub async fn get_unit(&self, product_id: &str, unit_name: &str) -> DbResult<Option<ProductUnit>> {
        let unit = sqlx::query_as::<_, ProductUnit>(
            r#"
            SELECT id, product_id, unit_name, factor_milli, price_cents, created_at
            FROM product_units
            WHERE product_id = ? AND unit_name = ?
            "#,
        )
        .bind(product_id)
        .bind(unit_name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(unit)
    }

    /// Lists a product's units, smallest factor first.
    pub async fn list_units(&self, product_id: &str) -> DbResult<Vec<ProductUnit>> {
        let units = sqlx::query_as::<_, ProductUnit>(
            r#"
            SELECT id, product_id, unit_name, factor_milli, price_cents, created_at
            FROM product_units
            WHERE product_id = ?
            ORDER BY factor_milli, unit_name
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(units)
    }

    /// Removes a sale unit.
    pub async fn delete_unit(&self, unit_id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM product_units WHERE id = ?")
            .bind(unit_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ProductUnit", unit_id));
        }

        Ok(())
    }

    // =========================================================================
    // Legacy Item Variations (read-only)
    // =========================================================================

    /// Lists legacy variations of a product.
    pub async fn list_legacy_variations(&self, product_id: &str) -> DbResult<Vec<ItemVariation>> {
        let variations = sqlx::query_as::<_, ItemVariation>(
            r#"
            SELECT id, product_id, name, sku, price_cents, created_at
            FROM item_variations
            WHERE product_id = ?
            ORDER BY name
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(variations)
    }

    /// Counts legacy variation rows still in the store.
    pub async fn count_legacy_variations(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM item_variations")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
