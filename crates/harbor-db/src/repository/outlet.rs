//! # Outlet Repository
//!
//! Store locations. Batches, tills, sales and expenses hang off an outlet.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use harbor_core::validation::validate_text;
use harbor_core::Outlet;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;

/// Repository for outlet database operations.
#[derive(Debug, Clone)]
pub struct OutletRepository {
    pool: SqlitePool,
}

impl OutletRepository {
    /// Creates a new OutletRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OutletRepository { pool }
    }

    /// Creates an active outlet.
    pub async fn create(&self, name: &str) -> DbResult<Outlet> {
        validate_text("name", name, 200)?;

        let outlet = Outlet {
            id: generate_id(),
            name: name.trim().to_string(),
            is_active: true,
            created_at: Utc::now(),
        };

        debug!(id = %outlet.id, name = %outlet.name, "Creating outlet");

        sqlx::query("INSERT INTO outlets (id, name, is_active, created_at) VALUES (?, ?, ?, ?)")
            .bind(&outlet.id)
            .bind(&outlet.name)
            .bind(outlet.is_active)
            .bind(outlet.created_at)
            .execute(&self.pool)
            .await?;

        Ok(outlet)
    }

    /// Gets an outlet by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Outlet>> {
        let outlet = sqlx::query_as::<_, Outlet>(
            "SELECT id, name, is_active, created_at FROM outlets WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(outlet)
    }

    /// Lists all outlets by name.
    pub async fn list(&self) -> DbResult<Vec<Outlet>> {
        let outlets = sqlx::query_as::<_, Outlet>(
            "SELECT id, name, is_active, created_at FROM outlets ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(outlets)
    }

    /// Marks an outlet inactive. History stays attached.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE outlets SET is_active = 0 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Outlet", id));
        }

        Ok(())
    }
}
