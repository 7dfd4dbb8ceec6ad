//! # Till Repository
//!
//! POS terminals. Deleting a till detaches its kitchen tickets and sales
//! (`ON DELETE SET NULL`); a till with recorded shifts cannot be deleted.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use harbor_core::validation::validate_text;
use harbor_core::Till;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;

/// Repository for till database operations.
#[derive(Debug, Clone)]
pub struct TillRepository {
    pool: SqlitePool,
}

impl TillRepository {
    /// Creates a new TillRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TillRepository { pool }
    }

    /// Registers a till at an outlet.
    pub async fn create(&self, outlet_id: &str, name: &str) -> DbResult<Till> {
        validate_text("name", name, 100)?;

        let till = Till {
            id: generate_id(),
            outlet_id: outlet_id.to_string(),
            name: name.trim().to_string(),
            is_active: true,
            created_at: Utc::now(),
        };

        debug!(id = %till.id, outlet_id = %outlet_id, "Creating till");

        sqlx::query(
            "INSERT INTO tills (id, outlet_id, name, is_active, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&till.id)
        .bind(&till.outlet_id)
        .bind(&till.name)
        .bind(till.is_active)
        .bind(till.created_at)
        .execute(&self.pool)
        .await?;

        Ok(till)
    }

    /// Gets a till by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Till>> {
        let till = sqlx::query_as::<_, Till>(
            "SELECT id, outlet_id, name, is_active, created_at FROM tills WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(till)
    }

    /// Lists the tills of an outlet.
    pub async fn list_for_outlet(&self, outlet_id: &str) -> DbResult<Vec<Till>> {
        let tills = sqlx::query_as::<_, Till>(
            r#"
            SELECT id, outlet_id, name, is_active, created_at
            FROM tills
            WHERE outlet_id = ?
            ORDER BY name
            "#,
        )
        .bind(outlet_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tills)
    }

    /// Deletes a till.
    ///
    /// Kitchen tickets and sales raised on it keep their rows with a null
    /// till reference.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM tills WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Till", id));
        }

        info!(id = %id, "Till deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::repository::fixtures;

    #[tokio::test]
    async fn test_create_and_list() {
        let db = fixtures::db().await;
        let outlet = fixtures::outlet(&db, "Main").await;
        fixtures::till(&db, &outlet, "Till 2").await;
        let till1 = fixtures::till(&db, &outlet, "Till 1").await;

        let tills = db.tills().list_for_outlet(&outlet.id).await.unwrap();
        assert_eq!(tills.len(), 2);
        assert_eq!(tills[0].id, till1.id);
    }

    #[tokio::test]
    async fn test_unknown_outlet_rejected() {
        let db = fixtures::db().await;
        let err = db.tills().create("missing", "Till 1").await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_delete_missing_till() {
        let db = fixtures::db().await;
        let err = db.tills().delete("missing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_till_with_shifts_cannot_be_deleted() {
        let db = fixtures::db().await;
        let outlet = fixtures::outlet(&db, "Main").await;
        let till = fixtures::till(&db, &outlet, "Till 1").await;
        db.shifts().open_shift(&till.id, "Amina", 0).await.unwrap();

        let err = db.tills().delete(&till.id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
