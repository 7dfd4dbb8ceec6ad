//! # Kitchen Ticket Repository
//!
//! Restaurant order tickets sent to the kitchen.
//!
//! ## Ticket Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  pending ──► preparing ──► ready ──► served                            │
//! │     │            │                                                      │
//! │     └────────────┴──► cancelled                                        │
//! │                                                                         │
//! │  Tickets outlive their till: deleting the till clears till_id.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use harbor_core::{KitchenOrderTicket, TicketStatus};

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;

const TICKET_COLUMNS: &str = r#"
    id, outlet_id, till_id, sale_id, ticket_number, table_label,
    status, notes, created_at, updated_at
"#;

/// Input for a new ticket.
#[derive(Debug, Clone, Default)]
pub struct NewKitchenTicket {
    pub outlet_id: String,
    pub till_id: Option<String>,
    pub sale_id: Option<String>,
    pub table_label: Option<String>,
    pub notes: Option<String>,
}

/// Repository for kitchen ticket database operations.
#[derive(Debug, Clone)]
pub struct KitchenTicketRepository {
    pool: SqlitePool,
}

impl KitchenTicketRepository {
    /// Creates a new KitchenTicketRepository.
    pub fn new(pool: SqlitePool) -> Self {
        KitchenTicketRepository { pool }
    }

    /// Creates a pending ticket.
    ///
    /// Ticket numbers restart daily per outlet: `K001`, `K002`, ...
    pub async fn create(&self, input: NewKitchenTicket) -> DbResult<KitchenOrderTicket> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Highest issued number, so deleted tickets never free theirs
        let last_number: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(MAX(CAST(substr(ticket_number, 2) AS INTEGER)), 0)
            FROM kitchen_order_tickets
            WHERE outlet_id = ? AND substr(created_at, 1, 10) = ?
            "#,
        )
        .bind(&input.outlet_id)
        .bind(now.format("%Y-%m-%d").to_string())
        .fetch_one(&mut *tx)
        .await?;

        let ticket = KitchenOrderTicket {
            id: generate_id(),
            outlet_id: input.outlet_id,
            till_id: input.till_id,
            sale_id: input.sale_id,
            ticket_number: format!("K{:03}", last_number + 1),
            table_label: input.table_label,
            status: TicketStatus::Pending,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %ticket.id, ticket_number = %ticket.ticket_number, "Creating kitchen ticket");

        sqlx::query(&format!(
            "INSERT INTO kitchen_order_tickets ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            TICKET_COLUMNS
        ))
        .bind(&ticket.id)
        .bind(&ticket.outlet_id)
        .bind(&ticket.till_id)
        .bind(&ticket.sale_id)
        .bind(&ticket.ticket_number)
        .bind(&ticket.table_label)
        .bind(ticket.status)
        .bind(&ticket.notes)
        .bind(ticket.created_at)
        .bind(ticket.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ticket)
    }

    /// Gets a ticket by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<KitchenOrderTicket>> {
        let ticket = sqlx::query_as::<_, KitchenOrderTicket>(&format!(
            "SELECT {} FROM kitchen_order_tickets WHERE id = ?",
            TICKET_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }

    /// Lists tickets raised on a till.
    pub async fn list_by_till(&self, till_id: &str) -> DbResult<Vec<KitchenOrderTicket>> {
        let tickets = sqlx::query_as::<_, KitchenOrderTicket>(&format!(
            "SELECT {} FROM kitchen_order_tickets WHERE till_id = ? ORDER BY created_at",
            TICKET_COLUMNS
        ))
        .bind(till_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tickets)
    }

    /// Lists tickets the kitchen still has to act on, oldest first.
    pub async fn list_open(&self, outlet_id: &str) -> DbResult<Vec<KitchenOrderTicket>> {
        let tickets = sqlx::query_as::<_, KitchenOrderTicket>(&format!(
            r#"
            SELECT {} FROM kitchen_order_tickets
            WHERE outlet_id = ? AND status IN ('pending', 'preparing', 'ready')
            ORDER BY created_at, ticket_number
            "#,
            TICKET_COLUMNS
        ))
        .bind(outlet_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tickets)
    }

    /// Moves a ticket to `next`.
    pub async fn update_status(
        &self,
        id: &str,
        next: TicketStatus,
    ) -> DbResult<KitchenOrderTicket> {
        let ticket = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("KitchenOrderTicket", id))?;
        let status = ticket.status.transition(next)?;
        let updated_at = Utc::now();

        // Guarded on the old status so a concurrent move loses cleanly
        let result = sqlx::query(
            "UPDATE kitchen_order_tickets SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(status)
        .bind(updated_at)
        .bind(id)
        .bind(ticket.status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::QueryFailed(format!(
                "ticket {} changed status concurrently",
                ticket.ticket_number
            )));
        }

        info!(ticket_number = %ticket.ticket_number, from = %ticket.status, to = %status, "Kitchen ticket moved");

        Ok(KitchenOrderTicket {
            status,
            updated_at,
            ..ticket
        })
    }

    /// Deletes a ticket.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM kitchen_order_tickets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("KitchenOrderTicket", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use harbor_core::CoreError;

    #[tokio::test]
    async fn test_ticket_numbers_and_flow() {
        let db = fixtures::db().await;
        let outlet = fixtures::outlet(&db, "Harbour Grill").await;
        let repo = db.kitchen_tickets();

        let first = repo
            .create(NewKitchenTicket {
                outlet_id: outlet.id.clone(),
                table_label: Some("T4".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        let second = repo
            .create(NewKitchenTicket {
                outlet_id: outlet.id.clone(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(first.ticket_number, "K001");
        assert_eq!(second.ticket_number, "K002");
        assert_eq!(first.status, TicketStatus::Pending);

        repo.update_status(&first.id, TicketStatus::Preparing)
            .await
            .unwrap();
        repo.update_status(&first.id, TicketStatus::Ready)
            .await
            .unwrap();
        let served = repo
            .update_status(&first.id, TicketStatus::Served)
            .await
            .unwrap();
        assert_eq!(served.status, TicketStatus::Served);

        let open = repo.list_open(&outlet.id).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, second.id);
    }

    #[tokio::test]
    async fn test_deleted_ticket_number_not_reissued() {
        let db = fixtures::db().await;
        let outlet = fixtures::outlet(&db, "Main").await;
        let repo = db.kitchen_tickets();
        let new_ticket = || NewKitchenTicket {
            outlet_id: outlet.id.clone(),
            ..Default::default()
        };

        let first = repo.create(new_ticket()).await.unwrap();
        let second = repo.create(new_ticket()).await.unwrap();
        repo.delete(&first.id).await.unwrap();

        let third = repo.create(new_ticket()).await.unwrap();
        assert_eq!(second.ticket_number, "K002");
        assert_eq!(third.ticket_number, "K003");

        let open: Vec<_> = repo
            .list_open(&outlet.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.ticket_number)
            .collect();
        assert_eq!(open.len(), 2);
        assert!(open.contains(&"K002".to_string()));
        assert!(open.contains(&"K003".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_transition_rejected() {
        let db = fixtures::db().await;
        let outlet = fixtures::outlet(&db, "Main").await;
        let ticket = db
            .kitchen_tickets()
            .create(NewKitchenTicket {
                outlet_id: outlet.id.clone(),
                ..Default::default()
            })
            .await
            .unwrap();

        let err = db
            .kitchen_tickets()
            .update_status(&ticket.id, TicketStatus::Served)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidTicketTransition { .. })
        ));

        let stored = db.kitchen_tickets().get_by_id(&ticket.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TicketStatus::Pending);
    }

    #[tokio::test]
    async fn test_deleting_till_keeps_ticket() {
        let db = fixtures::db().await;
        let outlet = fixtures::outlet(&db, "Main").await;
        let till = fixtures::till(&db, &outlet, "Bar").await;
        let ticket = db
            .kitchen_tickets()
            .create(NewKitchenTicket {
                outlet_id: outlet.id.clone(),
                till_id: Some(till.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(db.kitchen_tickets().list_by_till(&till.id).await.unwrap().len(), 1);

        db.tills().delete(&till.id).await.unwrap();

        let kept = db.kitchen_tickets().get_by_id(&ticket.id).await.unwrap().unwrap();
        assert!(kept.till_id.is_none());
        assert_eq!(kept.ticket_number, ticket.ticket_number);
    }

    #[tokio::test]
    async fn test_unknown_till_rejected() {
        let db = fixtures::db().await;
        let outlet = fixtures::outlet(&db, "Main").await;

        let err = db
            .kitchen_tickets()
            .create(NewKitchenTicket {
                outlet_id: outlet.id.clone(),
                till_id: Some("missing".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
