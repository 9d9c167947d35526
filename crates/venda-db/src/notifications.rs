//! Notification repository implementation.

use chrono::Utc;
use sqlx::{Pool, Postgres, Row};

use venda_core::{
    Error, NewNotification, Notification, NotificationKind, NotificationStatus, Result,
};

/// PostgreSQL notification store.
///
/// Rows are created in `pending` status by the email handler and flipped to
/// `sent` after the relay accepts delivery; a failed delivery leaves the row
/// pending as the audit trail.
pub struct PgNotificationRepository {
    pool: Pool<Postgres>,
}

impl PgNotificationRepository {
    /// Create a new PgNotificationRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Convert NotificationKind to string for the database.
    fn kind_to_str(kind: NotificationKind) -> &'static str {
        match kind {
            NotificationKind::Email => "email",
            NotificationKind::Push => "push",
        }
    }

    /// Convert a string from the database to NotificationKind.
    fn str_to_kind(s: &str) -> NotificationKind {
        match s {
            "email" => NotificationKind::Email,
            "push" => NotificationKind::Push,
            _ => NotificationKind::Email, // fallback
        }
    }

    /// Convert a string from the database to NotificationStatus.
    fn str_to_status(s: &str) -> NotificationStatus {
        match s {
            "pending" => NotificationStatus::Pending,
            "sent" => NotificationStatus::Sent,
            "read" => NotificationStatus::Read,
            _ => NotificationStatus::Pending, // fallback
        }
    }

    /// Parse a notification row into a Notification struct.
    fn parse_row(row: sqlx::postgres::PgRow) -> Notification {
        Notification {
            id: row.get("id"),
            receiver_id: row.get("receiver_id"),
            receiver_email: row.get("receiver_email"),
            subject: row.get("subject"),
            message: row.get("message"),
            kind: Self::str_to_kind(row.get("kind")),
            status: Self::str_to_status(row.get("status")),
            sent_at: row.get("sent_at"),
            read_at: row.get("read_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    /// Insert a notification in `pending` status and return its id.
    pub async fn create(&self, notification: &NewNotification) -> Result<i64> {
        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO notifications
                 (receiver_id, receiver_email, subject, message, kind, status,
                  created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, 'pending', $6, $6)
             RETURNING id",
        )
        .bind(notification.receiver_id)
        .bind(&notification.receiver_email)
        .bind(&notification.subject)
        .bind(&notification.message)
        .bind(Self::kind_to_str(notification.kind))
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    /// Mark a notification as delivered, stamping `sent_at`.
    pub async fn mark_sent(&self, notification_id: i64) -> Result<()> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE notifications
             SET status = 'sent', sent_at = $2, updated_at = $2
             WHERE id = $1",
        )
        .bind(notification_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("notification {notification_id}")));
        }
        Ok(())
    }

    /// Fetch a notification by id.
    pub async fn get(&self, notification_id: i64) -> Result<Option<Notification>> {
        let row = sqlx::query(
            "SELECT id, receiver_id, receiver_email, subject, message, kind,
                    status, sent_at, read_at, created_at, updated_at
             FROM notifications WHERE id = $1",
        )
        .bind(notification_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_row))
    }
}
