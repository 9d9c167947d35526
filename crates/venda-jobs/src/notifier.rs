//! Notifier — persists notification records and delivers them.

use async_trait::async_trait;
use tracing::{debug, warn};

use venda_core::{Error, NewNotification, NotificationKind, NotificationService, Result};
use venda_db::Database;

use crate::mailer::Mailer;

/// Records a notification, attempts delivery, and marks the record sent.
///
/// The record is written before any delivery attempt and stays `pending`
/// whenever delivery does not succeed, so the table is the audit trail for
/// what was asked for versus what went out.
pub struct Notifier {
    db: Database,
    mailer: Mailer,
}

impl Notifier {
    /// Create a notifier over the notification store and mail relay.
    pub fn new(db: Database, mailer: Mailer) -> Self {
        Self { db, mailer }
    }
}

#[async_trait]
impl NotificationService for Notifier {
    async fn create_and_send(&self, notification: NewNotification) -> Result<()> {
        let id = self.db.notifications.create(&notification).await?;

        match notification.kind {
            NotificationKind::Email => {
                let to = notification.receiver_email.as_deref().ok_or_else(|| {
                    Error::InvalidInput(
                        "email notification without a receiver address".to_string(),
                    )
                })?;
                let subject = notification.subject.as_deref().unwrap_or("");

                self.mailer.send(to, subject, &notification.message).await?;
                self.db.notifications.mark_sent(id).await?;

                debug!(notification_id = id, "Notification delivered");
            }
            NotificationKind::Push => {
                // No push provider is wired up; the record stays pending.
                warn!(notification_id = id, "Push delivery not available");
            }
        }

        Ok(())
    }
}
