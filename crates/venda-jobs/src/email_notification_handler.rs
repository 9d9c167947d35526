//! EmailNotificationHandler — records and delivers `email_notification` jobs.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use venda_core::{Error, JobPayload, JobTopic, NotificationService, Result};

use crate::handler::JobHandler;

pub struct EmailNotificationHandler {
    notifier: Arc<dyn NotificationService>,
}

impl EmailNotificationHandler {
    pub fn new(notifier: Arc<dyn NotificationService>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl JobHandler for EmailNotificationHandler {
    fn topic(&self) -> JobTopic {
        JobTopic::EmailNotification
    }

    async fn execute(&self, payload: JobPayload) -> Result<()> {
        let JobPayload::EmailNotification(notification) = payload else {
            return Err(Error::InvalidInput(
                "email_notification handler received a payload for another topic".to_string(),
            ));
        };

        debug!(
            receiver_id = notification.receiver_id,
            "Recording and delivering notification"
        );

        self.notifier.create_and_send(notification.into()).await
    }
}
