//! Shared domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::types::BigDecimal;
use uuid::Uuid;

// =============================================================================
// JOBS
// =============================================================================

/// Lifecycle of a queued job.
///
/// Dispatch moves a job `Pending → Processing → {Completed | Failed}`. There
/// is no retry state: `Failed` is terminal, and re-running a failed job is an
/// operator decision, not system behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Inserted but not yet claimed by a worker.
    Pending,
    /// Claimed; dispatch in progress.
    Processing,
    /// Handler finished successfully.
    Completed,
    /// Handler or payload decode failed; `error_message` holds the cause.
    Failed,
}

impl JobStatus {
    /// Whether this status ends the job's lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Routing keys with a shipped handler.
///
/// The `jobs.topic` column stays free-form text so rows with unknown topics
/// survive storage round trips; this enum is the set dispatch knows how to
/// route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobTopic {
    /// Decrement a product's stock after an order.
    StockUpdate,
    /// Record a notification and deliver it.
    EmailNotification,
}

impl JobTopic {
    /// Wire and database form of the topic.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobTopic::StockUpdate => "stock_update",
            JobTopic::EmailNotification => "email_notification",
        }
    }

    /// Parses a stored topic string. `None` means no handler family exists
    /// for it; such jobs stay pending.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "stock_update" => Some(JobTopic::StockUpdate),
            "email_notification" => Some(JobTopic::EmailNotification),
            _ => None,
        }
    }
}

impl std::fmt::Display for JobTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a `stock_update` job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockUpdatePayload {
    pub product_id: i64,
    /// Units to subtract from the product's stock. Must be positive.
    pub quantity: i64,
}

/// Delivery channel for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Email,
    Push,
}

/// Body of an `email_notification` job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub receiver_id: i64,
    pub receiver_email: String,
    pub subject: String,
    pub message: String,
    /// Serialized under the JSON key `type`.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
}

/// Typed job payload, tagged externally by the `topic` column.
///
/// Producers enqueue this enum, so a row's topic and payload can never
/// disagree at the insert site. Dispatch matches on it exhaustively; adding
/// a topic means adding a variant and letting the compiler point at every
/// match that needs a new arm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPayload {
    StockUpdate(StockUpdatePayload),
    EmailNotification(NotificationPayload),
}

impl JobPayload {
    /// Topic this payload routes to.
    pub fn topic(&self) -> JobTopic {
        match self {
            JobPayload::StockUpdate(_) => JobTopic::StockUpdate,
            JobPayload::EmailNotification(_) => JobTopic::EmailNotification,
        }
    }

    /// Serializes the payload body for storage.
    pub fn to_value(&self) -> crate::Result<JsonValue> {
        let value = match self {
            JobPayload::StockUpdate(p) => serde_json::to_value(p)?,
            JobPayload::EmailNotification(p) => serde_json::to_value(p)?,
        };
        Ok(value)
    }

    /// Decodes a stored payload body for the given topic.
    pub fn decode(topic: JobTopic, value: &JsonValue) -> crate::Result<Self> {
        let payload = match topic {
            JobTopic::StockUpdate => {
                JobPayload::StockUpdate(serde_json::from_value(value.clone())?)
            }
            JobTopic::EmailNotification => {
                JobPayload::EmailNotification(serde_json::from_value(value.clone())?)
            }
        };
        Ok(payload)
    }
}

/// A queued unit of background work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Surrogate key, assigned on insert, never reused.
    pub id: Uuid,
    /// Routing key. Stored verbatim; see [`JobTopic::parse`].
    pub topic: String,
    /// Opaque body; only the topic's handler interprets it.
    pub payload: JsonValue,
    pub status: JobStatus,
    /// Cause of the most recent failure. Never cleared once set.
    pub error_message: Option<String>,
    /// Insertion instant; fixes the FIFO dispatch order.
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Point-in-time counts of jobs by status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub pending: i64,
    pub processing: i64,
    pub completed: i64,
    pub failed: i64,
    pub total: i64,
}

// =============================================================================
// PRODUCTS
// =============================================================================

/// A sellable product with a tracked stock level.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: BigDecimal,
    /// Units on hand. Never negative; decrements are conditional.
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// Delivery state of a notification record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    /// Recorded, delivery not confirmed.
    Pending,
    /// Delivered on the receiver's channel.
    Sent,
    /// Opened by the receiver.
    Read,
}

/// Fields required to record a new notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    pub receiver_id: i64,
    pub receiver_email: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub kind: NotificationKind,
}

impl From<NotificationPayload> for NewNotification {
    fn from(p: NotificationPayload) -> Self {
        NewNotification {
            receiver_id: p.receiver_id,
            receiver_email: Some(p.receiver_email),
            subject: Some(p.subject),
            message: p.message,
            kind: p.kind,
        }
    }
}

/// A stored notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub receiver_id: i64,
    pub receiver_email: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub kind: NotificationKind,
    pub status: NotificationStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
