//! Repository and capability traits implemented by the storage layer.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Job, JobPayload, JobStatus, NewNotification, QueueStats};
use crate::Result;

// =============================================================================
// JOB REPOSITORY
// =============================================================================

/// Persistence operations for the background job queue.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Inserts one pending job and returns its id.
    async fn enqueue(&self, payload: &JobPayload) -> Result<Uuid>;

    /// Claims up to `limit` pending jobs, oldest first.
    ///
    /// Claimed rows are flipped to `processing` inside the same transaction
    /// that locked them, so two concurrent callers never receive the same
    /// row and the claim stays exclusive after this call returns.
    async fn fetch_pending(&self, limit: i64) -> Result<Vec<Job>>;

    /// Sets a job's status, advancing `updated_at`.
    ///
    /// `error_message` overwrites the stored message only when `Some`.
    /// Repeating a write with the same terminal status is harmless.
    async fn update_status(
        &self,
        job_id: Uuid,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> Result<()>;

    /// Fetches a job by id.
    async fn get(&self, job_id: Uuid) -> Result<Option<Job>>;

    /// Number of jobs currently pending.
    async fn pending_count(&self) -> Result<i64>;

    /// Point-in-time queue counters.
    async fn queue_stats(&self) -> Result<QueueStats>;
}

// =============================================================================
// STORE CAPABILITIES
// =============================================================================

/// Inventory side effect used by the `stock_update` handler.
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Subtracts `quantity` units from a product's stock.
    ///
    /// Fails with `NotFound` for a missing product and `InsufficientStock`
    /// when the decrement would go negative; the subtraction is
    /// all-or-nothing, so a duplicate call can never push stock below zero.
    async fn update_stock(&self, product_id: i64, quantity: i64) -> Result<()>;
}

/// Notification side effect used by the `email_notification` handler.
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Records a notification and attempts delivery on its channel.
    ///
    /// The record is created in `Pending` status before delivery; a delivery
    /// failure propagates and leaves the record pending.
    async fn create_and_send(&self, notification: NewNotification) -> Result<()>;
}
