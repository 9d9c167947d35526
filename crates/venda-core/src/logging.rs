//! Structured logging field-name contract.
//!
//! Every subsystem logs through `tracing` with these field names so log
//! pipelines can rely on a stable vocabulary. The `tracing` macros require
//! literal field names, so call sites repeat the strings; this module is the
//! authoritative list they repeat.
//!
//! # Log level contract
//!
//! | Level | Meaning                                                   |
//! |-------|-----------------------------------------------------------|
//! | ERROR | Actionable failure; someone should look at it             |
//! | WARN  | Degraded but self-healing (skipped job, lost claim)       |
//! | INFO  | Lifecycle events (startup, shutdown, pool creation)       |
//! | DEBUG | Per-operation diagnostics                                 |
//! | TRACE | Payload-level detail                                      |

// ─── Identity fields ─────────────────────────────────────────────────────

/// Subsystem emitting the event: "database", "jobs", "mailer".
pub const SUBSYSTEM: &str = "subsystem";
/// Component within the subsystem: "pool", "worker", "job_repository".
pub const COMPONENT: &str = "component";
/// Short operation name: "enqueue", "fetch_pending", "dispatch".
pub const OPERATION: &str = "op";

// ─── Domain fields ───────────────────────────────────────────────────────

/// Job id (UUID).
pub const JOB_ID: &str = "job_id";
/// Job topic string.
pub const TOPIC: &str = "topic";
/// Product id.
pub const PRODUCT_ID: &str = "product_id";
/// Notification id.
pub const NOTIFICATION_ID: &str = "notification_id";

// ─── Measurement fields ──────────────────────────────────────────────────

/// Elapsed wall-clock milliseconds.
pub const DURATION_MS: &str = "duration_ms";
/// Rows claimed in one poll.
pub const BATCH_SIZE: &str = "batch_size";
/// Rows returned by a query.
pub const RESULT_COUNT: &str = "result_count";
/// Pool connections open.
pub const POOL_SIZE: &str = "pool_size";
/// Pool connections idle.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ──────────────────────────────────────────────────────

/// Boolean operation outcome.
pub const SUCCESS: &str = "success";
/// Error display text.
pub const ERROR_MSG: &str = "error";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_are_unique() {
        let fields = [
            SUBSYSTEM,
            COMPONENT,
            OPERATION,
            JOB_ID,
            TOPIC,
            PRODUCT_ID,
            NOTIFICATION_ID,
            DURATION_MS,
            BATCH_SIZE,
            RESULT_COUNT,
            POOL_SIZE,
            POOL_IDLE,
            SUCCESS,
            ERROR_MSG,
        ];
        let mut seen = std::collections::HashSet::new();
        for field in fields {
            assert!(seen.insert(field), "duplicate log field name: {field}");
        }
    }
}
