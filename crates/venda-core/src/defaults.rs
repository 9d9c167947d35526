//! Default values used across venda.
//!
//! Single source of truth for tunable constants. Environment variables may
//! override most of these at runtime; the constants document the fallback
//! behavior in one place.

// ===== JOB WORKER =====

/// Milliseconds between polls of the job queue.
pub const JOB_POLL_INTERVAL_MS: u64 = 2_000;

/// Maximum number of jobs claimed per poll.
pub const JOB_BATCH_SIZE: i64 = 10;

/// Capacity of the worker event broadcast channel. Subscribers that lag
/// behind by more than this many events lose the oldest ones.
pub const EVENT_BUS_CAPACITY: usize = 256;

// ===== MAIL RELAY =====

/// Mail relay endpoint (HTTP JSON API).
pub const MAILER_URL: &str = "http://127.0.0.1:8025/api/send";

/// From address for outbound mail.
pub const MAILER_FROM: &str = "no-reply@venda.dev";

/// Seconds before an outbound relay request times out.
pub const MAILER_TIMEOUT_SECS: u64 = 10;
