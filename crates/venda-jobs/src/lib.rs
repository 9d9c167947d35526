//! # venda-jobs
//!
//! Background job processing for venda.
//!
//! This crate provides:
//! - Polling worker that claims batches of pending jobs under row locks
//! - Topic-keyed handler registry, fixed at startup
//! - Handlers for stock updates and email notifications
//! - Mail relay client backing the notification path
//!
//! Delivery is at-least-once: a crash between a handler's side effect and
//! the terminal status write re-runs the job, so handlers must tolerate
//! duplicates.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use venda_db::{Database, PgProductRepository};
//! use venda_jobs::{
//!     EmailNotificationHandler, Mailer, Notifier, StockUpdateHandler, WorkerBuilder,
//!     WorkerConfig,
//! };
//!
//! let db = Database::connect("postgres://...").await?;
//!
//! let inventory = Arc::new(PgProductRepository::new(db.pool().clone()));
//! let notifier = Arc::new(Notifier::new(db.clone(), Mailer::from_env()));
//!
//! // Create worker with handlers
//! let worker = WorkerBuilder::new(db)
//!     .with_config(WorkerConfig::from_env())
//!     .with_handler(StockUpdateHandler::new(inventory))
//!     .with_handler(EmailNotificationHandler::new(notifier))
//!     .build();
//!
//! // Start worker and get handle
//! let handle = worker.start();
//!
//! // Listen for events
//! let mut events = handle.events();
//! while let Ok(event) = events.recv().await {
//!     println!("Event: {:?}", event);
//! }
//!
//! // Graceful shutdown
//! handle.shutdown().await?;
//! ```

pub mod email_notification_handler;
pub mod handler;
pub mod mailer;
pub mod notifier;
pub mod stock_update_handler;
pub mod worker;

// Re-export core types
pub use venda_core::*;

// Re-export job processing types
pub use email_notification_handler::EmailNotificationHandler;
pub use handler::{HandlerRegistry, JobHandler, NoOpHandler};
pub use mailer::{Mailer, MailerConfig};
pub use notifier::Notifier;
pub use stock_update_handler::StockUpdateHandler;
pub use worker::{JobWorker, WorkerBuilder, WorkerConfig, WorkerEvent, WorkerHandle};

/// Default polling interval for job processing (milliseconds).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = venda_core::defaults::JOB_POLL_INTERVAL_MS;

/// Default number of jobs claimed per poll.
pub const DEFAULT_BATCH_SIZE: i64 = venda_core::defaults::JOB_BATCH_SIZE;
