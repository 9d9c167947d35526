//! Integration tests for JobWorker functionality.
//!
//! This test suite validates:
//! - Worker claims pending jobs and drives them to a terminal status
//! - Batch dispatch runs oldest-first, one job at a time
//! - Disabled worker never touches the queue
//! - Event broadcasting (started/completed/failed/skipped, lifecycle)
//! - Jobs without a registered handler are released and stay pending
//! - Unknown topic strings are released and stay pending
//! - Malformed payloads fail the job with the error recorded
//! - Stock update jobs decrement real product rows, and insufficient stock
//!   fails the job without touching the row
//! - Email notification jobs write a notification record and flip it to
//!   sent only after the relay accepts the message
//! - Two workers over the same queue never dispatch a job twice
//! - A store outage mid-run costs ticks, not the loop; work resumes once
//!   the store is back
//! - Shutdown lets the in-flight job finish before the worker stops
//!
//! **IMPORTANT**: These tests require a running PostgreSQL instance reachable
//! via `DATABASE_URL`; each test provisions its own schema.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::time::sleep;
use uuid::Uuid;

use venda_db::test_fixtures::TestDatabase;
use venda_db::{Database, PgProductRepository};
use venda_jobs::{
    EmailNotificationHandler, JobHandler, JobPayload, JobRepository, JobStatus, JobTopic, Mailer,
    MailerConfig, NoOpHandler, NotificationKind, NotificationPayload, NotificationStatus,
    Notifier, StockUpdateHandler, StockUpdatePayload, WorkerBuilder, WorkerConfig, WorkerEvent,
};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn stock_payload(product_id: i64, quantity: i64) -> JobPayload {
    JobPayload::StockUpdate(StockUpdatePayload {
        product_id,
        quantity,
    })
}

fn email_payload(receiver_id: i64) -> JobPayload {
    JobPayload::EmailNotification(NotificationPayload {
        receiver_id,
        receiver_email: "buyer@example.com".to_string(),
        subject: "Order shipped".to_string(),
        message: "Your order is on its way".to_string(),
        kind: NotificationKind::Email,
    })
}

/// Rewrite a job's created_at so ordering tests don't depend on insert
/// timing resolution.
async fn backdate(db: &Database, job_id: Uuid, seconds_ago: f64) {
    sqlx::query("UPDATE jobs SET created_at = now() - make_interval(secs => $2) WHERE id = $1")
        .bind(job_id)
        .bind(seconds_ago)
        .execute(&db.pool)
        .await
        .expect("Failed to backdate job");
}

/// Insert a raw job row, bypassing the typed enqueue path.
async fn insert_raw_job(db: &Database, topic: &str, payload: serde_json::Value) -> Uuid {
    let job_id = Uuid::now_v7();
    sqlx::query(
        "INSERT INTO jobs (id, topic, payload, status, created_at, updated_at)
         VALUES ($1, $2, $3, 'pending'::job_status, now(), now())",
    )
    .bind(job_id)
    .bind(topic)
    .bind(payload)
    .execute(&db.pool)
    .await
    .expect("Failed to insert raw job");
    job_id
}

/// Wait for a job to reach a specific status.
async fn wait_for_job_status(
    db: &Database,
    job_id: Uuid,
    expected_status: JobStatus,
    timeout_secs: u64,
) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed().as_secs() < timeout_secs {
        if let Ok(Some(job)) = db.jobs.get(job_id).await {
            if job.status == expected_status {
                return true;
            }
        }
        sleep(Duration::from_millis(100)).await;
    }
    false
}

/// Bind a throwaway HTTP endpoint that accepts every request with 200.
async fn spawn_accepting_relay() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind relay listener");
    let addr = listener.local_addr().expect("Relay has no local addr");

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                    )
                    .await;
            });
        }
    });

    format!("http://{}/api/send", addr)
}

/// Handler that records every payload it sees, with an optional delay to
/// keep executions overlapping in time.
struct TrackingHandler {
    topic: JobTopic,
    seen: Arc<Mutex<Vec<JobPayload>>>,
    delay_ms: u64,
}

impl TrackingHandler {
    fn new(topic: JobTopic) -> (Self, Arc<Mutex<Vec<JobPayload>>>) {
        Self::with_delay(topic, 0)
    }

    fn with_delay(topic: JobTopic, delay_ms: u64) -> (Self, Arc<Mutex<Vec<JobPayload>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                topic,
                seen: seen.clone(),
                delay_ms,
            },
            seen,
        )
    }
}

#[async_trait::async_trait]
impl JobHandler for TrackingHandler {
    fn topic(&self) -> JobTopic {
        self.topic
    }

    async fn execute(&self, payload: JobPayload) -> venda_jobs::Result<()> {
        if self.delay_ms > 0 {
            sleep(Duration::from_millis(self.delay_ms)).await;
        }
        self.seen.lock().await.push(payload);
        Ok(())
    }
}

// ============================================================================
// INTEGRATION TESTS - Worker Lifecycle
// ============================================================================

#[tokio::test]
#[ignore] // Requires PostgreSQL via DATABASE_URL
async fn test_worker_processes_single_job() {
    let t = TestDatabase::new().await.unwrap();

    let job_id = t.db.jobs.enqueue(&stock_payload(1, 1)).await.unwrap();

    let worker = WorkerBuilder::new(t.db.clone())
        .with_config(WorkerConfig::default().with_poll_interval(100))
        .with_handler(NoOpHandler::new(JobTopic::StockUpdate))
        .build();

    let handle = worker.start();

    let completed = wait_for_job_status(&t.db, job_id, JobStatus::Completed, 5).await;
    assert!(completed, "Job should complete within timeout");

    let job = t.db.jobs.get(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.error_message.is_none());

    handle.shutdown().await.unwrap();
    t.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires PostgreSQL via DATABASE_URL
async fn test_worker_processes_batch_oldest_first() {
    let t = TestDatabase::new().await.unwrap();

    let mut ids = Vec::new();
    for i in 1..=3 {
        let id = t.db.jobs.enqueue(&stock_payload(i, 1)).await.unwrap();
        // Oldest gets the largest offset.
        backdate(&t.db, id, (100 - i) as f64).await;
        ids.push(id);
    }

    let (handler, seen) = TrackingHandler::new(JobTopic::StockUpdate);
    let worker = WorkerBuilder::new(t.db.clone())
        .with_config(WorkerConfig::default().with_poll_interval(100))
        .with_handler(handler)
        .build();

    let handle = worker.start();

    for id in &ids {
        assert!(
            wait_for_job_status(&t.db, *id, JobStatus::Completed, 10).await,
            "All jobs should complete"
        );
    }

    let seen = seen.lock().await;
    let product_ids: Vec<i64> = seen
        .iter()
        .map(|p| match p {
            JobPayload::StockUpdate(s) => s.product_id,
            other => panic!("unexpected payload: {:?}", other),
        })
        .collect();
    assert_eq!(product_ids, vec![1, 2, 3], "Dispatch should be oldest-first");

    handle.shutdown().await.unwrap();
    t.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires PostgreSQL via DATABASE_URL
async fn test_worker_disabled_does_not_process_jobs() {
    let t = TestDatabase::new().await.unwrap();

    let job_id = t.db.jobs.enqueue(&stock_payload(1, 1)).await.unwrap();

    let worker = WorkerBuilder::new(t.db.clone())
        .with_config(WorkerConfig::default().with_enabled(false))
        .with_handler(NoOpHandler::new(JobTopic::StockUpdate))
        .build();

    let handle = worker.start();

    sleep(Duration::from_millis(500)).await;

    let job = t.db.jobs.get(job_id).await.unwrap().unwrap();
    assert_eq!(
        job.status,
        JobStatus::Pending,
        "Job should not be processed by disabled worker"
    );

    // Disabled workers have no running loop to shut down - ignore errors
    let _ = handle.shutdown().await;
    t.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires PostgreSQL via DATABASE_URL
async fn test_worker_handles_empty_queue() {
    let t = TestDatabase::new().await.unwrap();

    let worker = WorkerBuilder::new(t.db.clone())
        .with_config(WorkerConfig::default().with_poll_interval(100))
        .with_handler(NoOpHandler::new(JobTopic::StockUpdate))
        .build();

    let handle = worker.start();

    // Several empty polls; should not panic or error
    sleep(Duration::from_millis(500)).await;

    handle.shutdown().await.unwrap();
    t.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires PostgreSQL via DATABASE_URL
async fn test_worker_survives_store_outage() {
    let t = TestDatabase::new().await.unwrap();

    let worker = WorkerBuilder::new(t.db.clone())
        .with_config(WorkerConfig::default().with_poll_interval(100))
        .with_handler(NoOpHandler::new(JobTopic::StockUpdate))
        .build();

    let mut events = worker.events();
    let handle = worker.start();

    // Let at least one poll succeed, then take the jobs table away. Renaming
    // keeps the schema intact for the restore below.
    sleep(Duration::from_millis(250)).await;
    sqlx::query("ALTER TABLE jobs RENAME TO jobs_offline")
        .execute(&t.db.pool)
        .await
        .unwrap();

    // Several polls fail against the missing table.
    sleep(Duration::from_millis(500)).await;

    // The outage costs ticks, never the loop.
    while let Ok(event) = events.try_recv() {
        assert!(
            !matches!(event, WorkerEvent::WorkerStopped),
            "Worker must not stop on a fetch error"
        );
    }

    // Restore the store; the next tick picks work back up.
    sqlx::query("ALTER TABLE jobs_offline RENAME TO jobs")
        .execute(&t.db.pool)
        .await
        .unwrap();

    let job_id = t.db.jobs.enqueue(&stock_payload(1, 1)).await.unwrap();
    let completed = wait_for_job_status(&t.db, job_id, JobStatus::Completed, 5).await;
    assert!(completed, "Worker should resume once the store is back");

    handle.shutdown().await.unwrap();
    t.cleanup().await.unwrap();
}

// ============================================================================
// INTEGRATION TESTS - Event Broadcasting
// ============================================================================

#[tokio::test]
#[ignore] // Requires PostgreSQL via DATABASE_URL
async fn test_worker_broadcasts_events() {
    let t = TestDatabase::new().await.unwrap();

    let job_id = t.db.jobs.enqueue(&stock_payload(1, 1)).await.unwrap();

    let worker = WorkerBuilder::new(t.db.clone())
        .with_config(WorkerConfig::default().with_poll_interval(100))
        .with_handler(NoOpHandler::new(JobTopic::StockUpdate))
        .build();

    let mut events = worker.events();
    let handle = worker.start();

    let mut received_events = Vec::new();
    let timeout = Duration::from_secs(10);
    let start = std::time::Instant::now();

    let mut has_job_completed = false;
    while start.elapsed() < timeout && !has_job_completed {
        tokio::select! {
            event = events.recv() => {
                if let Ok(event) = event {
                    if matches!(&event, WorkerEvent::JobCompleted { job_id: id, .. } if *id == job_id) {
                        has_job_completed = true;
                    }
                    received_events.push(event);
                }
            }
            _ = sleep(Duration::from_millis(50)) => {}
        }
    }

    let has_worker_started = received_events
        .iter()
        .any(|e| matches!(e, WorkerEvent::WorkerStarted));
    let has_job_started = received_events
        .iter()
        .any(|e| matches!(e, WorkerEvent::JobStarted { job_id: id, .. } if *id == job_id));

    assert!(has_worker_started, "Should receive WorkerStarted event");
    assert!(has_job_started, "Should receive JobStarted event");
    assert!(has_job_completed, "Should receive JobCompleted event");

    handle.shutdown().await.unwrap();
    t.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires PostgreSQL via DATABASE_URL
async fn test_worker_broadcasts_failed_event() {
    let t = TestDatabase::new().await.unwrap();

    // Product with too little stock for the job below.
    let product_id = t
        .db
        .products
        .create("Widget", sqlx::types::BigDecimal::from(10), 1)
        .await
        .unwrap();
    let job_id = t.db.jobs.enqueue(&stock_payload(product_id, 3)).await.unwrap();

    let inventory = Arc::new(PgProductRepository::new(t.db.pool.clone()));
    let worker = WorkerBuilder::new(t.db.clone())
        .with_config(WorkerConfig::default().with_poll_interval(100))
        .with_handler(StockUpdateHandler::new(inventory))
        .build();

    let mut events = worker.events();
    let handle = worker.start();

    let mut received_failed = false;
    let timeout = Duration::from_secs(5);
    let start = std::time::Instant::now();

    while start.elapsed() < timeout && !received_failed {
        tokio::select! {
            event = events.recv() => {
                if let Ok(WorkerEvent::JobFailed { job_id: id, error, .. }) = event {
                    if id == job_id {
                        assert!(error.contains("Insufficient stock"));
                        received_failed = true;
                    }
                }
            }
            _ = sleep(Duration::from_millis(50)) => {}
        }
    }

    assert!(received_failed, "Should receive JobFailed event");

    // The failure is recorded and the stock row is untouched.
    let job = t.db.jobs.get(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error_message.unwrap().contains("Insufficient stock"));
    let product = t.db.products.get(product_id).await.unwrap().unwrap();
    assert_eq!(product.stock, 1);

    handle.shutdown().await.unwrap();
    t.cleanup().await.unwrap();
}

// ============================================================================
// INTEGRATION TESTS - Unhandled Topics
// ============================================================================

#[tokio::test]
#[ignore] // Requires PostgreSQL via DATABASE_URL
async fn test_worker_releases_jobs_without_handler() {
    let t = TestDatabase::new().await.unwrap();

    // The worker only handles stock updates; this job has no handler.
    let job_id = t.db.jobs.enqueue(&email_payload(7)).await.unwrap();

    let worker = WorkerBuilder::new(t.db.clone())
        .with_config(WorkerConfig::default().with_poll_interval(100))
        .with_handler(NoOpHandler::new(JobTopic::StockUpdate))
        .build();

    let mut events = worker.events();
    let handle = worker.start();

    // Each poll claims the job, finds no handler, and releases it.
    sleep(Duration::from_millis(600)).await;

    let job = t.db.jobs.get(job_id).await.unwrap().unwrap();
    assert_eq!(
        job.status,
        JobStatus::Pending,
        "Job should stay pending until a handler exists"
    );
    assert!(job.error_message.is_none());

    let mut skipped = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(&event, WorkerEvent::JobSkipped { job_id: id, .. } if *id == job_id) {
            skipped += 1;
        }
    }
    assert!(skipped >= 1, "Each claim of an unhandled job emits a skip event");

    handle.shutdown().await.unwrap();
    t.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires PostgreSQL via DATABASE_URL
async fn test_worker_releases_unknown_topic() {
    let t = TestDatabase::new().await.unwrap();

    // Written by some newer producer this worker doesn't know about.
    let job_id = insert_raw_job(&t.db, "report_generation", serde_json::json!({})).await;

    let worker = WorkerBuilder::new(t.db.clone())
        .with_config(WorkerConfig::default().with_poll_interval(100))
        .with_handler(NoOpHandler::new(JobTopic::StockUpdate))
        .with_handler(NoOpHandler::new(JobTopic::EmailNotification))
        .build();

    let handle = worker.start();

    sleep(Duration::from_millis(600)).await;

    let job = t.db.jobs.get(job_id).await.unwrap().unwrap();
    assert_eq!(job.topic, "report_generation");
    assert_eq!(job.status, JobStatus::Pending);

    handle.shutdown().await.unwrap();
    t.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires PostgreSQL via DATABASE_URL
async fn test_malformed_payload_fails_job() {
    let t = TestDatabase::new().await.unwrap();

    let job_id = insert_raw_job(
        &t.db,
        "stock_update",
        serde_json::json!({"unexpected": true}),
    )
    .await;

    let worker = WorkerBuilder::new(t.db.clone())
        .with_config(WorkerConfig::default().with_poll_interval(100))
        .with_handler(NoOpHandler::new(JobTopic::StockUpdate))
        .build();

    let handle = worker.start();

    let failed = wait_for_job_status(&t.db, job_id, JobStatus::Failed, 5).await;
    assert!(failed, "Undecodable payload should fail the job");

    let job = t.db.jobs.get(job_id).await.unwrap().unwrap();
    assert!(job.error_message.is_some(), "Error message should be set");

    handle.shutdown().await.unwrap();
    t.cleanup().await.unwrap();
}

// ============================================================================
// INTEGRATION TESTS - End-to-End Handlers
// ============================================================================

#[tokio::test]
#[ignore] // Requires PostgreSQL via DATABASE_URL
async fn test_stock_update_job_decrements_product() {
    let t = TestDatabase::new().await.unwrap();

    let product_id = t
        .db
        .products
        .create("Widget", sqlx::types::BigDecimal::from(10), 10)
        .await
        .unwrap();
    let job_id = t.db.jobs.enqueue(&stock_payload(product_id, 3)).await.unwrap();

    let inventory = Arc::new(PgProductRepository::new(t.db.pool.clone()));
    let worker = WorkerBuilder::new(t.db.clone())
        .with_config(WorkerConfig::default().with_poll_interval(100))
        .with_handler(StockUpdateHandler::new(inventory))
        .build();

    let handle = worker.start();

    let completed = wait_for_job_status(&t.db, job_id, JobStatus::Completed, 5).await;
    assert!(completed, "Stock update job should complete");

    let product = t.db.products.get(product_id).await.unwrap().unwrap();
    assert_eq!(product.stock, 7);

    handle.shutdown().await.unwrap();
    t.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires PostgreSQL via DATABASE_URL
async fn test_email_notification_job_records_and_sends() {
    let t = TestDatabase::new().await.unwrap();

    let endpoint = spawn_accepting_relay().await;
    let mailer = Mailer::new(MailerConfig {
        endpoint,
        from: "no-reply@venda.dev".to_string(),
        timeout_secs: 2,
    });
    let notifier = Arc::new(Notifier::new(t.db.clone(), mailer));

    let job_id = t.db.jobs.enqueue(&email_payload(42)).await.unwrap();

    let worker = WorkerBuilder::new(t.db.clone())
        .with_config(WorkerConfig::default().with_poll_interval(100))
        .with_handler(EmailNotificationHandler::new(notifier))
        .build();

    let handle = worker.start();

    let completed = wait_for_job_status(&t.db, job_id, JobStatus::Completed, 5).await;
    assert!(completed, "Email job should complete when the relay accepts");

    let (notification_id,): (i64,) =
        sqlx::query_as("SELECT id FROM notifications WHERE receiver_id = 42")
            .fetch_one(&t.db.pool)
            .await
            .unwrap();
    let notification = t
        .db
        .notifications
        .get(notification_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(notification.status, NotificationStatus::Sent);
    assert!(notification.sent_at.is_some());
    assert_eq!(
        notification.receiver_email.as_deref(),
        Some("buyer@example.com")
    );

    handle.shutdown().await.unwrap();
    t.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires PostgreSQL via DATABASE_URL
async fn test_email_delivery_failure_leaves_record_pending() {
    let t = TestDatabase::new().await.unwrap();

    // Nothing listens on this port; delivery is refused.
    let mailer = Mailer::new(MailerConfig {
        endpoint: "http://127.0.0.1:1/api/send".to_string(),
        from: "no-reply@venda.dev".to_string(),
        timeout_secs: 1,
    });
    let notifier = Arc::new(Notifier::new(t.db.clone(), mailer));

    let job_id = t.db.jobs.enqueue(&email_payload(42)).await.unwrap();

    let worker = WorkerBuilder::new(t.db.clone())
        .with_config(WorkerConfig::default().with_poll_interval(100))
        .with_handler(EmailNotificationHandler::new(notifier))
        .build();

    let handle = worker.start();

    let failed = wait_for_job_status(&t.db, job_id, JobStatus::Failed, 5).await;
    assert!(failed, "Email job should fail when delivery fails");

    let job = t.db.jobs.get(job_id).await.unwrap().unwrap();
    assert!(job.error_message.unwrap().contains("Mail relay"));

    // The record survives as the audit trail, still pending.
    let (notification_id,): (i64,) =
        sqlx::query_as("SELECT id FROM notifications WHERE receiver_id = 42")
            .fetch_one(&t.db.pool)
            .await
            .unwrap();
    let notification = t
        .db
        .notifications
        .get(notification_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(notification.status, NotificationStatus::Pending);
    assert!(notification.sent_at.is_none());

    handle.shutdown().await.unwrap();
    t.cleanup().await.unwrap();
}

// ============================================================================
// INTEGRATION TESTS - Job Claiming (SKIP LOCKED)
// ============================================================================

#[tokio::test]
#[ignore] // Requires PostgreSQL via DATABASE_URL
async fn test_concurrent_workers_claim_different_jobs() {
    let t = TestDatabase::new().await.unwrap();

    let mut job_ids = Vec::new();
    for i in 1..=5 {
        job_ids.push(t.db.jobs.enqueue(&stock_payload(i, 1)).await.unwrap());
    }

    // Slow handlers keep the two workers overlapping in time.
    let (handler1, seen1) = TrackingHandler::with_delay(JobTopic::StockUpdate, 300);
    let (handler2, seen2) = TrackingHandler::with_delay(JobTopic::StockUpdate, 300);

    let worker1 = WorkerBuilder::new(t.db.clone())
        .with_config(WorkerConfig::default().with_poll_interval(50))
        .with_handler(handler1)
        .build();
    let worker2 = WorkerBuilder::new(t.db.clone())
        .with_config(WorkerConfig::default().with_poll_interval(50))
        .with_handler(handler2)
        .build();

    let handle1 = worker1.start();
    let handle2 = worker2.start();

    for job_id in &job_ids {
        assert!(
            wait_for_job_status(&t.db, *job_id, JobStatus::Completed, 15).await,
            "All jobs should complete with concurrent workers"
        );
    }

    // SKIP LOCKED keeps the claims disjoint: every job ran exactly once.
    let executions = seen1.lock().await.len() + seen2.lock().await.len();
    assert_eq!(executions, 5, "Exactly 5 executions across both workers");

    handle1.shutdown().await.unwrap();
    handle2.shutdown().await.unwrap();
    t.cleanup().await.unwrap();
}

// ============================================================================
// INTEGRATION TESTS - Graceful Shutdown
// ============================================================================

#[tokio::test]
#[ignore] // Requires PostgreSQL via DATABASE_URL
async fn test_worker_shutdown_finishes_running_job() {
    let t = TestDatabase::new().await.unwrap();

    let job_id = t.db.jobs.enqueue(&stock_payload(1, 1)).await.unwrap();

    let (handler, _) = TrackingHandler::with_delay(JobTopic::StockUpdate, 1500);
    let worker = WorkerBuilder::new(t.db.clone())
        .with_config(WorkerConfig::default().with_poll_interval(50))
        .with_handler(handler)
        .build();

    let mut events = worker.events();
    let handle = worker.start();

    // Wait for the job to start
    let mut job_started = false;
    let timeout = Duration::from_secs(3);
    let start = std::time::Instant::now();

    while start.elapsed() < timeout && !job_started {
        tokio::select! {
            event = events.recv() => {
                if let Ok(WorkerEvent::JobStarted { .. }) = event {
                    job_started = true;
                }
            }
            _ = sleep(Duration::from_millis(50)) => {}
        }
    }

    assert!(job_started, "Job should start");

    // Shutdown while the handler is mid-flight
    handle.shutdown().await.unwrap();

    // The running job finishes before the worker stops
    let completed = wait_for_job_status(&t.db, job_id, JobStatus::Completed, 5).await;
    assert!(completed, "In-flight job should finish despite shutdown");

    // The stop event follows; the channel closes right after it.
    let stopped = tokio::time::timeout(Duration::from_secs(5), async {
        while let Ok(event) = events.recv().await {
            if matches!(event, WorkerEvent::WorkerStopped) {
                return true;
            }
        }
        false
    })
    .await
    .unwrap_or(false);
    assert!(stopped, "Should receive WorkerStopped event");

    t.cleanup().await.unwrap();
}
