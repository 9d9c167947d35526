//! Job worker that polls the queue and dispatches claimed jobs.

use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use venda_core::{Job, JobPayload, JobRepository, JobStatus, JobTopic, Result};
use venda_db::Database;

use crate::handler::{HandlerRegistry, JobHandler};
use crate::DEFAULT_POLL_INTERVAL_MS;

/// Configuration for the job worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Polling interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Maximum number of jobs claimed per poll.
    pub batch_size: i64,
    /// Whether to enable job processing.
    pub enabled: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            batch_size: venda_core::defaults::JOB_BATCH_SIZE,
            enabled: true,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `JOB_WORKER_ENABLED` | `true` | Enable/disable job processing |
    /// | `JOB_POLL_INTERVAL_MS` | `2000` | Pause between queue polls (min 1) |
    /// | `JOB_BATCH_SIZE` | `10` | Max jobs claimed per poll (min 1) |
    pub fn from_env() -> Self {
        let enabled = std::env::var("JOB_WORKER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        // An interval of 0 would busy-spin against the database.
        let poll_interval_ms = std::env::var("JOB_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS)
            .max(1);

        let batch_size = std::env::var("JOB_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(venda_core::defaults::JOB_BATCH_SIZE)
            .max(1);

        Self {
            poll_interval_ms,
            batch_size,
            enabled,
        }
    }

    /// Create a new config with custom poll interval.
    pub fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set the claim batch size.
    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Enable or disable job processing.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Event emitted by the job worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// A job was handed to its handler.
    JobStarted { job_id: Uuid, topic: JobTopic },
    /// A job completed successfully.
    JobCompleted { job_id: Uuid, topic: JobTopic },
    /// A job failed.
    JobFailed {
        job_id: Uuid,
        topic: JobTopic,
        error: String,
    },
    /// A claimed job had no registered handler and was released back to
    /// pending.
    JobSkipped { job_id: Uuid, topic: String },
    /// Worker started.
    WorkerStarted,
    /// Worker stopped.
    WorkerStopped,
}

/// Handle for controlling a running worker.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<WorkerEvent>,
}

impl WorkerHandle {
    /// Signal the worker to shut down gracefully.
    ///
    /// A handler already running finishes before the worker stops; no new
    /// batch is claimed afterwards.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| venda_core::Error::Internal("Failed to send shutdown signal".into()))?;
        Ok(())
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_rx.resubscribe()
    }
}

/// Job worker that processes jobs from the queue.
///
/// Each poll claims up to `batch_size` pending jobs (oldest first) and
/// dispatches them strictly one at a time: a handler runs to completion
/// before the next job starts, with no timeout attached. Scaling out means
/// running more worker processes; the claim query keeps concurrent workers
/// disjoint without any coordination beyond the jobs table itself.
pub struct JobWorker {
    db: Database,
    config: WorkerConfig,
    registry: HandlerRegistry,
    event_tx: broadcast::Sender<WorkerEvent>,
}

impl JobWorker {
    /// Create a new job worker over a registry built at startup.
    pub fn new(db: Database, config: WorkerConfig, registry: HandlerRegistry) -> Self {
        let (event_tx, _) = broadcast::channel(venda_core::defaults::EVENT_BUS_CAPACITY);
        Self {
            db,
            config,
            registry,
            event_tx,
        }
    }

    /// Start the worker and return a handle for control.
    pub fn start(self) -> WorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });

        WorkerHandle {
            shutdown_tx,
            event_rx,
        }
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_tx.subscribe()
    }

    /// Run the polling loop until a shutdown signal arrives.
    ///
    /// The first poll happens immediately; every later poll follows a fixed
    /// `poll_interval_ms` pause. A fetch error costs one tick, not the loop.
    #[instrument(skip(self, shutdown_rx))]
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        if !self.config.enabled {
            info!("Job worker is disabled, not starting");
            return;
        }

        info!(
            poll_interval_ms = self.config.poll_interval_ms,
            batch_size = self.config.batch_size,
            topics = ?self.registry.topics(),
            "Job worker started"
        );

        let _ = self.event_tx.send(WorkerEvent::WorkerStarted);

        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);

        loop {
            // Check for shutdown before claiming jobs
            if shutdown_rx.try_recv().is_ok() {
                info!("Job worker received shutdown signal");
                break;
            }

            match self.db.jobs.fetch_pending(self.config.batch_size).await {
                Ok(jobs) if !jobs.is_empty() => {
                    debug!(claimed = jobs.len(), "Processing job batch");
                    for job in jobs {
                        self.dispatch(job).await;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = ?e, "Failed to fetch pending jobs");
                }
            }

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Job worker received shutdown signal");
                    break;
                }
                _ = sleep(poll_interval) => {}
            }
        }

        let _ = self.event_tx.send(WorkerEvent::WorkerStopped);
        info!("Job worker stopped");
    }

    /// Execute a single claimed job and record its outcome.
    async fn dispatch(&self, job: Job) {
        let start = Instant::now();
        let job_id = job.id;

        // A topic nobody handles keeps its job pending indefinitely: the
        // claim is released so a worker that does know the topic can pick
        // the job up later.
        let Some((topic, handler)) = self.resolve(&job.topic) else {
            warn!(?job_id, topic = %job.topic, "No handler registered for topic, releasing claim");
            if let Err(e) = self
                .db
                .jobs
                .update_status(job_id, JobStatus::Pending, None)
                .await
            {
                error!(error = ?e, ?job_id, "Failed to release unhandled job");
            }
            let _ = self.event_tx.send(WorkerEvent::JobSkipped {
                job_id,
                topic: job.topic.clone(),
            });
            return;
        };

        info!(?job_id, %topic, "Processing job");

        let _ = self.event_tx.send(WorkerEvent::JobStarted { job_id, topic });

        // A payload that does not decode fails the job like a handler error.
        let outcome = match JobPayload::decode(topic, &job.payload) {
            Ok(payload) => handler.execute(payload).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                if let Err(e) = self
                    .db
                    .jobs
                    .update_status(job_id, JobStatus::Completed, None)
                    .await
                {
                    error!(error = ?e, ?job_id, "Failed to mark job as completed");
                } else {
                    info!(
                        ?job_id,
                        %topic,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Job completed successfully"
                    );
                    let _ = self
                        .event_tx
                        .send(WorkerEvent::JobCompleted { job_id, topic });
                }
            }
            Err(err) => {
                let error = err.to_string();
                if let Err(e) = self
                    .db
                    .jobs
                    .update_status(job_id, JobStatus::Failed, Some(&error))
                    .await
                {
                    error!(error = ?e, ?job_id, "Failed to mark job as failed");
                } else {
                    warn!(
                        ?job_id,
                        %topic,
                        %error,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Job failed"
                    );
                    let _ = self.event_tx.send(WorkerEvent::JobFailed {
                        job_id,
                        topic,
                        error,
                    });
                }
            }
        }
    }

    /// Find the handler for a raw topic string.
    fn resolve(&self, raw_topic: &str) -> Option<(JobTopic, &std::sync::Arc<dyn JobHandler>)> {
        let topic = JobTopic::parse(raw_topic)?;
        let handler = self.registry.get(topic)?;
        Some((topic, handler))
    }
}

/// Builder for creating a job worker with handlers.
pub struct WorkerBuilder {
    db: Database,
    config: WorkerConfig,
    registry: HandlerRegistry,
}

impl WorkerBuilder {
    /// Create a new worker builder.
    pub fn new(db: Database) -> Self {
        Self {
            db,
            config: WorkerConfig::default(),
            registry: HandlerRegistry::new(),
        }
    }

    /// Set the worker configuration.
    pub fn with_config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a handler, keyed by its own topic.
    pub fn with_handler<H: JobHandler + 'static>(mut self, handler: H) -> Self {
        self.registry.register(std::sync::Arc::new(handler));
        self
    }

    /// Replace the registry wholesale. Handlers added earlier are dropped.
    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Build and return the worker.
    pub fn build(self) -> JobWorker {
        JobWorker::new(self.db, self.config, self.registry)
    }
}
