//! Job handler contract and the topic registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use venda_core::{JobPayload, JobTopic, Result};

/// Trait for job handlers.
///
/// A handler receives the already-decoded payload for its topic and performs
/// the side effect. Delivery is at-least-once, so the same logical job can
/// reach a handler more than once; side effects must tolerate repetition.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// The topic this handler processes.
    fn topic(&self) -> JobTopic;

    /// Execute the job.
    ///
    /// `Ok(())` marks the job completed. `Err` marks it failed, with the
    /// error's display text recorded on the job row.
    async fn execute(&self, payload: JobPayload) -> Result<()>;
}

/// Registry mapping job topics to their handler implementations.
///
/// Built once at startup and handed to the worker; lookups are plain reads
/// with no locking.
pub struct HandlerRegistry {
    handlers: HashMap<JobTopic, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler. Replaces any existing handler for the same topic.
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        self.handlers.insert(handler.topic(), handler);
    }

    /// Get the handler registered for the given topic.
    pub fn get(&self, topic: JobTopic) -> Option<&Arc<dyn JobHandler>> {
        self.handlers.get(&topic)
    }

    /// List all topics that have a registered handler.
    pub fn topics(&self) -> Vec<JobTopic> {
        self.handlers.keys().copied().collect()
    }

    /// Check if a handler is registered for the given topic.
    pub fn has_handler(&self, topic: JobTopic) -> bool {
        self.handlers.contains_key(&topic)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// No-op handler for testing.
pub struct NoOpHandler {
    topic: JobTopic,
}

impl NoOpHandler {
    /// Create a new no-op handler for the given topic.
    pub fn new(topic: JobTopic) -> Self {
        Self { topic }
    }
}

#[async_trait]
impl JobHandler for NoOpHandler {
    fn topic(&self) -> JobTopic {
        self.topic
    }

    async fn execute(&self, _payload: JobPayload) -> Result<()> {
        Ok(())
    }
}
