// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness wiring a full in-memory runtime: temp SQLite, memory
//! engine, mock executors, and a live router.

use std::sync::Arc;
use std::time::Duration;

use murmur_config::{MemoryConfig, QueueConfig, RoutingConfig};
use murmur_core::{ExecutorStatus, MurmurError, TaskEvent, TaskRequest};
use murmur_memory::MemoryEngine;
use murmur_router::{Executors, Router, RouterHandle};
use murmur_storage::Database;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::mock_engine::{MockCloud, MockEngine};

/// A complete in-memory runtime for end-to-end tests.
pub struct TestHarness {
    pub router: RouterHandle,
    pub memory: Arc<MemoryEngine>,
    pub db: Database,
    pub shutdown: CancellationToken,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::default()
    }

    /// Submit one message and wait for its response text.
    pub async fn send_message(&self, text: &str) -> Result<String, MurmurError> {
        self.router
            .submit_and_wait(
                TaskRequest {
                    channel: "test".to_string(),
                    user: "tester".to_string(),
                    text: text.to_string(),
                    metadata: Default::default(),
                },
                Some(Duration::from_secs(10)),
            )
            .await
    }

    /// Subscribe to the router's event bus.
    pub fn events(&self) -> broadcast::Receiver<TaskEvent> {
        self.router.subscribe()
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Builder with mock-executor and config knobs.
pub struct TestHarnessBuilder {
    routing: RoutingConfig,
    queue: QueueConfig,
    memory: MemoryConfig,
    engine_responses: Vec<String>,
    cloud_responses: Option<Vec<String>>,
    token_delay: Duration,
    local_loaded: bool,
    cloud_available: bool,
}

impl Default for TestHarnessBuilder {
    fn default() -> Self {
        Self {
            routing: RoutingConfig::default(),
            queue: QueueConfig::default(),
            memory: MemoryConfig::default(),
            engine_responses: vec![],
            cloud_responses: None,
            token_delay: Duration::ZERO,
            local_loaded: true,
            cloud_available: false,
        }
    }
}

impl TestHarnessBuilder {
    pub fn with_routing(mut self, routing: RoutingConfig) -> Self {
        self.routing = routing;
        self
    }

    pub fn with_queue_depth(mut self, max_depth: usize) -> Self {
        self.queue.max_depth = max_depth;
        self
    }

    pub fn with_memory_config(mut self, memory: MemoryConfig) -> Self {
        self.memory = memory;
        self
    }

    /// FIFO responses for the mock local engine.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.engine_responses = responses;
        self
    }

    /// Enable the mock cloud executor with its own FIFO responses.
    pub fn with_cloud_responses(mut self, responses: Vec<String>) -> Self {
        self.cloud_responses = Some(responses);
        self.cloud_available = true;
        self
    }

    /// Delay between mock tokens, for preemption/cancellation tests.
    pub fn with_token_delay(mut self, delay: Duration) -> Self {
        self.token_delay = delay;
        self
    }

    pub fn with_executor_status(mut self, local: bool, cloud: bool) -> Self {
        self.local_loaded = local;
        self.cloud_available = cloud;
        self
    }

    pub async fn build(self) -> Result<TestHarness, MurmurError> {
        let db = Database::open_in_memory().await?;
        let memory = MemoryEngine::new(db.clone(), self.memory).await?;

        let engine =
            MockEngine::with_responses(self.engine_responses).with_token_delay(self.token_delay);
        let cloud = self.cloud_responses.map(|responses| {
            Arc::new(MockCloud::with_responses(responses).with_token_delay(self.token_delay))
                as Arc<dyn murmur_core::CloudDispatcher>
        });

        let shutdown = CancellationToken::new();
        let router = Router::spawn(
            self.routing,
            &self.queue,
            memory.clone(),
            Executors {
                engine: Some(Arc::new(engine)),
                cloud,
            },
            ExecutorStatus {
                local_model_loaded: self.local_loaded,
                cloud_available: self.cloud_available,
            },
            shutdown.clone(),
        );

        Ok(TestHarness {
            router,
            memory,
            db,
            shutdown,
        })
    }
}
