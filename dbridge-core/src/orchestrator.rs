//! Launch-and-bridge orchestration
//!
//! Sequences one run: free the port, launch the target, wait for the
//! announcement, discover the session, bridge to a URL. Owns the single
//! tracked child and guarantees it can be killed from any exit path.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::announce::DebugAddress;
use crate::bridge;
use crate::discovery::{Discoverer, SelectionStrategy};
use crate::error::{LaunchError, Result};
use crate::port;
use crate::supervisor::{ChildHandle, LaunchRequest, OutputSink, StdoutSink, Supervisor};

/// Tunables for one orchestration run.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Deadline for the requested port to become free
    pub port_timeout: Duration,
    /// Additional discovery attempts after the first failure
    pub discovery_retries: u32,
    /// Delay between discovery attempts
    pub discovery_retry_delay: Duration,
    /// Session selection policy
    pub selection: SelectionStrategy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            port_timeout: port::DEFAULT_STARTUP_TIMEOUT,
            discovery_retries: 1,
            discovery_retry_delay: Duration::from_millis(500),
            selection: SelectionStrategy::First,
        }
    }
}

/// One orchestrator per process; no concurrent runs.
pub struct Orchestrator {
    config: OrchestratorConfig,
    supervisor: Supervisor,
    discoverer: Discoverer,
    child: ChildHandle,
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig, sink: Arc<dyn OutputSink>) -> Self {
        let discoverer = Discoverer::new(config.selection);
        Self {
            config,
            supervisor: Supervisor::new(sink),
            discoverer,
            child: ChildHandle::new(),
        }
    }

    /// Handle to the tracked child, for exit hooks and signal handlers.
    pub fn child(&self) -> ChildHandle {
        self.child.clone()
    }

    /// Run one launch-and-bridge sequence and return the debugging URL.
    ///
    /// On any error the child stays tracked; callers must run [`shutdown`]
    /// (or drop the process, where `kill_on_drop` backstops) before exiting.
    ///
    /// [`shutdown`]: Orchestrator::shutdown
    pub async fn run(&self, request: &LaunchRequest) -> Result<String> {
        // A fresh run never inherits a child from a previous one.
        self.child.kill().await;

        port::wait_until_free(&request.host, request.port, self.config.port_timeout).await?;

        let address = self.supervisor.launch(request, &self.child).await?;
        tracing::info!(%address, "target launched, discovering session");

        self.discover_with_retry(&address).await
    }

    /// Kill the tracked child. Safe to call repeatedly and from any exit path.
    pub async fn shutdown(&self) {
        self.child.kill().await;
    }

    async fn discover_with_retry(&self, address: &DebugAddress) -> Result<String> {
        let mut attempts_left = self.config.discovery_retries + 1;
        loop {
            attempts_left -= 1;
            match self.discover_once(address).await {
                Ok(url) => return Ok(url),
                Err(e) if attempts_left > 0 && is_retryable(&e) => {
                    tracing::debug!(error = %e, attempts_left, "discovery failed, retrying");
                    sleep(self.config.discovery_retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn discover_once(&self, address: &DebugAddress) -> Result<String> {
        let session = self.discoverer.discover(address).await?;
        bridge::bridge(&session, &address.host, address.port)
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(OrchestratorConfig::default(), Arc::new(StdoutSink))
    }
}

/// Any failure after a successful launch is retried; launch-phase failures
/// are not (the child is gone or never existed).
fn is_retryable(error: &LaunchError) -> bool {
    matches!(
        error,
        LaunchError::Discovery { .. }
            | LaunchError::NoSessions
            | LaunchError::Http(_)
            | LaunchError::BadDescriptor(_)
    )
}
