//! Lifecycle supervision of the worker subprocess.
//!
//! The supervisor owns at most one worker process per gateway lifetime.
//! Lifecycle: `NotStarted → Starting → Running → Stopped`. All transitions
//! happen under one async mutex held across spawn and readiness polling,
//! so concurrent start attempts wait on the same in-flight start instead
//! of racing each other into a double spawn on one port.
//!
//! Readiness is the worker's `GET /health` endpoint answering 200, bounded
//! by a start timeout. A worker that dies after reaching `Running` is not
//! restarted; requests fail at the transport stage until the gateway
//! itself restarts.

use std::path::PathBuf;
use std::time::Duration;

use tally_config::WorkerSettings;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

const HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(thiserror::Error, Debug)]
pub enum SupervisorError {
    #[error("failed to spawn worker process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("worker did not become ready within {0:?}")]
    StartTimeout(Duration),

    #[error("supervisor is shut down")]
    ShutDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    NotStarted,
    Starting,
    Running,
    Stopped,
}

struct Inner {
    lifecycle: Lifecycle,
    child: Option<Child>,
}

pub struct WorkerSupervisor {
    inner: Mutex<Inner>,
    settings: WorkerSettings,
    http: reqwest::Client,
}

impl WorkerSupervisor {
    /// Builds a supervisor. When `WORKER_URL` is configured the supervisor
    /// attaches to that externally managed worker: the lifecycle starts at
    /// `Running` and nothing is ever spawned or killed.
    pub fn new(settings: WorkerSettings) -> Self {
        let lifecycle = if settings.url.is_some() {
            Lifecycle::Running
        } else {
            Lifecycle::NotStarted
        };
        Self {
            inner: Mutex::new(Inner { lifecycle, child: None }),
            http: reqwest::Client::new(),
            settings,
        }
    }

    /// Base URL the gateway should send queries to.
    pub fn base_url(&self) -> String {
        self.settings.base_url()
    }

    pub async fn lifecycle(&self) -> Lifecycle {
        self.inner.lock().await.lifecycle
    }

    /// Makes sure a worker is running, spawning one on first use.
    ///
    /// Callers arriving during a start wait for that start's outcome. A
    /// failed start resets to `NotStarted` so the next request can retry.
    pub async fn ensure_running(&self) -> Result<(), SupervisorError> {
        let mut inner = self.inner.lock().await;
        match inner.lifecycle {
            Lifecycle::Running => Ok(()),
            Lifecycle::Stopped => Err(SupervisorError::ShutDown),
            Lifecycle::NotStarted | Lifecycle::Starting => self.start(&mut inner).await,
        }
    }

    async fn start(&self, inner: &mut Inner) -> Result<(), SupervisorError> {
        inner.lifecycle = Lifecycle::Starting;

        let bin = self.resolve_bin();
        info!(bin = %bin.display(), port = self.settings.port, "starting worker process");

        let child = Command::new(&bin)
            .env("WORKER_PORT", self.settings.port.to_string())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                inner.lifecycle = Lifecycle::NotStarted;
                SupervisorError::SpawnFailed(e)
            })?;
        inner.child = Some(child);

        match self.await_ready().await {
            Ok(()) => {
                inner.lifecycle = Lifecycle::Running;
                info!("worker ready");
                Ok(())
            }
            Err(e) => {
                warn!("worker failed to start: {}", e);
                if let Some(mut child) = inner.child.take() {
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                }
                inner.lifecycle = Lifecycle::NotStarted;
                Err(e)
            }
        }
    }

    /// Polls the worker's health endpoint until it answers or the start
    /// timeout expires.
    async fn await_ready(&self) -> Result<(), SupervisorError> {
        let url = format!("{}/health", self.settings.base_url());
        let deadline = Instant::now() + self.settings.start_timeout;

        loop {
            if let Ok(response) = self.http.get(&url).send().await {
                if response.status().is_success() {
                    return Ok(());
                }
            }
            if Instant::now() >= deadline {
                return Err(SupervisorError::StartTimeout(self.settings.start_timeout));
            }
            sleep(HEALTH_POLL_INTERVAL).await;
        }
    }

    /// Kills the worker (if this supervisor spawned one) and refuses
    /// further starts.
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(mut child) = inner.child.take() {
            info!("stopping worker process");
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
        inner.lifecycle = Lifecycle::Stopped;
    }

    /// Resolves the worker binary: explicit setting, then a sibling of the
    /// gateway executable, then `tally-worker` on PATH.
    fn resolve_bin(&self) -> PathBuf {
        if let Some(bin) = &self.settings.bin {
            return bin.clone();
        }
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let sibling = dir.join("tally-worker");
                if sibling.exists() {
                    return sibling;
                }
            }
        }
        PathBuf::from("tally-worker")
    }
}
