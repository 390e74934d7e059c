//! Environment-driven settings for the tally gateway and worker.
//!
//! Both binaries call `dotenvy::dotenv().ok()` before reading these, so a
//! `.env` file works the same as real environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{var} is not set")]
    Missing { var: &'static str },

    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_WORKER_PORT: u16 = 3001;
pub const DEFAULT_GATEWAY_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_MODEL: &str = "gpt-4o";

const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(60);

/// Reads a trimmed, non-empty environment variable.
fn env_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_port(var: &'static str, default: u16) -> Result<u16, ConfigError> {
    match env_var(var) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}

fn env_secs(var: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match env_var(var) {
        Some(value) => value
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LLM
// ─────────────────────────────────────────────────────────────────────────────

/// Settings for the OpenAI chat-completions client.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl LlmSettings {
    /// Reads `OPENAI_API_KEY` (required), `OPENAI_MODEL`, and
    /// `LLM_TIMEOUT_SECS`. The worker fails fast at startup when the key is
    /// missing rather than erroring on the first request.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key =
            env_var("OPENAI_API_KEY").ok_or(ConfigError::Missing { var: "OPENAI_API_KEY" })?;
        Ok(Self {
            api_key,
            model: env_var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: env_secs("LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT)?,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Worker
// ─────────────────────────────────────────────────────────────────────────────

/// Settings describing the worker process as seen from the gateway.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Port the worker listens on (`WORKER_PORT`, default 3001).
    pub port: u16,
    /// If set, attach to an already-running worker at this base URL
    /// instead of spawning one (`WORKER_URL`).
    pub url: Option<String>,
    /// Explicit worker binary path (`TALLY_WORKER_BIN`).
    pub bin: Option<PathBuf>,
    /// How long to wait for the worker's health endpoint after spawning.
    pub start_timeout: Duration,
    /// Per-request timeout for gateway-to-worker calls.
    pub request_timeout: Duration,
}

impl WorkerSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            port: env_port("WORKER_PORT", DEFAULT_WORKER_PORT)?,
            url: env_var("WORKER_URL"),
            bin: env_var("TALLY_WORKER_BIN").map(PathBuf::from),
            start_timeout: env_secs("WORKER_START_TIMEOUT_SECS", DEFAULT_START_TIMEOUT)?,
            request_timeout: env_secs("WORKER_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT)?,
        })
    }

    /// Base URL of the worker, whether spawned or attached.
    pub fn base_url(&self) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", self.port))
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_WORKER_PORT,
            url: None,
            bin: None,
            start_timeout: DEFAULT_START_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Gateway
// ─────────────────────────────────────────────────────────────────────────────

/// Settings for the public-facing gateway server.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Listen address (`GATEWAY_ADDR`, default `0.0.0.0:8000`).
    pub listen_addr: String,
    pub worker: WorkerSettings,
}

impl GatewaySettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            listen_addr: env_var("GATEWAY_ADDR")
                .unwrap_or_else(|| DEFAULT_GATEWAY_ADDR.to_string()),
            worker: WorkerSettings::from_env()?,
        })
    }
}
