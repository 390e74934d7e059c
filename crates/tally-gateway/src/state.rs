//! Shared gateway state: the worker supervisor and the relay HTTP client.

use tally_config::WorkerSettings;

use crate::supervisor::WorkerSupervisor;

pub struct GatewayState {
    pub supervisor: WorkerSupervisor,
    pub http: reqwest::Client,
}

impl GatewayState {
    pub fn new(settings: WorkerSettings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self {
            supervisor: WorkerSupervisor::new(settings),
            http,
        })
    }
}
