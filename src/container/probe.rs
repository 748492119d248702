use crate::container::error::{ContainerError, Result};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

/// Result of a single probe attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "state")]
pub enum ProbeStatus {
    Healthy { latency_ms: u64 },
    Unhealthy { status: u16 },
    Unreachable { error: String },
}

impl ProbeStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ProbeStatus::Healthy { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub url: String,
    pub healthy: bool,
    pub attempts: u32,
    pub elapsed_secs: u64,
    pub last: ProbeStatus,
}

/// Polls a `/health` endpoint until it answers 200 or a deadline passes.
///
/// The launcher uses second-granularity polling while services start;
/// the container image carries the 30-second variant in HEALTHCHECK.
pub struct HealthProbe {
    client: reqwest::Client,
    interval: Duration,
    deadline: Duration,
}

impl HealthProbe {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            interval: Duration::from_secs(1),
            deadline: Duration::from_secs(30),
        })
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub async fn check_once(&self, url: &str) -> ProbeStatus {
        let started = Instant::now();
        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => ProbeStatus::Healthy {
                latency_ms: started.elapsed().as_millis() as u64,
            },
            Ok(response) => ProbeStatus::Unhealthy {
                status: response.status().as_u16(),
            },
            Err(e) => ProbeStatus::Unreachable {
                error: e.to_string(),
            },
        }
    }

    /// Poll until healthy or until the deadline passes. The outcome
    /// reports either way; only an invalid URL is an error.
    pub async fn wait_until_healthy(&self, url: &str) -> Result<ProbeOutcome> {
        Url::parse(url).map_err(|e| ContainerError::InvalidProbeUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let started = Instant::now();
        let mut attempts = 0u32;
        let mut last;

        loop {
            attempts += 1;
            last = self.check_once(url).await;
            debug!(url, attempts, ?last, "probe attempt");

            if last.is_healthy() {
                info!(url, attempts, "service is healthy");
                return Ok(ProbeOutcome {
                    url: url.to_string(),
                    healthy: true,
                    attempts,
                    elapsed_secs: started.elapsed().as_secs(),
                    last,
                });
            }

            if started.elapsed() + self.interval > self.deadline {
                return Ok(ProbeOutcome {
                    url: url.to_string(),
                    healthy: false,
                    attempts,
                    elapsed_secs: started.elapsed().as_secs(),
                    last,
                });
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}
