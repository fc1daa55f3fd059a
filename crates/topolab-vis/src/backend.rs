//! Emulation backend boundary.
//!
//! The backend persists topologies, runs emulations and serves the resulting
//! captures. [`HttpBackend`] talks to it over HTTP; tests substitute their own
//! [`EmulationBackend`].

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use topolab_topology::TopologySnapshot;

use crate::capture::{CaptureFrame, CaptureRef};
use crate::error::{Error, Result};
use crate::events::{parse_steps, TrafficStep};

/// Identifier of a submitted emulation run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimulationId(pub String);

impl std::fmt::Display for SimulationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output of a finished run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmulationResult {
    pub steps: Vec<TrafficStep>,
    pub captures: Vec<CaptureRef>,
}

/// Answer to a poll.
#[derive(Debug, Clone, PartialEq)]
pub enum PollStatus {
    /// Still running, ask again later
    Processing,
    /// Finished
    Done(EmulationResult),
}

/// Poll body on the wire. The step list arrives JSON-encoded inside a string.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum PollResponse {
    Processing,
    Done {
        packets: String,
        #[serde(default)]
        pcaps: Vec<CaptureRef>,
    },
}

impl TryFrom<PollResponse> for PollStatus {
    type Error = Error;

    fn try_from(response: PollResponse) -> Result<Self> {
        match response {
            PollResponse::Processing => Ok(PollStatus::Processing),
            PollResponse::Done { packets, pcaps } => Ok(PollStatus::Done(EmulationResult {
                steps: parse_steps(&packets)?,
                captures: pcaps,
            })),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    simulation_id: String,
}

/// Request/response boundary to the emulation backend.
#[async_trait]
pub trait EmulationBackend: Send + Sync {
    /// Persist a topology.
    async fn save(&self, snapshot: &TopologySnapshot) -> Result<()>;

    /// Start an emulation run.
    async fn submit(&self, snapshot: &TopologySnapshot) -> Result<SimulationId>;

    /// Ask whether a run has finished.
    async fn poll(&self, id: &SimulationId) -> Result<PollStatus>;

    /// Fetch the frames of one capture.
    async fn captures(&self, capture: &CaptureRef) -> Result<Vec<CaptureFrame>>;
}

/// Backend reached over HTTP.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client for the backend at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn checked(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(Error::Backend(format!("{what} failed: {status}")))
        }
    }
}

#[async_trait]
impl EmulationBackend for HttpBackend {
    async fn save(&self, snapshot: &TopologySnapshot) -> Result<()> {
        let response = self
            .client
            .post(self.url("api/topology"))
            .json(snapshot)
            .send()
            .await?;
        Self::checked(response, "save").await?;
        tracing::debug!("topology saved");
        Ok(())
    }

    async fn submit(&self, snapshot: &TopologySnapshot) -> Result<SimulationId> {
        let response = self
            .client
            .post(self.url("api/emulate"))
            .json(snapshot)
            .send()
            .await?;
        let body: SubmitResponse = Self::checked(response, "submit").await?.json().await?;
        tracing::info!(simulation = %body.simulation_id, "emulation submitted");
        Ok(SimulationId(body.simulation_id))
    }

    async fn poll(&self, id: &SimulationId) -> Result<PollStatus> {
        let response = self
            .client
            .get(self.url(&format!("api/emulate/{id}")))
            .send()
            .await?;
        let body: PollResponse = Self::checked(response, "poll").await?.json().await?;
        body.try_into()
    }

    async fn captures(&self, capture: &CaptureRef) -> Result<Vec<CaptureFrame>> {
        let response = self.client.get(self.url(&capture.file)).send().await?;
        let frames = Self::checked(response, "capture fetch").await?.json().await?;
        Ok(frames)
    }
}

/// Submit a run and poll every `interval` until it finishes.
pub async fn run_emulation(
    backend: &dyn EmulationBackend,
    snapshot: &TopologySnapshot,
    interval: Duration,
) -> Result<EmulationResult> {
    let id = backend.submit(snapshot).await?;
    let mut polls = 0u32;
    loop {
        polls += 1;
        match backend.poll(&id).await? {
            PollStatus::Processing => {
                tracing::trace!(simulation = %id, polls, "emulation still processing");
                tokio::time::sleep(interval).await;
            }
            PollStatus::Done(result) => {
                tracing::info!(
                    simulation = %id,
                    polls,
                    steps = result.steps.len(),
                    captures = result.captures.len(),
                    "emulation finished"
                );
                return Ok(result);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Scripted backend: answers `Processing` a fixed number of times, then
    /// returns `result`.
    #[derive(Default)]
    pub struct MockBackend {
        pub processing_polls: u32,
        pub result: EmulationResult,
        pub frames: Vec<CaptureFrame>,
        pub fail_submit: bool,
        pub saved: Mutex<Vec<TopologySnapshot>>,
        pub polls: Mutex<u32>,
    }

    #[async_trait]
    impl EmulationBackend for MockBackend {
        async fn save(&self, snapshot: &TopologySnapshot) -> Result<()> {
            self.saved.lock().unwrap().push(snapshot.clone());
            Ok(())
        }

        async fn submit(&self, _snapshot: &TopologySnapshot) -> Result<SimulationId> {
            if self.fail_submit {
                return Err(Error::Backend("submit failed: 500".into()));
            }
            Ok(SimulationId("sim-1".into()))
        }

        async fn poll(&self, _id: &SimulationId) -> Result<PollStatus> {
            let mut polls = self.polls.lock().unwrap();
            *polls += 1;
            if *polls <= self.processing_polls {
                Ok(PollStatus::Processing)
            } else {
                Ok(PollStatus::Done(self.result.clone()))
            }
        }

        async fn captures(&self, _capture: &CaptureRef) -> Result<Vec<CaptureFrame>> {
            Ok(self.frames.clone())
        }
    }
}
