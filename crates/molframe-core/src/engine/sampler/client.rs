use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Default address of the remote energy scoring service.
pub const DEFAULT_ENDPOINT: &str = "https://molecularweb.epfl.ch/backend2";

const USER_AGENT: &str = concat!("molframe/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
    #[error("Request to scoring service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Scoring service answered with HTTP status {0}")]
    Status(u16),
    #[error("Malformed scoring response: {0}")]
    Malformed(String),
}

/// Request body: a batch containing a single structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRequest {
    pub coordinates: Vec<Vec<[f64; 3]>>,
    pub species: Vec<Vec<u8>>,
}

impl ScoringRequest {
    pub fn new(coordinates: &[Point3<f64>], species: &[u8]) -> Self {
        Self {
            coordinates: vec![coordinates.iter().map(|p| [p.x, p.y, p.z]).collect()],
            species: vec![species.to_vec()],
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScoringResponse {
    energy: f64,
}

/// A service that turns one structure into one raw energy.
pub trait ScoringClient: Send + Sync + 'static {
    fn score(
        &self,
        request: ScoringRequest,
    ) -> impl Future<Output = Result<f64, ScoringError>> + Send;
}

/// Scoring over HTTP: POSTs the request as JSON and reads `energy` back.
#[derive(Debug, Clone)]
pub struct HttpScoringClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpScoringClient {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ScoringError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ScoringError::Client(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim().to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ScoringClient for HttpScoringClient {
    fn score(
        &self,
        request: ScoringRequest,
    ) -> impl Future<Output = Result<f64, ScoringError>> + Send {
        let pending = self.client.post(&self.endpoint).json(&request).send();
        async move {
            let response = pending.await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ScoringError::Status(status.as_u16()));
            }
            let text = response.text().await?;
            parse_energy(&text)
        }
    }
}

fn parse_energy(body: &str) -> Result<f64, ScoringError> {
    let response: ScoringResponse =
        serde_json::from_str(body).map_err(|e| ScoringError::Malformed(e.to_string()))?;
    if response.energy.is_finite() {
        Ok(response.energy)
    } else {
        Err(ScoringError::Malformed(format!(
            "energy is not finite: {}",
            response.energy
        )))
    }
}
