//! Run configuration

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Config deserialization failed: {0}")]
    Parse(String),

    #[error("Config serialization failed: {0}")]
    Serialize(String),
}

/// Parameters of one simulation run
///
/// Every field has a default, so a JSON document only needs the fields it
/// changes.
///
/// # Fields
///
/// * `start_time` - Clock time before the first event
/// * `horizon` - Events later than this are never dispatched (inclusive bound)
/// * `max_events` - Dispatch ceiling; reaching it completes the run
/// * `abort_on_handler_fault` - Abort on the first handler fault instead of isolating it
/// * `verbose` - Log every stats update through `tracing`
/// * `record_trace` - Keep a fingerprinted trace of dispatched events
///
/// # Example
/// ```
/// use event_simulator_core_rs::SimulationConfig;
///
/// let config = SimulationConfig::from_json(r#"{"horizon": 100.0, "max_events": 5000}"#).unwrap();
/// assert_eq!(config.horizon, Some(100.0));
/// assert_eq!(config.start_time, 0.0);
/// assert!(!config.verbose);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub start_time: f64,
    pub horizon: Option<f64>,
    pub max_events: Option<u64>,
    pub abort_on_handler_fault: bool,
    pub verbose: bool,
    pub record_trace: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            horizon: None,
            max_events: None,
            abort_on_handler_fault: false,
            verbose: false,
            record_trace: false,
        }
    }
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn with_horizon(mut self, horizon: f64) -> Self {
        self.horizon = Some(horizon);
        self
    }

    pub fn with_max_events(mut self, max_events: u64) -> Self {
        self.max_events = Some(max_events);
        self
    }

    pub fn with_abort_on_handler_fault(mut self, abort: bool) -> Self {
        self.abort_on_handler_fault = abort;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_trace(mut self, record_trace: bool) -> Self {
        self.record_trace = record_trace;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// SHA-256 of the JSON form, for tagging run logs
    ///
    /// Field order is fixed by the struct, so equal configs hash equally.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json = self.to_json()?;
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }
}
