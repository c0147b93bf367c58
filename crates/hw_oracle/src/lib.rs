//! `hw_oracle` - External prediction service client for hwlab
//!
//! This crate provides:
//! - The [`Oracle`] trait: the pluggable capability for metric prediction and
//!   synthetic sample generation (test doubles substitute deterministic
//!   fixtures)
//! - Context selection for bounded prediction requests
//! - Prompt rendering and strict response parsing
//! - [`GeminiOracle`]: the reqwest-backed implementation

use async_trait::async_trait;
use hw_store::{HardwareConfig, HardwareRecord, HardwareSample, PerformanceMetrics};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod context;
mod gemini;
pub mod prompt;

pub use context::{select_context, CONTEXT_LIMIT};
pub use gemini::GeminiOracle;

/// Oracle errors
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Missing API key for the prediction service. Set GEMINI_API_KEY.")]
    MissingApiKey,

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Prediction parse failed: {0}")]
    ParseFailed(String),
}

/// A generated sample stamped with its generation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticSample {
    #[serde(flatten)]
    pub sample: HardwareSample,
    pub generated_at: String,
}

/// The external generative text service, reduced to the two operations this
/// system needs. Both are stateless request/response with no retries; the
/// terminal states are exactly a parsed result or an error.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Predict performance metrics for a candidate configuration given the
    /// bounded historical context.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::ParseFailed`] when the service's response is
    /// absent, empty, or off-shape; transport failures surface as
    /// [`OracleError::RequestFailed`]. Never silently defaults.
    async fn predict_metrics(
        &self,
        config: &HardwareConfig,
        context: &[HardwareRecord],
    ) -> Result<PerformanceMetrics, OracleError>;

    /// Generate `count` fully-formed synthetic samples, each stamped with a
    /// generation timestamp.
    ///
    /// # Errors
    ///
    /// Same contract as [`Oracle::predict_metrics`]; callers on the seeding
    /// path are expected to degrade to an empty list rather than propagate.
    async fn generate_samples(&self, count: usize) -> Result<Vec<SyntheticSample>, OracleError>;
}
