//! Gemini-backed [`Oracle`] implementation
//!
//! Thin wrapper over the `generateContent` REST endpoint with a structured
//! JSON response schema and an explicit client timeout. No retries: the two
//! flows are stateless request/response and terminate in either a parsed
//! result or an error.

use crate::{prompt, Oracle, OracleError, SyntheticSample};
use async_trait::async_trait;
use chrono::Utc;
use hw_config::OracleConfig;
use hw_store::{HardwareConfig, HardwareRecord, HardwareSample, PerformanceMetrics};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiOracle {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
    max_output_tokens: u32,
    temperature: f32,
}

impl GeminiOracle {
    /// Build an oracle from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::MissingApiKey`] if no API key is configured, or
    /// [`OracleError::RequestFailed`] if the HTTP client cannot be built.
    pub fn from_config(config: &OracleConfig) -> Result<Self, OracleError> {
        let api_key = config.api_key.clone().ok_or(OracleError::MissingApiKey)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            api_key,
            model: config.model.clone(),
            base_url: GEMINI_API_BASE.to_string(),
            client,
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
        })
    }

    /// Override the API base URL (tests point this at a local server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Endpoint for non-streaming content generation
    #[must_use]
    pub fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_request(&self, prompt: String, schema: serde_json::Value) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: Some(self.max_output_tokens),
                temperature: Some(self.temperature),
                response_mime_type: "application/json".to_string(),
                response_schema: schema,
            },
        }
    }

    /// Issue one generation request and return the response text.
    async fn generate(
        &self,
        prompt: String,
        schema: serde_json::Value,
    ) -> Result<String, OracleError> {
        let url = self.generate_url();
        let request = self.build_request(prompt, schema);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let raw = response.text().await?;
        let envelope: GenerateContentResponse = serde_json::from_str(&raw)
            .map_err(|e| OracleError::ParseFailed(format!("invalid response envelope: {e}")))?;

        extract_text(envelope)
            .ok_or_else(|| OracleError::ParseFailed("response contained no candidates".to_string()))
    }
}

#[async_trait]
impl Oracle for GeminiOracle {
    #[instrument(skip_all, fields(model = %self.model, context_len = context.len()))]
    async fn predict_metrics(
        &self,
        config: &HardwareConfig,
        context: &[HardwareRecord],
    ) -> Result<PerformanceMetrics, OracleError> {
        let rendered = prompt::render_prediction_prompt(config, context);
        let text = self.generate(rendered, prompt::metrics_schema()).await?;
        debug!(bytes = text.len(), "Prediction response received");
        prompt::parse_metrics(&text)
    }

    #[instrument(skip_all, fields(model = %self.model, count = count))]
    async fn generate_samples(&self, count: usize) -> Result<Vec<SyntheticSample>, OracleError> {
        let rendered = prompt::render_generation_prompt(count);
        let text = self.generate(rendered, prompt::samples_schema()).await?;
        debug!(bytes = text.len(), "Generation response received");
        let samples = prompt::parse_samples(&text)?;
        Ok(stamp_samples(samples))
    }
}

/// Stamp generated samples with a generation timestamp.
pub(crate) fn stamp_samples(samples: Vec<HardwareSample>) -> Vec<SyntheticSample> {
    let generated_at = Utc::now().to_rfc3339();
    samples
        .into_iter()
        .map(|sample| SyntheticSample {
            sample,
            generated_at: generated_at.clone(),
        })
        .collect()
}

fn extract_text(envelope: GenerateContentResponse) -> Option<String> {
    let candidate = envelope.candidates?.into_iter().next()?;
    let parts = candidate.content?.parts;
    let text: String = parts.into_iter().map(|p| p.text).collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}
