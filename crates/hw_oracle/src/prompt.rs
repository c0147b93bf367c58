//! Prompt rendering, structured-response schemas, and response parsing
//!
//! The external service is asked for `application/json` output constrained by
//! a response schema; parsing is strict. A response that is absent, empty, or
//! off-shape is an [`OracleError::ParseFailed`] for the caller to surface -
//! a silently wrong prediction is worse than a visible failure.

use crate::OracleError;
use hw_store::{HardwareConfig, HardwareRecord, HardwareSample, PerformanceMetrics};
use std::fmt::Write as _;

/// Render the metric-prediction prompt for a candidate configuration and the
/// bounded historical context.
#[must_use]
pub fn render_prediction_prompt(config: &HardwareConfig, context: &[HardwareRecord]) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "You are an expert in Android hardware performance. Predict the performance \
         metrics for a new hardware configuration based on the provided historical data \
         and your internal knowledge of mobile SOCs and device classes.\n\n",
    );

    prompt.push_str("New Configuration:\n");
    let _ = writeln!(prompt, "- OEM: {}", config.oem);
    let _ = writeln!(prompt, "- Board: {}", config.board);
    let _ = writeln!(
        prompt,
        "- Platform: {} ({})",
        config.platform, config.platform_vendor
    );
    let _ = writeln!(prompt, "- Form Factor: {}", config.form_factor);
    let _ = writeln!(prompt, "- RAM: {}GB", config.ram_gb);
    let _ = writeln!(prompt, "- Storage: {}GB", config.storage_gb);
    let _ = writeln!(
        prompt,
        "- CPU: {} ({} cores @ {}GHz, {})",
        config.cpu_name, config.num_cores, config.cpu_clock_speed, config.cpu_architecture
    );
    let _ = writeln!(prompt, "- GPU: {}", config.gpu_model);
    let _ = writeln!(
        prompt,
        "- Display: {}\" @ {}",
        config.screen_size, config.pixel_size
    );
    let _ = writeln!(
        prompt,
        "- Features: Touchscreen={}, Stylus={}",
        config.has_touchscreen, config.has_stylus
    );
    let _ = writeln!(prompt, "- Battery: {}", config.battery_manufacturer);
    let _ = writeln!(prompt, "- Usage Pattern: {}", config.usage_group);

    prompt.push_str("\nHistorical Data (Learned from SQL Database):\n");
    if context.is_empty() {
        prompt.push_str("No historical data available yet. Use your general knowledge.\n");
    } else {
        for record in context {
            let c = &record.sample.config;
            let m = &record.sample.metrics;
            let _ = writeln!(
                prompt,
                "- [{} {}] Platform: {}, RAM: {}GB, Form: {}, Usage: {}",
                c.oem, c.cpu_name, c.platform, c.ram_gb, c.form_factor, c.usage_group
            );
            let _ = writeln!(
                prompt,
                "  Result: Single-Core: {}, Multi-Core: {}, GPU: {}, Thermal: {}/10",
                m.single_core_score, m.multi_core_score, m.gpu_score, m.thermal_throttling
            );
        }
    }

    prompt.push_str(
        "\nInstructions:\n\
         1. Analyze patterns across different hardware classes and usage patterns.\n\
         2. Consider how the usage pattern (e.g., Gaming vs Office) affects the metrics: \
         gaming favors GPU and multi-core throughput, office favors app launch speed and \
         thermal efficiency.\n\
         3. Consider how form factor (tablet vs phone) affects thermal headroom and \
         sustained performance.\n\
         4. Evaluate the impact of the platform vendor (Qualcomm, MediaTek, etc.) on \
         driver efficiency and GPU performance.\n\
         5. Predict realistic Geekbench-style scores and app launch metrics.\n\
         6. Return the prediction in JSON format.\n",
    );

    prompt
}

/// Render the synthetic-sample generation prompt.
#[must_use]
pub fn render_generation_prompt(count: usize) -> String {
    format!(
        "Generate {count} realistic examples of Android hardware configurations and their \
         performance metrics. Include a variety of tiers: flagship (e.g. Snapdragon 8 Gen 3), \
         mid-range, and entry-level. Include different form factors like Foldables, Tablets, \
         and standard Smartphones. Return a JSON array of objects."
    )
}

/// Response schema for a single metrics prediction.
#[must_use]
pub fn metrics_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "singleCoreScore": { "type": "INTEGER" },
            "multiCoreScore": { "type": "INTEGER" },
            "gpuScore": { "type": "INTEGER" },
            "appLaunchSpeed": { "type": "INTEGER", "description": "1-10 scale" },
            "thermalThrottling": { "type": "INTEGER", "description": "1-10 scale" },
        },
        "required": [
            "singleCoreScore", "multiCoreScore", "gpuScore",
            "appLaunchSpeed", "thermalThrottling",
        ],
    })
}

/// Response schema for an array of complete samples.
#[must_use]
pub fn samples_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "oem": { "type": "STRING" },
                "board": { "type": "STRING" },
                "platform": { "type": "STRING" },
                "platform_vendor": { "type": "STRING" },
                "form_factor": { "type": "STRING" },
                "ram_gb": { "type": "INTEGER" },
                "storage_gb": { "type": "INTEGER" },
                "num_cores": { "type": "INTEGER" },
                "cpu_name": { "type": "STRING" },
                "cpu_architecture": { "type": "STRING" },
                "cpu_clock_speed": { "type": "NUMBER" },
                "gpu_model": { "type": "STRING" },
                "has_touchscreen": { "type": "BOOLEAN" },
                "has_stylus": { "type": "BOOLEAN" },
                "screen_size": { "type": "NUMBER" },
                "pixel_size": { "type": "STRING" },
                "battery_manufacturer": { "type": "STRING" },
                "usage_group": { "type": "STRING" },
                "singleCoreScore": { "type": "INTEGER" },
                "multiCoreScore": { "type": "INTEGER" },
                "gpuScore": { "type": "INTEGER" },
                "appLaunchSpeed": { "type": "INTEGER" },
                "thermalThrottling": { "type": "INTEGER" },
            },
            "required": [
                "oem", "board", "platform", "platform_vendor", "form_factor",
                "ram_gb", "storage_gb", "num_cores", "cpu_name", "cpu_architecture",
                "cpu_clock_speed", "gpu_model", "has_touchscreen", "has_stylus",
                "screen_size", "pixel_size", "battery_manufacturer", "usage_group",
                "singleCoreScore", "multiCoreScore", "gpuScore", "appLaunchSpeed",
                "thermalThrottling",
            ],
        },
    })
}

/// Parse a metrics prediction from the service's response text.
///
/// # Errors
///
/// Returns [`OracleError::ParseFailed`] if the text is empty or does not
/// deserialize into the full five-metric shape.
pub fn parse_metrics(text: &str) -> Result<PerformanceMetrics, OracleError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(OracleError::ParseFailed(
            "empty prediction response".to_string(),
        ));
    }
    serde_json::from_str(text)
        .map_err(|e| OracleError::ParseFailed(format!("malformed prediction response: {e}")))
}

/// Parse an array of complete samples from the service's response text.
///
/// # Errors
///
/// Returns [`OracleError::ParseFailed`] if the text is empty or does not
/// deserialize into an array of fully-populated samples.
pub fn parse_samples(text: &str) -> Result<Vec<HardwareSample>, OracleError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(OracleError::ParseFailed(
            "empty generation response".to_string(),
        ));
    }
    serde_json::from_str(text)
        .map_err(|e| OracleError::ParseFailed(format!("malformed generation response: {e}")))
}
