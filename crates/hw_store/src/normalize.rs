//! Record normalization for loosely-typed client submissions
//!
//! Bulk imports arrive with arbitrary subsets of the sample fields. Every
//! field of [`RawSample`] is present-or-absent (`Option`), and
//! [`RawSample::normalize`] resolves each absent field to its documented
//! default, so a fully-populated [`HardwareSample`] always reaches storage.

use crate::{HardwareConfig, HardwareSample, PerformanceMetrics};
use serde::{Deserialize, Serialize};

/// Default for descriptive text fields
pub const DEFAULT_TEXT: &str = "Unknown";
/// Default device form factor
pub const DEFAULT_FORM_FACTOR: &str = "Smartphone";
/// Default usage group
pub const DEFAULT_USAGE_GROUP: &str = "General";

/// A loosely-typed hardware sample as submitted by a client.
///
/// Field names follow the wire format; the metric fields keep their legacy
/// camelCase names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSample {
    pub oem: Option<String>,
    pub board: Option<String>,
    pub platform: Option<String>,
    pub platform_vendor: Option<String>,
    pub form_factor: Option<String>,
    pub ram_gb: Option<i64>,
    pub storage_gb: Option<i64>,
    pub num_cores: Option<i64>,
    pub cpu_name: Option<String>,
    pub cpu_architecture: Option<String>,
    pub cpu_clock_speed: Option<f64>,
    pub gpu_model: Option<String>,
    pub has_touchscreen: Option<bool>,
    pub has_stylus: Option<bool>,
    pub screen_size: Option<f64>,
    pub pixel_size: Option<String>,
    pub battery_manufacturer: Option<String>,
    pub usage_group: Option<String>,
    #[serde(rename = "singleCoreScore")]
    pub single_core_score: Option<i64>,
    #[serde(rename = "multiCoreScore")]
    pub multi_core_score: Option<i64>,
    #[serde(rename = "gpuScore")]
    pub gpu_score: Option<i64>,
    #[serde(rename = "appLaunchSpeed")]
    pub app_launch_speed: Option<i64>,
    #[serde(rename = "thermalThrottling")]
    pub thermal_throttling: Option<i64>,
}

/// Resolve an optional text field to its default.
///
/// Legacy quirk, kept on purpose: an explicit empty (or whitespace-only)
/// string is treated as absent, same as the system this replaces. Explicit
/// zero and false values on the numeric/boolean fields survive normalization
/// under the present-or-absent representation.
fn text_or(value: Option<String>, default: &str) -> String {
    match value {
        Some(s) if !s.trim().is_empty() => s,
        _ => default.to_string(),
    }
}

impl RawSample {
    /// Produce a fully-populated sample, substituting the documented default
    /// for every absent field. Total: never fails.
    #[must_use]
    pub fn normalize(self) -> HardwareSample {
        HardwareSample {
            config: HardwareConfig {
                oem: text_or(self.oem, DEFAULT_TEXT),
                board: text_or(self.board, DEFAULT_TEXT),
                platform: text_or(self.platform, DEFAULT_TEXT),
                platform_vendor: text_or(self.platform_vendor, DEFAULT_TEXT),
                form_factor: text_or(self.form_factor, DEFAULT_FORM_FACTOR),
                ram_gb: self.ram_gb.unwrap_or(0),
                storage_gb: self.storage_gb.unwrap_or(0),
                num_cores: self.num_cores.unwrap_or(0),
                cpu_name: text_or(self.cpu_name, DEFAULT_TEXT),
                cpu_architecture: text_or(self.cpu_architecture, DEFAULT_TEXT),
                cpu_clock_speed: self.cpu_clock_speed.unwrap_or(0.0),
                gpu_model: text_or(self.gpu_model, DEFAULT_TEXT),
                has_touchscreen: self.has_touchscreen.unwrap_or(false),
                has_stylus: self.has_stylus.unwrap_or(false),
                screen_size: self.screen_size.unwrap_or(0.0),
                pixel_size: text_or(self.pixel_size, DEFAULT_TEXT),
                battery_manufacturer: text_or(self.battery_manufacturer, DEFAULT_TEXT),
                usage_group: text_or(self.usage_group, DEFAULT_USAGE_GROUP),
            },
            metrics: PerformanceMetrics {
                single_core_score: self.single_core_score.unwrap_or(0),
                multi_core_score: self.multi_core_score.unwrap_or(0),
                gpu_score: self.gpu_score.unwrap_or(0),
                app_launch_speed: self.app_launch_speed.unwrap_or(0),
                thermal_throttling: self.thermal_throttling.unwrap_or(0),
            },
        }
    }
}
