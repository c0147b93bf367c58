//! Schema definitions and constants

/// Table names
pub mod tables {
    pub const HARDWARE_DATA: &str = "hardware_data";
}

/// Common column names
pub mod columns {
    pub const ID: &str = "id";
    pub const CREATED_AT: &str = "created_at";
}

/// Column list for `hardware_data` inserts, in schema order (without id and
/// `created_at`, which the store assigns itself).
pub const SAMPLE_COLUMNS: &str = "oem, board, platform, platform_vendor, form_factor, \
     ram_gb, storage_gb, num_cores, cpu_name, cpu_architecture, cpu_clock_speed, gpu_model, \
     has_touchscreen, has_stylus, screen_size, pixel_size, battery_manufacturer, usage_group, \
     \"singleCoreScore\", \"multiCoreScore\", \"gpuScore\", \"appLaunchSpeed\", \"thermalThrottling\"";
