//! accel-sens-types: Shared data types for accel-sens.
//!
//! This crate contains pure data types (device records, capability flags,
//! host paths, configuration) shared by the probe and aggregate crates.
//! It performs no I/O.

pub mod capability;
pub mod device;
pub mod heuristic;
pub mod paths;
pub mod source_configs;

// Re-export commonly used types at the crate root for convenience
pub use capability::CapabilitySet;
pub use device::{
    clamp_percent, DeviceClass, DeviceRecord, EngineLoad, BUS_SOC_PLATFORM, VENDOR_AMD,
    VENDOR_GOOGLE, VENDOR_INTEL, VENDOR_NPU, VENDOR_NVIDIA,
};
pub use heuristic::NameHeuristic;
pub use paths::HostPaths;
pub use source_configs::{HeuristicConfig, TelemetryConfig, ToolConfig};
