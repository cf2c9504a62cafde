//! accel-sens: GPU/NPU telemetry aggregation for Linux
//!
//! This library provides:
//! - A telemetry aggregate that detects accelerator families once and
//!   re-reads every device on each refresh
//! - Immutable snapshots with cross-device statistics
//! - A tokio refresh loop and change notification
//! - Configuration management

pub mod config;
pub mod core;

// Re-export commonly used types
pub use crate::core::{RefreshManager, TelemetryAggregate, TelemetrySnapshot};
pub use accel_sens_sources::{CommandRunner, ProbeContext, ProbeReader};
pub use accel_sens_types::{CapabilitySet, DeviceClass, DeviceRecord, HostPaths, TelemetryConfig};
pub use config::AppConfig;
