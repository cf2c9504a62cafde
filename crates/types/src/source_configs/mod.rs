//! Source configuration types.

pub mod gpu;

pub use gpu::{HeuristicConfig, TelemetryConfig, ToolConfig};
