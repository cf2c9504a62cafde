//! Probe reader trait and the context every reader runs against

use crate::command::{CommandRunner, SystemCommandRunner};
use accel_sens_types::{CapabilitySet, DeviceRecord, HeuristicConfig, HostPaths, TelemetryConfig, ToolConfig};
use std::sync::Arc;

/// Host paths, tool settings and the subprocess runner used by one aggregate.
///
/// Replaces process-wide state: tests build one pointing at a fixture tree
/// with a scripted runner.
#[derive(Clone)]
pub struct ProbeContext {
    pub paths: HostPaths,
    pub tools: ToolConfig,
    pub heuristics: HeuristicConfig,
    pub runner: Arc<dyn CommandRunner>,
}

impl ProbeContext {
    pub fn new(config: TelemetryConfig) -> Self {
        Self::with_runner(config, Arc::new(SystemCommandRunner))
    }

    pub fn with_runner(config: TelemetryConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            paths: config.paths,
            tools: config.tools,
            heuristics: config.heuristics,
            runner,
        }
    }
}

impl Default for ProbeContext {
    fn default() -> Self {
        Self::new(TelemetryConfig::default())
    }
}

impl std::fmt::Debug for ProbeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeContext")
            .field("paths", &self.paths)
            .field("tools", &self.tools)
            .field("heuristics", &self.heuristics)
            .finish_non_exhaustive()
    }
}

/// One vendor family's reader.
///
/// `read` never fails: unreadable sources degrade to default values and a
/// failed tool invocation yields no records.
pub trait ProbeReader: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Whether the capability set says this family is present
    fn enabled(&self, caps: &CapabilitySet) -> bool;

    /// Build fresh records for every device of this family
    fn read(&self, ctx: &ProbeContext) -> Vec<DeviceRecord>;
}
