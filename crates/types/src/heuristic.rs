//! Name-based device classification.
//!
//! These tables are best-effort: vendors do not expose a reliable
//! "this is an NPU" or "this shares system RAM" attribute everywhere, so the
//! probes fall back to matching on device names. Both tables can be replaced
//! from configuration.

use serde::{Deserialize, Serialize};

/// Case-insensitive substring policy: matches when any `include` term is
/// present and no `exclude` term is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameHeuristic {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl NameHeuristic {
    pub fn new(include: &[&str], exclude: &[&str]) -> Self {
        Self {
            include: include.iter().map(|s| s.to_string()).collect(),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Names that identify neural processing units in devfreq/misc entries
    pub fn npu() -> Self {
        Self::new(&["npu", "rknpu", "apu", "neuron", "vpu"], &[])
    }

    /// AMD product names that usually denote an APU / integrated GPU
    pub fn amd_integrated() -> Self {
        Self::new(&["graphics", "apu"], &["rx ", "radeon pro", "firepro"])
    }

    pub fn matches(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        if lower.is_empty() {
            return false;
        }
        if self
            .exclude
            .iter()
            .any(|term| lower.contains(&term.to_lowercase()))
        {
            return false;
        }
        self.include
            .iter()
            .any(|term| lower.contains(&term.to_lowercase()))
    }
}
