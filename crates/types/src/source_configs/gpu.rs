//! Accelerator telemetry configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::heuristic::NameHeuristic;
use crate::paths::HostPaths;

fn default_nvidia_smi() -> String {
    "nvidia-smi".to_string()
}

fn default_lspci() -> String {
    "lspci".to_string()
}

fn default_nvidia_timeout_ms() -> u64 {
    5000
}

fn default_pci_lookup_timeout_ms() -> u64 {
    2000
}

/// External tools and how long each may run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default = "default_nvidia_smi")]
    pub nvidia_smi: String,
    #[serde(default = "default_lspci")]
    pub lspci: String,
    #[serde(default = "default_nvidia_timeout_ms")]
    pub nvidia_timeout_ms: u64,
    #[serde(default = "default_pci_lookup_timeout_ms")]
    pub pci_lookup_timeout_ms: u64,
}

impl ToolConfig {
    pub fn nvidia_timeout(&self) -> Duration {
        Duration::from_millis(self.nvidia_timeout_ms)
    }

    pub fn pci_lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.pci_lookup_timeout_ms)
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            nvidia_smi: default_nvidia_smi(),
            lspci: default_lspci(),
            nvidia_timeout_ms: default_nvidia_timeout_ms(),
            pci_lookup_timeout_ms: default_pci_lookup_timeout_ms(),
        }
    }
}

/// Name tables used for fuzzy classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicConfig {
    #[serde(default = "NameHeuristic::npu")]
    pub npu: NameHeuristic,
    #[serde(default = "NameHeuristic::amd_integrated")]
    pub amd_integrated: NameHeuristic,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            npu: NameHeuristic::npu(),
            amd_integrated: NameHeuristic::amd_integrated(),
        }
    }
}

/// Everything the probes need to know about the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub paths: HostPaths,
    #[serde(default)]
    pub tools: ToolConfig,
    #[serde(default)]
    pub heuristics: HeuristicConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_defaults() {
        let tools = ToolConfig::default();
        assert_eq!(tools.nvidia_smi, "nvidia-smi");
        assert_eq!(tools.nvidia_timeout(), Duration::from_secs(5));
        assert_eq!(tools.pci_lookup_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_partial_config_deserialization() {
        let json = r#"{"tools":{"lspci":"/usr/bin/lspci"},"heuristics":{"npu":{"include":["tpu"]}}}"#;
        let config: TelemetryConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.tools.lspci, "/usr/bin/lspci");
        assert_eq!(config.tools.nvidia_timeout_ms, 5000);
        assert!(config.heuristics.npu.matches("edge-tpu"));
        assert!(!config.heuristics.npu.matches("rknpu"));
        assert_eq!(config.heuristics.amd_integrated, NameHeuristic::amd_integrated());
        assert_eq!(config.paths, HostPaths::default());
    }
}
