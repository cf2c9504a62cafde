//! Host-level accelerator family flags

use serde::{Deserialize, Serialize};

/// Which accelerator families are present on the host.
///
/// Family composition is treated as fixed once `detected` is set; only the
/// per-device metrics are re-read on each refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    pub has_nvidia: bool,
    pub has_amd: bool,
    pub has_intel: bool,
    pub has_npu: bool,
    pub detected: bool,
}

impl CapabilitySet {
    /// True when at least one family was found
    pub fn any(&self) -> bool {
        self.has_nvidia || self.has_amd || self.has_intel || self.has_npu
    }

    /// Names of the families present, for log output
    pub fn families(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.has_nvidia {
            names.push("NVIDIA");
        }
        if self.has_amd {
            names.push("AMD");
        }
        if self.has_intel {
            names.push("Intel");
        }
        if self.has_npu {
            names.push("NPU");
        }
        names
    }
}
