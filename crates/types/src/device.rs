//! Normalized accelerator device record

use serde::{Deserialize, Serialize};

pub const VENDOR_NVIDIA: &str = "NVIDIA";
pub const VENDOR_AMD: &str = "AMD";
pub const VENDOR_INTEL: &str = "Intel";
pub const VENDOR_NPU: &str = "NPU";
pub const VENDOR_GOOGLE: &str = "Google";

/// Bus label used for devices that live on the SoC rather than a PCIe slot
pub const BUS_SOC_PLATFORM: &str = "SoC/Platform";

/// Clamp a percentage into 0..=100, mapping NaN to 0
pub fn clamp_percent(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Which side of the GPU/NPU split a device falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceClass {
    Gpu,
    Npu,
}

/// Busy percentage of one functional unit (3D, compute, video, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineLoad {
    pub name: String,
    pub load: f32,
}

/// One physical or logical accelerator as seen during a single refresh.
///
/// Records are built by exactly one probe reader and are never mutated once
/// they have been published in a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Position within its vendor-class enumeration (not globally unique)
    pub index: u32,
    pub name: String,
    pub vendor: String,
    /// Memory figures in bytes
    pub total_memory: u64,
    pub used_memory: u64,
    pub free_memory: u64,
    /// 0-100
    pub gpu_utilization: f32,
    /// 0-100
    pub memory_utilization: f32,
    /// Celsius, 0 when unknown
    pub temperature: f32,
    /// MHz, 0 when unknown
    pub clock_speed: u64,
    pub is_available: bool,
    pub is_npu: bool,
    /// Shares memory with system RAM
    pub is_integrated: bool,
    pub bus_info: String,
    engines: Vec<EngineLoad>,
}

impl DeviceRecord {
    pub fn new(index: u32, name: impl Into<String>, vendor: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
            vendor: vendor.into(),
            ..Self::default()
        }
    }

    pub fn class(&self) -> DeviceClass {
        if self.is_npu {
            DeviceClass::Npu
        } else {
            DeviceClass::Gpu
        }
    }

    /// Whether the record takes part in statistics for `class`
    pub fn counts_as(&self, class: DeviceClass) -> bool {
        self.is_available && self.class() == class
    }

    /// Store memory figures, keeping `used + free == total` whenever total is known
    pub fn set_memory(&mut self, total: u64, used: u64) {
        if total == 0 {
            self.total_memory = 0;
            self.used_memory = 0;
            self.free_memory = 0;
            return;
        }
        self.total_memory = total;
        self.used_memory = used.min(total);
        self.free_memory = total - self.used_memory;
    }

    /// Share of dedicated memory in use, 0 when the total is unknown
    pub fn memory_percent(&self) -> f32 {
        if self.total_memory == 0 {
            return 0.0;
        }
        clamp_percent((self.used_memory as f64 / self.total_memory as f64 * 100.0) as f32)
    }

    pub fn set_gpu_utilization(&mut self, value: f32) {
        self.gpu_utilization = clamp_percent(value);
    }

    pub fn set_memory_utilization(&mut self, value: f32) {
        self.memory_utilization = clamp_percent(value);
    }

    /// Append an engine; the load is clamped into 0..=100
    pub fn push_engine(&mut self, name: impl Into<String>, load: f32) {
        self.engines.push(EngineLoad {
            name: name.into(),
            load: clamp_percent(load),
        });
    }

    pub fn engines(&self) -> &[EngineLoad] {
        &self.engines
    }

    pub fn engine_names(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn engine_loads(&self) -> Vec<f32> {
        self.engines.iter().map(|e| e.load).collect()
    }

    /// Load of the first engine carrying `name`
    pub fn engine_load(&self, name: &str) -> Option<f32> {
        self.engines.iter().find(|e| e.name == name).map(|e| e.load)
    }
}
