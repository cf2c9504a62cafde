//! Immutable result of one refresh and the query surface consumers read

use super::constants::BYTES_PER_MIB;
use accel_sens_types::{CapabilitySet, DeviceClass, DeviceRecord};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt::Write;

/// Device list and capability flags published by one `update()`.
///
/// A snapshot never changes after publication; holders keep seeing the same
/// data until they ask the aggregate for a newer one.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TelemetrySnapshot {
    pub devices: Vec<DeviceRecord>,
    pub capabilities: CapabilitySet,
    /// `None` until the first refresh
    pub refreshed_at: Option<DateTime<Local>>,
    /// Number of refreshes that produced this snapshot
    pub generation: u64,
}

impl TelemetrySnapshot {
    pub fn new(devices: Vec<DeviceRecord>, capabilities: CapabilitySet, generation: u64) -> Self {
        Self {
            devices,
            capabilities,
            refreshed_at: Some(Local::now()),
            generation,
        }
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn device_list(&self) -> &[DeviceRecord] {
        &self.devices
    }

    /// Position in the concatenated list (NVIDIA, AMD, Intel, NPU order)
    pub fn device(&self, index: usize) -> Option<&DeviceRecord> {
        self.devices.get(index)
    }

    /// The `index`-th available device of one class
    pub fn nth_device(&self, class: DeviceClass, index: usize) -> Option<&DeviceRecord> {
        self.available().filter(|d| d.class() == class).nth(index)
    }

    // Memory sums cover every available device, NPUs included, and saturate.

    pub fn total_memory(&self) -> u64 {
        self.available().map(|d| d.total_memory).fold(0, u64::saturating_add)
    }

    pub fn used_memory(&self) -> u64 {
        self.available().map(|d| d.used_memory).fold(0, u64::saturating_add)
    }

    pub fn free_memory(&self) -> u64 {
        self.available().map(|d| d.free_memory).fold(0, u64::saturating_add)
    }

    /// Mean GPU utilization over available non-NPU devices, 0 when there are none
    pub fn average_utilization(&self) -> f32 {
        mean(self.of_class(DeviceClass::Gpu).map(|d| d.gpu_utilization))
    }

    pub fn average_npu_utilization(&self) -> f32 {
        mean(self.of_class(DeviceClass::Npu).map(|d| d.gpu_utilization))
    }

    pub fn average_memory_utilization(&self) -> f32 {
        mean(self.of_class(DeviceClass::Gpu).map(|d| d.memory_utilization))
    }

    pub fn gpu_count(&self) -> usize {
        self.of_class(DeviceClass::Gpu).count()
    }

    pub fn npu_count(&self) -> usize {
        self.of_class(DeviceClass::Npu).count()
    }

    pub fn has_nvidia_gpu(&self) -> bool {
        self.capabilities.has_nvidia
    }

    pub fn has_amd_gpu(&self) -> bool {
        self.capabilities.has_amd
    }

    pub fn has_intel_gpu(&self) -> bool {
        self.capabilities.has_intel
    }

    pub fn has_npu(&self) -> bool {
        self.capabilities.has_npu
    }

    /// Multi-line human-readable report
    pub fn format_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "[#{}] {} GPU(s) avg {:.1}%, {} NPU(s) avg {:.1}%, memory {}/{} MiB",
            self.generation,
            self.gpu_count(),
            self.average_utilization(),
            self.npu_count(),
            self.average_npu_utilization(),
            self.used_memory() / BYTES_PER_MIB,
            self.total_memory() / BYTES_PER_MIB,
        );

        for device in &self.devices {
            let kind = match device.class() {
                DeviceClass::Gpu => "GPU",
                DeviceClass::Npu => "NPU",
            };
            let _ = write!(
                out,
                "  {} {} [{}] {}: {:.1}%",
                kind, device.index, device.vendor, device.name, device.gpu_utilization
            );
            if device.total_memory > 0 {
                let _ = write!(
                    out,
                    ", mem {}/{} MiB",
                    device.used_memory / BYTES_PER_MIB,
                    device.total_memory / BYTES_PER_MIB
                );
            }
            if device.temperature > 0.0 {
                let _ = write!(out, ", {:.0}°C", device.temperature);
            }
            if !device.bus_info.is_empty() {
                let _ = write!(out, ", {}", device.bus_info);
            }
            out.push('\n');

            for engine in device.engines() {
                let _ = writeln!(out, "      {:<14} {:>5.1}%", engine.name, engine.load);
            }
        }
        out
    }

    fn available(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.devices.iter().filter(|d| d.is_available)
    }

    fn of_class(&self, class: DeviceClass) -> impl Iterator<Item = &DeviceRecord> {
        self.devices.iter().filter(move |d| d.counts_as(class))
    }
}

fn mean(values: impl Iterator<Item = f32>) -> f32 {
    let (sum, count) = values.fold((0.0f32, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(index: u32, npu: bool, util: f32, total: u64, used: u64) -> DeviceRecord {
        let mut d = DeviceRecord::new(index, format!("dev{}", index), "Test");
        d.is_npu = npu;
        d.set_gpu_utilization(util);
        d.set_memory(total, used);
        d.is_available = true;
        d
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = TelemetrySnapshot::default();
        assert_eq!(snapshot.device_count(), 0);
        assert_eq!(snapshot.average_utilization(), 0.0);
        assert_eq!(snapshot.average_npu_utilization(), 0.0);
        assert_eq!(snapshot.average_memory_utilization(), 0.0);
        assert_eq!(snapshot.total_memory(), 0);
        assert!(snapshot.device(0).is_none());
        assert!(snapshot.refreshed_at.is_none());
    }

    #[test]
    fn test_averages_split_by_class() {
        let snapshot = TelemetrySnapshot::new(
            vec![
                device(0, false, 40.0, 1000, 250),
                device(1, false, 80.0, 0, 0),
                device(0, true, 10.0, 0, 0),
            ],
            CapabilitySet::default(),
            1,
        );
        assert_eq!(snapshot.average_utilization(), 60.0);
        assert_eq!(snapshot.average_npu_utilization(), 10.0);
        assert_eq!(snapshot.gpu_count(), 2);
        assert_eq!(snapshot.npu_count(), 1);
    }

    #[test]
    fn test_unavailable_devices_are_ignored() {
        let mut offline = device(2, false, 100.0, 4096, 4096);
        offline.is_available = false;
        let snapshot = TelemetrySnapshot::new(
            vec![device(0, false, 20.0, 1024, 512), offline],
            CapabilitySet::default(),
            1,
        );

        assert_eq!(snapshot.device_count(), 2);
        assert_eq!(snapshot.gpu_count(), 1);
        assert_eq!(snapshot.average_utilization(), 20.0);
        assert_eq!(snapshot.total_memory(), 1024);
        assert!(snapshot.nth_device(DeviceClass::Gpu, 1).is_none());
    }

    #[test]
    fn test_memory_sums_saturate() {
        let huge = device(0, false, 0.0, u64::MAX, u64::MAX - 1);
        let also_huge = device(1, true, 0.0, u64::MAX, 2);
        let snapshot = TelemetrySnapshot::new(vec![huge, also_huge], CapabilitySet::default(), 1);

        assert_eq!(snapshot.total_memory(), u64::MAX);
        assert_eq!(snapshot.used_memory(), u64::MAX);
        assert_eq!(snapshot.free_memory(), u64::MAX);
    }

    #[test]
    fn test_nth_device_per_class() {
        let snapshot = TelemetrySnapshot::new(
            vec![
                device(0, false, 1.0, 0, 0),
                device(0, true, 2.0, 0, 0),
                device(1, false, 3.0, 0, 0),
            ],
            CapabilitySet::default(),
            1,
        );
        assert_eq!(snapshot.nth_device(DeviceClass::Gpu, 1).unwrap().gpu_utilization, 3.0);
        assert_eq!(snapshot.nth_device(DeviceClass::Npu, 0).unwrap().gpu_utilization, 2.0);
        assert!(snapshot.nth_device(DeviceClass::Npu, 1).is_none());
    }

    #[test]
    fn test_capability_queries() {
        let caps = CapabilitySet {
            has_amd: true,
            has_npu: true,
            detected: true,
            ..CapabilitySet::default()
        };
        let snapshot = TelemetrySnapshot::new(Vec::new(), caps, 1);
        assert!(snapshot.has_amd_gpu());
        assert!(snapshot.has_npu());
        assert!(!snapshot.has_nvidia_gpu());
        assert!(!snapshot.has_intel_gpu());
    }

    #[test]
    fn test_format_text() {
        let mut gpu = device(0, false, 55.0, 8192 * BYTES_PER_MIB, 2048 * BYTES_PER_MIB);
        gpu.temperature = 65.0;
        gpu.bus_info = "PCIe 0000:01:00.0".to_string();
        gpu.push_engine("Graphics", 55.0);
        let snapshot = TelemetrySnapshot::new(vec![gpu], CapabilitySet::default(), 7);

        let text = snapshot.format_text();
        assert!(text.starts_with("[#7] 1 GPU(s) avg 55.0%"));
        assert!(text.contains("mem 2048/8192 MiB"));
        assert!(text.contains("65°C"));
        assert!(text.contains("Graphics"));
    }
}
