//! NPU reader: devfreq-managed NPUs plus the Coral Edge TPU

use super::backend::{ProbeContext, ProbeReader};
use crate::sysfs::{list_subdirs, read_percent_from_file, read_temp_from_hwmon, read_trimmed};
use accel_sens_types::{
    CapabilitySet, DeviceRecord, NameHeuristic, BUS_SOC_PLATFORM, VENDOR_GOOGLE, VENDOR_NPU,
};
use std::fs;
use std::path::Path;

/// Utilization candidates, relative to the devfreq entry
const LOAD_FILES: [&str; 4] = ["load", "utilization", "busy_percent", "device/load"];
const CORE_ENGINE: &str = "NPU Core";
const EDGE_TPU_NAME: &str = "Edge TPU";
const EDGE_TPU_BUS: &str = "PCIe/USB";

/// Whether a devfreq entry looks like an NPU, by entry name or device-tree node name
pub fn is_npu_devfreq_entry(heuristic: &NameHeuristic, entry_path: &Path, entry_name: &str) -> bool {
    if heuristic.matches(entry_name) {
        return true;
    }
    read_trimmed(&entry_path.join("device/of_node/name"))
        .map(|of_name| heuristic.matches(&of_name))
        .unwrap_or(false)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NpuReader;

impl ProbeReader for NpuReader {
    fn name(&self) -> &'static str {
        "npu"
    }

    fn enabled(&self, caps: &CapabilitySet) -> bool {
        caps.has_npu
    }

    fn read(&self, ctx: &ProbeContext) -> Vec<DeviceRecord> {
        let devfreq = &ctx.paths.devfreq_class;
        let mut devices: Vec<DeviceRecord> = list_subdirs(devfreq)
            .into_iter()
            .filter(|entry| is_npu_devfreq_entry(&ctx.heuristics.npu, &devfreq.join(entry), entry))
            .enumerate()
            .map(|(index, entry)| read_devfreq_npu(index as u32, &devfreq.join(&entry), &entry))
            .collect();

        if ctx.paths.edge_tpu.exists() {
            devices.push(edge_tpu(devices.len() as u32));
        }
        devices
    }
}

fn read_devfreq_npu(index: u32, path: &Path, entry: &str) -> DeviceRecord {
    let mut npu = DeviceRecord::new(index, entry, VENDOR_NPU);
    npu.is_npu = true;
    npu.is_integrated = true;
    npu.bus_info = BUS_SOC_PLATFORM.to_string();

    let load = LOAD_FILES
        .iter()
        .find_map(|file| read_percent_from_file(&path.join(file)))
        .unwrap_or(0.0);
    npu.set_gpu_utilization(load);
    npu.push_engine(CORE_ENGINE, load);

    if let Ok(device_path) = fs::canonicalize(path.join("device")) {
        npu.temperature = read_temp_from_hwmon(&device_path);
    }

    npu.is_available = true;
    log::debug!("NPU {}: {} util {:.1}%", npu.index, npu.name, npu.gpu_utilization);
    npu
}

/// Presence-only record; the apex driver exposes no utilization
fn edge_tpu(index: u32) -> DeviceRecord {
    let mut tpu = DeviceRecord::new(index, EDGE_TPU_NAME, VENDOR_GOOGLE);
    tpu.is_npu = true;
    tpu.is_integrated = false;
    tpu.bus_info = EDGE_TPU_BUS.to_string();
    tpu.push_engine(CORE_ENGINE, 0.0);
    tpu.is_available = true;
    tpu
}
