//! AMD reader using the amdgpu sysfs interface

use super::backend::{ProbeContext, ProbeReader};
use super::drm::{cards_for_vendor, PCI_VENDOR_AMD};
use crate::engines::{append_drm_engine_loads, append_engine_load_if_valid};
use crate::pci::{pci_bus_label, pci_device_name};
use crate::sysfs::{detect_dedicated_memory, read_percent_from_file, read_temp_from_hwmon};
use accel_sens_types::{CapabilitySet, DeviceRecord, BUS_SOC_PLATFORM, VENDOR_AMD};
use std::path::Path;

const DEFAULT_NAME: &str = "AMD GPU";
const GPU_BUSY_FILE: &str = "gpu_busy_percent";

#[derive(Debug, Default, Clone, Copy)]
pub struct AmdReader;

impl ProbeReader for AmdReader {
    fn name(&self) -> &'static str {
        "amd"
    }

    fn enabled(&self, caps: &CapabilitySet) -> bool {
        caps.has_amd
    }

    fn read(&self, ctx: &ProbeContext) -> Vec<DeviceRecord> {
        cards_for_vendor(&ctx.paths.drm_class, PCI_VENDOR_AMD)
            .iter()
            .enumerate()
            .map(|(index, card)| read_card(ctx, index as u32, &card.device_path))
            .collect()
    }
}

fn read_card(ctx: &ProbeContext, index: u32, device_path: &Path) -> DeviceRecord {
    let name = pci_device_name(
        ctx.runner.as_ref(),
        &ctx.tools.lspci,
        device_path,
        ctx.tools.pci_lookup_timeout(),
    )
    .unwrap_or_else(|| DEFAULT_NAME.to_string());

    let mut gpu = DeviceRecord::new(index, name, VENDOR_AMD);
    let bus_label = pci_bus_label(device_path);

    let dedicated = detect_dedicated_memory(device_path);
    if let Some(memory) = dedicated {
        gpu.set_memory(memory.total, memory.used);
        let percent = gpu.memory_percent();
        gpu.set_memory_utilization(percent);
    }

    let busy_path = device_path.join(GPU_BUSY_FILE);
    gpu.set_gpu_utilization(read_percent_from_file(&busy_path).unwrap_or(0.0));
    append_engine_load_if_valid(&mut gpu, "Graphics", &busy_path);
    append_drm_engine_loads(&mut gpu, device_path);

    gpu.temperature = read_temp_from_hwmon(device_path);
    gpu.is_integrated = dedicated.is_none() || ctx.heuristics.amd_integrated.matches(&gpu.name);
    gpu.bus_info = match bus_label {
        Some(label) => label,
        None if gpu.is_integrated => BUS_SOC_PLATFORM.to_string(),
        None => String::new(),
    };
    gpu.is_available = true;

    log::debug!(
        "AMD GPU {}: {} util {:.1}% mem {}/{} MiB",
        gpu.index,
        gpu.name,
        gpu.gpu_utilization,
        gpu.used_memory >> 20,
        gpu.total_memory >> 20
    );
    gpu
}
