//! Intel reader (i915 / xe sysfs)

use super::backend::{ProbeContext, ProbeReader};
use super::drm::{cards_for_vendor, PCI_VENDOR_INTEL};
use crate::engines::{append_drm_engine_loads, append_engine_load_if_valid};
use crate::pci::{pci_bus_label, pci_device_name};
use crate::sysfs::detect_dedicated_memory;
use accel_sens_types::{CapabilitySet, DeviceRecord, BUS_SOC_PLATFORM, VENDOR_INTEL};
use std::path::Path;

const DEFAULT_NAME: &str = "Intel GPU";
const GT_BUSY_FILE: &str = "gt_busy_percent";

#[derive(Debug, Default, Clone, Copy)]
pub struct IntelReader;

impl ProbeReader for IntelReader {
    fn name(&self) -> &'static str {
        "intel"
    }

    fn enabled(&self, caps: &CapabilitySet) -> bool {
        caps.has_intel
    }

    fn read(&self, ctx: &ProbeContext) -> Vec<DeviceRecord> {
        cards_for_vendor(&ctx.paths.drm_class, PCI_VENDOR_INTEL)
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

    let mut gpu = DeviceRecord::new(index, name, VENDOR_INTEL);

    let dedicated = detect_dedicated_memory(device_path);
    if let Some(memory) = dedicated {
        gpu.set_memory(memory.total, memory.used);
        let percent = gpu.memory_percent();
        gpu.set_memory_utilization(percent);
    }
    gpu.is_integrated = dedicated.is_none();
    gpu.bus_info = pci_bus_label(device_path).unwrap_or_else(|| BUS_SOC_PLATFORM.to_string());

    append_engine_load_if_valid(&mut gpu, "Render", &device_path.join(GT_BUSY_FILE));
    append_drm_engine_loads(&mut gpu, device_path);
    let utilization = overall_utilization(&gpu);
    gpu.set_gpu_utilization(utilization);

    gpu.is_available = true;
    log::debug!("Intel GPU {}: {} util {:.1}%", gpu.index, gpu.name, gpu.gpu_utilization);
    gpu
}

/// The 3D engine's load, falling back to the first engine when that is idle or absent
fn overall_utilization(gpu: &DeviceRecord) -> f32 {
    let render = gpu.engine_load("3D").unwrap_or(0.0);
    if render <= 0.0 {
        if let Some(first) = gpu.engines().first() {
            return first.load;
        }
    }
    render
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ScriptedRunner;
    use crate::fixture::{drm_card, write};
    use accel_sens_types::{HostPaths, TelemetryConfig};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn context(root: &Path, runner: ScriptedRunner) -> ProbeContext {
        let config = TelemetryConfig {
            paths: HostPaths::with_root(root),
            ..TelemetryConfig::default()
        };
        ProbeContext::with_runner(config, Arc::new(runner))
    }

    #[test]
    fn test_integrated_card_uses_3d_engine() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let slot = root.join("sys/devices/pci0000:00/0000:00:02.0");
        drm_card(&root.join("sys/class/drm"), "card0", &slot, "0x8086\n");
        write(&slot.join("gt_busy_percent"), "20\n");
        write(&slot.join("engine/rcs0/busy_percent"), "45\n");
        write(&slot.join("engine/vcs0/busy_percent"), "10\n");

        let runner = ScriptedRunner::new().with_output(
            "lspci -s 0000:00:02.0",
            "00:02.0 VGA compatible controller: Intel Corporation Alder Lake-P GT2 [Iris Xe Graphics] (rev 0c)\n",
        );
        let devices = IntelReader.read(&context(root, runner));
        assert_eq!(devices.len(), 1);

        let gpu = &devices[0];
        assert_eq!(gpu.name, "Intel Corporation Alder Lake-P GT2 [Iris Xe Graphics] (rev 0c)");
        assert_eq!(gpu.vendor, "Intel");
        assert_eq!(gpu.bus_info, "PCIe 0000:00:02.0");
        assert!(gpu.is_integrated);
        assert_eq!(gpu.total_memory, 0);
        assert_eq!(gpu.engine_names(), vec!["Render", "3D", "Video Decode"]);
        assert_eq!(gpu.gpu_utilization, 45.0);
    }

    #[test]
    fn test_idle_3d_falls_back_to_first_engine() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let slot = root.join("sys/devices/0000:00:02.0");
        drm_card(&root.join("sys/class/drm"), "card0", &slot, "0x8086\n");
        write(&slot.join("gt_busy_percent"), "30\n");
        write(&slot.join("engine/rcs0/busy_percent"), "0\n");

        let gpu = &IntelReader.read(&context(root, ScriptedRunner::new()))[0];
        assert_eq!(gpu.name, "Intel GPU");
        assert_eq!(gpu.gpu_utilization, 30.0);
    }

    #[test]
    fn test_no_engines_means_zero_utilization() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let slot = root.join("sys/devices/platform/soc-gpu");
        drm_card(&root.join("sys/class/drm"), "card0", &slot, "0x8086\n");

        let gpu = &IntelReader.read(&context(root, ScriptedRunner::new()))[0];
        assert_eq!(gpu.gpu_utilization, 0.0);
        assert_eq!(gpu.bus_info, "SoC/Platform");
        assert!(gpu.engine_names().is_empty());
    }

    #[test]
    fn test_discrete_card_with_local_memory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let slot = root.join("sys/devices/0000:03:00.0");
        drm_card(&root.join("sys/class/drm"), "card1", &slot, "0x8086\n");
        write(&slot.join("lmem_total_bytes"), "8589934592\n");
        write(&slot.join("lmem_used_bytes"), "2147483648\n");

        let gpu = &IntelReader.read(&context(root, ScriptedRunner::new()))[0];
        assert!(!gpu.is_integrated);
        assert_eq!(gpu.free_memory, 6_442_450_944);
        assert!((gpu.memory_utilization - 25.0).abs() < 0.01);
    }
}
