//! NVIDIA reader backed by `nvidia-smi` CSV output

use super::backend::{ProbeContext, ProbeReader};
use accel_sens_types::{CapabilitySet, DeviceRecord, VENDOR_NVIDIA};

pub const NVIDIA_QUERY: &str = "--query-gpu=index,name,utilization.gpu,utilization.memory,memory.total,memory.used,memory.free,temperature.gpu,clocks.current.graphics,pci.bus_id";
pub const NVIDIA_FORMAT: &str = "--format=csv,noheader,nounits";

const FIELD_SEPARATOR: &str = ", ";
const MIN_FIELDS: usize = 10;
const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Default, Clone, Copy)]
pub struct NvidiaReader;

impl ProbeReader for NvidiaReader {
    fn name(&self) -> &'static str {
        "nvidia"
    }

    fn enabled(&self, caps: &CapabilitySet) -> bool {
        caps.has_nvidia
    }

    fn read(&self, ctx: &ProbeContext) -> Vec<DeviceRecord> {
        let output = match ctx.runner.run(
            &ctx.tools.nvidia_smi,
            &[NVIDIA_QUERY, NVIDIA_FORMAT],
            ctx.tools.nvidia_timeout(),
        ) {
            Ok(output) => output,
            Err(e) => {
                log::warn!("nvidia-smi query failed: {}", e);
                return Vec::new();
            }
        };

        let devices = parse_nvidia_smi_output(&output);
        for gpu in &devices {
            log::debug!(
                "NVIDIA GPU {}: {} util {:.1}% mem {}/{} MiB",
                gpu.index,
                gpu.name,
                gpu.gpu_utilization,
                gpu.used_memory >> 20,
                gpu.total_memory >> 20
            );
        }
        devices
    }
}

/// One record per CSV line with at least ten fields; shorter lines are skipped
pub fn parse_nvidia_smi_output(output: &str) -> Vec<DeviceRecord> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Option<DeviceRecord> {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).map(str::trim).collect();
    if fields.len() < MIN_FIELDS {
        log::debug!("ignoring short nvidia-smi line: {:?}", line);
        return None;
    }

    let mut gpu = DeviceRecord::new(fields[0].parse().unwrap_or(0), fields[1], VENDOR_NVIDIA);
    gpu.set_gpu_utilization(number(fields[2]) as f32);
    gpu.set_memory_utilization(number(fields[3]) as f32);

    // The tool's free column is ignored when it disagrees with total - used
    let total = mib_to_bytes(fields[4]);
    let used = mib_to_bytes(fields[5]);
    if total > 0 && used.saturating_add(mib_to_bytes(fields[6])) != total {
        log::trace!("nvidia-smi memory columns disagree for GPU {}", gpu.index);
    }
    gpu.set_memory(total, used);

    gpu.temperature = number(fields[7]) as f32;
    gpu.clock_speed = number(fields[8]) as u64;
    gpu.bus_info = format!("PCIe {}", fields[9]);
    gpu.is_integrated = false;

    let load = gpu.gpu_utilization;
    gpu.push_engine("Graphics", load);
    gpu.is_available = true;
    Some(gpu)
}

/// `[N/A]`, `[Not Supported]` and other junk read as 0
fn number(field: &str) -> f64 {
    match field.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

/// Values that do not fit in `u64` bytes read as 0, like any other junk
fn mib_to_bytes(field: &str) -> u64 {
    let bytes = number(field) * BYTES_PER_MIB;
    if bytes >= u64::MAX as f64 {
        0
    } else {
        bytes as u64
    }
}
