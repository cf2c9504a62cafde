//! Accelerator detection and per-vendor probe readers

mod amd;
mod backend;
mod detector;
mod drm;
mod intel;
mod npu;
mod nvidia;

pub use amd::AmdReader;
pub use backend::{ProbeContext, ProbeReader};
pub use detector::CapabilityDetector;
pub use drm::{enumerate_cards, DrmCard, PCI_VENDOR_AMD, PCI_VENDOR_INTEL};
pub use intel::IntelReader;
pub use npu::{is_npu_devfreq_entry, NpuReader};
pub use nvidia::{parse_nvidia_smi_output, NvidiaReader, NVIDIA_FORMAT, NVIDIA_QUERY};

/// All readers, in the order their records appear in a snapshot
pub fn default_readers() -> Vec<Box<dyn ProbeReader>> {
    vec![
        Box::new(NvidiaReader),
        Box::new(AmdReader),
        Box::new(IntelReader),
        Box::new(NpuReader),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reader_order() {
        let names: Vec<&str> = default_readers().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["nvidia", "amd", "intel", "npu"]);
    }
}
