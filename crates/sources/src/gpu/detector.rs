//! One-time accelerator family detection

use super::backend::ProbeContext;
use super::drm::{enumerate_cards, PCI_VENDOR_AMD, PCI_VENDOR_INTEL};
use super::npu::is_npu_devfreq_entry;
use crate::sysfs::list_subdirs;
use accel_sens_types::CapabilitySet;
use once_cell::sync::OnceCell;

/// Decides which vendor families are present.
///
/// The first [`detect`](Self::detect) call scans the host; every later call
/// returns the cached result, even if hardware appears or disappears.
#[derive(Debug, Default)]
pub struct CapabilityDetector {
    cache: OnceCell<CapabilitySet>,
}

impl CapabilityDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detect(&self, ctx: &ProbeContext) -> CapabilitySet {
        *self.cache.get_or_init(|| scan(ctx))
    }

    /// The cached result, `None` before the first detection
    pub fn cached(&self) -> Option<CapabilitySet> {
        self.cache.get().copied()
    }
}

fn scan(ctx: &ProbeContext) -> CapabilitySet {
    log::warn!("=== Detecting accelerators ===");

    let mut caps = CapabilitySet::default();

    caps.has_nvidia = ctx.runner.resolve(&ctx.tools.nvidia_smi);
    if caps.has_nvidia {
        log::info!("  {} found on PATH", ctx.tools.nvidia_smi);
    }

    for card in enumerate_cards(&ctx.paths.drm_class) {
        if card.is_vendor(PCI_VENDOR_AMD) {
            log::info!("  {}: AMD", card.name);
            caps.has_amd = true;
        } else if card.is_vendor(PCI_VENDOR_INTEL) {
            log::info!("  {}: Intel", card.name);
            caps.has_intel = true;
        } else {
            log::debug!("  {}: vendor {} ignored", card.name, card.vendor_id);
        }
    }

    caps.has_npu = detect_npu(ctx);
    caps.detected = true;

    if caps.any() {
        log::warn!("Accelerator families detected: {}", caps.families().join(", "));
    } else {
        log::warn!("No accelerators detected");
    }

    caps
}

fn detect_npu(ctx: &ProbeContext) -> bool {
    let heuristic = &ctx.heuristics.npu;
    let devfreq = &ctx.paths.devfreq_class;

    if let Some(entry) = list_subdirs(devfreq)
        .into_iter()
        .find(|entry| is_npu_devfreq_entry(heuristic, &devfreq.join(entry), entry))
    {
        log::info!("  NPU via devfreq: {}", entry);
        return true;
    }

    if ctx.paths.edge_tpu.exists() {
        log::info!("  Edge TPU at {}", ctx.paths.edge_tpu.display());
        return true;
    }

    if let Some(entry) = list_subdirs(&ctx.paths.misc_class)
        .into_iter()
        .find(|entry| heuristic.matches(entry))
    {
        log::info!("  NPU via misc class: {}", entry);
        return true;
    }

    false
}
