//! PCI slot and device-name resolution for DRM devices

use crate::command::CommandRunner;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Trailing path segment of the canonical device node, e.g. `0000:03:00.0`
pub fn pci_slot(device_path: &Path) -> Option<String> {
    let canonical = fs::canonicalize(device_path).ok()?;
    let slot = canonical.file_name()?.to_string_lossy().into_owned();
    if slot.is_empty() {
        None
    } else {
        Some(slot)
    }
}

/// Only `domain:bus:dev.fn` style names are treated as PCI slots
pub fn is_pci_slot(slot: &str) -> bool {
    slot.contains(':') && slot.contains('.')
}

/// "PCIe <slot>" for devices that sit on a PCI slot
pub fn pci_bus_label(device_path: &Path) -> Option<String> {
    pci_slot(device_path)
        .filter(|slot| is_pci_slot(slot))
        .map(|slot| format!("PCIe {}", slot))
}

/// Human-readable device name from the PCI database (`lspci -s <slot>`).
///
/// Best effort: any failure, timeout or unparsable output gives `None`.
pub fn pci_device_name(
    runner: &dyn CommandRunner,
    lspci: &str,
    device_path: &Path,
    timeout: Duration,
) -> Option<String> {
    let slot = pci_slot(device_path).filter(|slot| is_pci_slot(slot))?;
    match runner.run(lspci, &["-s", &slot], timeout) {
        Ok(output) => parse_lspci_name(&output),
        Err(e) => {
            log::debug!("PCI name lookup for {} failed: {}", slot, e);
            None
        }
    }
}

/// Extract the device description from one `lspci` line.
///
/// `03:00.0 VGA compatible controller: Advanced Micro Devices ...` becomes
/// `Advanced Micro Devices ...`.
pub fn parse_lspci_name(output: &str) -> Option<String> {
    let line = output.lines().map(str::trim).find(|l| !l.is_empty())?;

    // drop the leading slot token
    let text = match line.split_once(char::is_whitespace) {
        Some((_, rest)) => rest.trim_start(),
        None => line,
    };

    let name = match text.find(": ") {
        Some(pos) => text[pos + 2..].trim(),
        None => text.trim(),
    };

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
