//! DRM class enumeration shared by detection and the AMD/Intel readers

use crate::sysfs::{list_subdirs, read_trimmed};
use std::path::{Path, PathBuf};

pub const PCI_VENDOR_AMD: &str = "0x1002";
pub const PCI_VENDOR_INTEL: &str = "0x8086";

/// A `card*` entry whose `device/vendor` could be read
#[derive(Debug, Clone)]
pub struct DrmCard {
    pub name: String,
    pub device_path: PathBuf,
    pub vendor_id: String,
}

impl DrmCard {
    pub fn is_vendor(&self, vendor_id: &str) -> bool {
        self.vendor_id.eq_ignore_ascii_case(vendor_id)
    }
}

/// All `card*` entries under `drm_class`, in name order.
///
/// Connector entries such as `card0-DP-1` carry no `device/vendor` and are
/// skipped along with anything else unreadable.
pub fn enumerate_cards(drm_class: &Path) -> Vec<DrmCard> {
    list_subdirs(drm_class)
        .into_iter()
        .filter(|name| name.starts_with("card"))
        .filter_map(|name| {
            let device_path = drm_class.join(&name).join("device");
            let vendor_id = read_trimmed(&device_path.join("vendor"))?;
            Some(DrmCard {
                name,
                device_path,
                vendor_id,
            })
        })
        .collect()
}

/// Cards of one vendor
pub fn cards_for_vendor(drm_class: &Path, vendor_id: &str) -> Vec<DrmCard> {
    enumerate_cards(drm_class)
        .into_iter()
        .filter(|card| card.is_vendor(vendor_id))
        .collect()
}
