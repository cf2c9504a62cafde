//! Per-engine busy percentages from DRM `engine/` directories

use crate::sysfs::{list_subdirs, read_percent_from_file};
use accel_sens_types::DeviceRecord;
use std::path::Path;

/// Files tried, in order, inside each engine directory
const ENGINE_LOAD_FILES: [&str; 3] = ["busy_percent", "busy", "utilization"];

/// Map driver engine directory names (`rcs0`, `vcn1`, ...) to display names
pub fn normalize_engine_name(dir_name: &str) -> String {
    let lower = dir_name.to_lowercase();
    let name = if lower.starts_with("rcs") {
        "3D"
    } else if lower.starts_with("ccs") {
        "Compute"
    } else if lower.starts_with("bcs") {
        "Copy"
    } else if lower.starts_with("vcs") || lower.starts_with("vcn") {
        "Video Decode"
    } else if lower.starts_with("vecs") {
        "Video Enhance"
    } else {
        return dir_name.to_string();
    };
    name.to_string()
}

/// Append `name` with the load read from `path`; skipped when unreadable
pub fn append_engine_load_if_valid(device: &mut DeviceRecord, name: &str, path: &Path) -> bool {
    match read_percent_from_file(path) {
        Some(load) => {
            device.push_engine(name, load);
            true
        }
        None => false,
    }
}

/// Append every engine under `<device>/engine/*` that reports a load
pub fn append_drm_engine_loads(device: &mut DeviceRecord, device_path: &Path) {
    let engine_dir = device_path.join("engine");
    for entry in list_subdirs(&engine_dir) {
        let entry_path = engine_dir.join(&entry);
        let load = ENGINE_LOAD_FILES
            .iter()
            .find_map(|file| read_percent_from_file(&entry_path.join(file)));

        if let Some(load) = load {
            device.push_engine(normalize_engine_name(&entry), load);
        } else {
            log::trace!("engine {} reports no load", entry_path.display());
        }
    }
}
