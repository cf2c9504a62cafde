//! Helpers that turn raw sysfs text into typed values.
//!
//! Nothing here returns an error: a file that is missing, unreadable or
//! malformed yields `None` (or 0 where noted) and the caller moves on to the
//! next candidate.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)").expect("number pattern is valid"));

/// Dedicated VRAM totals, first non-zero wins
const VRAM_TOTAL_FILES: [&str; 2] = ["mem_info_vram_total", "lmem_total_bytes"];
/// Dedicated VRAM usage, first readable wins
const VRAM_USED_FILES: [&str; 2] = ["mem_info_vram_used", "lmem_used_bytes"];

/// Whole-file text with surrounding whitespace removed
pub fn read_trimmed(path: &Path) -> Option<String> {
    let bytes = fs::read(path).ok()?;
    Some(String::from_utf8_lossy(&bytes).trim().to_string())
}

/// Names of the subdirectories of `dir` (symlinks followed), sorted by name
pub fn list_subdirs(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut names: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Interpret utilization text the way the various drivers write it.
///
/// Accepts a plain number, a "used/total" style pair (any separator) and
/// permille counters (values in 100..=1000 are divided by ten). The result is
/// clamped to 0..=100. `None` means no number could be found at all.
pub fn parse_percent(text: &str) -> Option<f32> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let mut value = match text.parse::<f32>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            let numbers: Vec<f32> = NUMBER_RE
                .captures_iter(text)
                .filter_map(|caps| caps[1].parse::<f32>().ok())
                .collect();
            match numbers.as_slice() {
                [] => return None,
                [used, total, ..] if *total > 0.0 && used <= total => used * 100.0 / total,
                [first, ..] => *first,
            }
        }
    };

    if value > 100.0 && value <= 1000.0 {
        value /= 10.0;
    }
    Some(value.clamp(0.0, 100.0))
}

/// Percentage from a sysfs attribute, `None` when unavailable
pub fn read_percent_from_file(path: &Path) -> Option<f32> {
    parse_percent(&read_trimmed(path)?)
}

/// Unsigned integer attribute; 0 is a valid reading, so absence is `None`
pub fn read_u64_from_file(path: &Path) -> Option<u64> {
    read_trimmed(path)?.parse::<u64>().ok()
}

/// First positive `temp1_input` under `<device>/hwmon/*`, in Celsius; 0 when none
pub fn read_temp_from_hwmon(device_path: &Path) -> f32 {
    let hwmon_dir = device_path.join("hwmon");
    for entry in list_subdirs(&hwmon_dir) {
        let text = match read_trimmed(&hwmon_dir.join(&entry).join("temp1_input")) {
            Some(text) => text,
            None => continue,
        };

        let mut value = text.parse::<f32>().unwrap_or(0.0);
        // millidegree convention
        if value > 1000.0 {
            value /= 1000.0;
        }
        if value > 0.0 {
            return value;
        }
    }
    0.0
}

/// Dedicated (on-board) memory reported by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedicatedMemory {
    pub total: u64,
    pub used: u64,
}

/// VRAM statistics from amdgpu (`mem_info_vram_*`) or xe/i915 (`lmem_*`).
///
/// Returns `None` when no candidate reports a non-zero total, which callers
/// take to mean the device has no dedicated memory.
pub fn detect_dedicated_memory(device_path: &Path) -> Option<DedicatedMemory> {
    let total = VRAM_TOTAL_FILES
        .iter()
        .filter_map(|name| read_u64_from_file(&device_path.join(name)))
        .find(|total| *total > 0)?;

    let used = VRAM_USED_FILES
        .iter()
        .find_map(|name| read_u64_from_file(&device_path.join(name)))
        .unwrap_or(0);

    Some(DedicatedMemory {
        total,
        used: used.min(total),
    })
}
