//! Kernel tree locations read by the probes

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_drm_class() -> PathBuf {
    PathBuf::from("/sys/class/drm")
}

fn default_devfreq_class() -> PathBuf {
    PathBuf::from("/sys/class/devfreq")
}

fn default_misc_class() -> PathBuf {
    PathBuf::from("/sys/class/misc")
}

fn default_edge_tpu() -> PathBuf {
    PathBuf::from("/sys/class/misc/apex_0")
}

/// sysfs directories consulted during detection and reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostPaths {
    #[serde(default = "default_drm_class")]
    pub drm_class: PathBuf,
    #[serde(default = "default_devfreq_class")]
    pub devfreq_class: PathBuf,
    #[serde(default = "default_misc_class")]
    pub misc_class: PathBuf,
    /// Edge TPU (apex) device node
    #[serde(default = "default_edge_tpu")]
    pub edge_tpu: PathBuf,
}

impl HostPaths {
    /// Default layout relocated under `root` (e.g. a captured sysfs tree)
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let rebase = |path: PathBuf| match path.strip_prefix("/") {
            Ok(relative) => root.join(relative),
            Err(_) => root.join(path),
        };
        let defaults = Self::default();
        Self {
            drm_class: rebase(defaults.drm_class),
            devfreq_class: rebase(defaults.devfreq_class),
            misc_class: rebase(defaults.misc_class),
            edge_tpu: rebase(defaults.edge_tpu),
        }
    }
}

impl Default for HostPaths {
    fn default() -> Self {
        Self {
            drm_class: default_drm_class(),
            devfreq_class: default_devfreq_class(),
            misc_class: default_misc_class(),
            edge_tpu: default_edge_tpu(),
        }
    }
}
