//! accel-sens-sources: accelerator probes for accel-sens.
//!
//! Discovers which accelerator families are present (once) and reads one
//! normalized [`DeviceRecord`](accel_sens_types::DeviceRecord) per device
//! from `nvidia-smi`, the DRM class tree and the devfreq/misc trees.

pub mod command;
pub mod engines;
pub mod gpu;
pub mod pci;
pub mod sysfs;

pub use command::{CommandError, CommandRunner, SystemCommandRunner};
#[cfg(any(test, feature = "testing"))]
pub use command::{ScriptedResponse, ScriptedRunner};
pub use gpu::{
    default_readers, AmdReader, CapabilityDetector, IntelReader, NpuReader, NvidiaReader,
    ProbeContext, ProbeReader,
};
