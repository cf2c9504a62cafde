//! Telemetry aggregate: owns the published snapshot and runs refreshes

use super::snapshot::TelemetrySnapshot;
use accel_sens_sources::{default_readers, CapabilityDetector, ProbeContext, ProbeReader};
use accel_sens_types::{CapabilitySet, DeviceClass, DeviceRecord, TelemetryConfig};
use arc_swap::ArcSwap;
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use log::{debug, info};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Current accelerator state for one host.
///
/// `update()` is serialized by a writer lock and publishes a new snapshot
/// with a single pointer swap. Readers never block: they load whatever
/// snapshot is current and keep it for as long as they like.
pub struct TelemetryAggregate {
    context: ProbeContext,
    detector: CapabilityDetector,
    readers: Vec<Box<dyn ProbeReader>>,
    current: ArcSwap<TelemetrySnapshot>,
    writer: Mutex<()>,
    subscribers: Mutex<Vec<Sender<()>>>,
}

impl TelemetryAggregate {
    pub fn new(config: TelemetryConfig) -> Self {
        Self::with_context(ProbeContext::new(config))
    }

    pub fn with_context(context: ProbeContext) -> Self {
        Self::with_readers(context, default_readers())
    }

    /// Aggregate with an explicit reader list, run in the given order
    pub fn with_readers(context: ProbeContext, readers: Vec<Box<dyn ProbeReader>>) -> Self {
        Self {
            context,
            detector: CapabilityDetector::new(),
            readers,
            current: ArcSwap::from_pointee(TelemetrySnapshot::default()),
            writer: Mutex::new(()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Re-scan every enabled family and replace the snapshot.
    ///
    /// Blocks for as long as the probes take (subprocesses included). The
    /// previous device list is discarded, never merged.
    pub fn update(&self) -> Arc<TelemetrySnapshot> {
        let _guard = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let start = Instant::now();

        let capabilities = self.detector.detect(&self.context);
        let mut devices: Vec<DeviceRecord> = Vec::new();
        for reader in &self.readers {
            if !reader.enabled(&capabilities) {
                continue;
            }
            let records = reader.read(&self.context);
            debug!("{} reader produced {} device(s)", reader.name(), records.len());
            devices.extend(records);
        }

        let generation = self.current.load().generation + 1;
        let snapshot = Arc::new(TelemetrySnapshot::new(devices, capabilities, generation));
        self.current.store(Arc::clone(&snapshot));

        if generation == 1 {
            info!("First refresh found {} device(s)", snapshot.device_count());
        }
        debug!(
            "Refresh #{} finished in {:?} with {} device(s)",
            generation,
            start.elapsed(),
            snapshot.device_count()
        );

        self.notify();
        snapshot
    }

    /// The most recently published snapshot
    pub fn snapshot(&self) -> Arc<TelemetrySnapshot> {
        self.current.load_full()
    }

    /// Detected families; runs detection on first use
    pub fn capabilities(&self) -> CapabilitySet {
        self.detector.detect(&self.context)
    }

    pub fn context(&self) -> &ProbeContext {
        &self.context
    }

    /// Receiver that gets `()` after every refresh.
    ///
    /// Notifications coalesce: a subscriber that has not drained the previous
    /// one receives a single pending message. Dropped receivers are pruned
    /// on the next refresh.
    pub fn subscribe(&self) -> Receiver<()> {
        let (tx, rx) = channel::bounded(1);
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(tx);
        rx
    }

    fn notify(&self) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.retain(|tx| match tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => true,
            Err(TrySendError::Disconnected(())) => false,
        });
    }

    // Convenience queries against the current snapshot

    pub fn device_count(&self) -> usize {
        self.snapshot().device_count()
    }

    pub fn device_list(&self) -> Vec<DeviceRecord> {
        self.snapshot().device_list().to_vec()
    }

    pub fn device(&self, index: usize) -> Option<DeviceRecord> {
        self.snapshot().device(index).cloned()
    }

    pub fn nth_device(&self, class: DeviceClass, index: usize) -> Option<DeviceRecord> {
        self.snapshot().nth_device(class, index).cloned()
    }

    pub fn total_memory(&self) -> u64 {
        self.snapshot().total_memory()
    }

    pub fn used_memory(&self) -> u64 {
        self.snapshot().used_memory()
    }

    pub fn free_memory(&self) -> u64 {
        self.snapshot().free_memory()
    }

    pub fn average_utilization(&self) -> f32 {
        self.snapshot().average_utilization()
    }

    pub fn average_npu_utilization(&self) -> f32 {
        self.snapshot().average_npu_utilization()
    }

    pub fn average_memory_utilization(&self) -> f32 {
        self.snapshot().average_memory_utilization()
    }

    pub fn gpu_count(&self) -> usize {
        self.snapshot().gpu_count()
    }

    pub fn npu_count(&self) -> usize {
        self.snapshot().npu_count()
    }

    pub fn has_nvidia_gpu(&self) -> bool {
        self.capabilities().has_nvidia
    }

    pub fn has_amd_gpu(&self) -> bool {
        self.capabilities().has_amd
    }

    pub fn has_intel_gpu(&self) -> bool {
        self.capabilities().has_intel
    }

    pub fn has_npu(&self) -> bool {
        self.capabilities().has_npu
    }
}

impl Default for TelemetryAggregate {
    fn default() -> Self {
        Self::new(TelemetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accel_sens_sources::ScriptedRunner;
    use accel_sens_types::HostPaths;
    use tempfile::TempDir;

    /// Reader that returns a fixed list whenever its flag is set
    struct FixedReader {
        enabled: fn(&CapabilitySet) -> bool,
        devices: Vec<DeviceRecord>,
    }

    impl ProbeReader for FixedReader {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn enabled(&self, caps: &CapabilitySet) -> bool {
            (self.enabled)(caps)
        }

        fn read(&self, _ctx: &ProbeContext) -> Vec<DeviceRecord> {
            self.devices.clone()
        }
    }

    fn empty_context(root: &std::path::Path) -> ProbeContext {
        let config = TelemetryConfig {
            paths: HostPaths::with_root(root),
            ..TelemetryConfig::default()
        };
        ProbeContext::with_runner(config, Arc::new(ScriptedRunner::new()))
    }

    #[test]
    fn test_disabled_readers_are_skipped() {
        let dir = TempDir::new().unwrap();
        let reader = FixedReader {
            enabled: |caps| caps.has_amd,
            devices: vec![DeviceRecord::new(0, "never", "AMD")],
        };
        let aggregate = TelemetryAggregate::with_readers(empty_context(dir.path()), vec![Box::new(reader)]);

        let snapshot = aggregate.update();
        assert!(snapshot.capabilities.detected);
        assert_eq!(snapshot.device_count(), 0);
    }

    #[test]
    fn test_generation_increments() {
        let dir = TempDir::new().unwrap();
        let aggregate = TelemetryAggregate::with_context(empty_context(dir.path()));
        assert_eq!(aggregate.snapshot().generation, 0);

        aggregate.update();
        aggregate.update();
        assert_eq!(aggregate.snapshot().generation, 2);
        assert!(aggregate.snapshot().refreshed_at.is_some());
    }

    #[test]
    fn test_notifications_coalesce_and_prune() {
        let dir = TempDir::new().unwrap();
        let aggregate = TelemetryAggregate::with_context(empty_context(dir.path()));
        let rx = aggregate.subscribe();
        let dropped = aggregate.subscribe();
        drop(dropped);

        aggregate.update();
        aggregate.update();

        assert_eq!(rx.try_recv(), Ok(()));
        assert!(rx.try_recv().is_err());
        assert_eq!(aggregate.subscribers.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_readers_run_in_given_order() {
        let dir = TempDir::new().unwrap();
        let always = |_: &CapabilitySet| true;
        let first = FixedReader {
            enabled: always,
            devices: vec![DeviceRecord::new(0, "first", "A")],
        };
        let second = FixedReader {
            enabled: always,
            devices: vec![DeviceRecord::new(0, "second", "B")],
        };
        let aggregate = TelemetryAggregate::with_readers(
            empty_context(dir.path()),
            vec![Box::new(first), Box::new(second)],
        );

        let names: Vec<String> = aggregate.update().devices.iter().map(|d| d.name.clone()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }
}
