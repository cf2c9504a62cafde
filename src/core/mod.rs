//! Aggregation, snapshots and the refresh loop

mod aggregate;
pub mod constants;
mod snapshot;
mod update_manager;

pub use aggregate::TelemetryAggregate;
pub use snapshot::TelemetrySnapshot;
pub use update_manager::RefreshManager;
