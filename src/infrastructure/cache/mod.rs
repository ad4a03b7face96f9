pub mod counter_store;
pub mod snapshot_store;

pub use counter_store::MemoryCounterStore;
pub use snapshot_store::{MemorySnapshotStore, TieredSnapshotStore};
