pub mod codec;
pub mod store;

pub use codec::EventCodec;
pub use store::{EventStore, SnapshotStore};
